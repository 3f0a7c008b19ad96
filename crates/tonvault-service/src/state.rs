//! Request-scoped transfer inputs.
//!
//! Everything here is a snapshot passed into a single operation; nothing is
//! cached or carried across calls.

use std::collections::HashMap;

use tonvault_api::AccountStatus;
use tonvault_cell::TonAddress;
use tonvault_wallet::{Network, WalletVersion};

/// Immutable snapshot of the wallet performing a transfer.
#[derive(Debug, Clone)]
pub struct WalletState {
    pub address: TonAddress,
    pub public_key: [u8; 32],
    pub version: WalletVersion,
    pub network: Network,
}

impl WalletState {
    /// The wallet id used in transfer bodies for this wallet.
    pub fn wallet_id(&self) -> i32 {
        self.version
            .default_wallet_id(self.network, self.address.workchain)
    }
}

/// A transfer recipient: either a literal address or one resolved from a
/// DNS name. Resolution itself happens upstream; the distinction survives
/// because it changes the default bounce flag.
#[derive(Debug, Clone)]
pub enum Recipient {
    Address(TonAddress),
    Dns { name: String, resolved: TonAddress },
}

impl Recipient {
    pub fn address(&self) -> &TonAddress {
        match self {
            Recipient::Address(addr) => addr,
            Recipient::Dns { resolved, .. } => resolved,
        }
    }

    pub fn is_dns(&self) -> bool {
        matches!(self, Recipient::Dns { .. })
    }
}

/// A single-recipient transfer request.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub recipient: Recipient,
    /// Amount in nanotons. Ignored by the contract when `send_all` is set.
    pub amount: u128,
    pub comment: Option<String>,
    /// Send the entire remaining balance instead of `amount`.
    pub send_all: bool,
}

/// One message of a batch request (TonConnect-shaped): payload and
/// state-init arrive as base64 BoC strings.
#[derive(Debug, Clone)]
pub struct BatchMessage {
    pub to: TonAddress,
    pub amount: u128,
    pub payload: Option<String>,
    pub state_init: Option<String>,
}

/// Recipient address (raw form) to on-chain status, built fresh per call.
pub type AccountsMap = HashMap<String, AccountStatus>;
