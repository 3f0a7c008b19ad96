//! The transfer flow: construction, estimation and submission.
//!
//! Every operation is a straight pipeline of validation gates, fresh state
//! fetches, body construction and one remote call. Nothing is cached across
//! calls and nothing is retried; any remote failure propagates to the
//! caller. The clock gate always runs first.
//!
//! Estimation and submission are separate operations rather than one with
//! an optional key: estimation assembles the body with an all-zero
//! placeholder signature and emulates with signature checks disabled, while
//! submission derives the real key from the mnemonic and signs. The
//! placeholder path can never reach the broadcast endpoint.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use tonvault_api::{AccountStatus, TonApiClient, TransferEstimation};
use tonvault_cell::{payload, BagOfCells, Cell, TonAddress};
use tonvault_wallet::{
    send_mode, ExternalMessage, InternalMessage, Mnemonic, TransferBody,
};

use crate::error::{TransferError, TransferResult};
use crate::state::{AccountsMap, BatchMessage, Recipient, TransferRequest, WalletState};

/// Maximum tolerated gap between the local clock and service time.
const MAX_CLOCK_DRIFT_SECS: u64 = 30;

/// How long a constructed message stays valid.
const MESSAGE_TTL_SECS: u64 = 300;

/// Bounce flag for a single transfer.
///
/// DNS recipients never bounce: the name may point at an uninitialized
/// wallet. A literal address bounces unless it was written in the
/// non-bounceable form and the account is not active.
pub fn single_transfer_bounce(recipient: &Recipient, status: AccountStatus) -> bool {
    if recipient.is_dns() {
        return false;
    }
    recipient.address().bounceable || status.is_active()
}

/// Bounce flag for a batch message: bounce unless the address form is
/// non-bounceable and the account is not active.
pub fn batch_message_bounce(to: &TonAddress, status: AccountStatus) -> bool {
    to.bounceable || status.is_active()
}

/// Transfer service over a wallet and the HTTP API.
pub struct TransferService {
    api: TonApiClient,
}

impl TransferService {
    pub fn new(api: TonApiClient) -> Self {
        Self { api }
    }

    /// Estimate a single transfer without broadcasting.
    ///
    /// Gates: clock, then (for non-send-all) positive balance. The body is
    /// assembled with a placeholder signature and emulated with signature
    /// checks disabled.
    pub async fn estimate_transfer(
        &self,
        wallet: &WalletState,
        request: &TransferRequest,
    ) -> TransferResult<TransferEstimation> {
        let valid_until = self.checked_valid_until().await?;

        let account = self.api.get_account(&wallet.address.to_raw()).await?;
        if !request.send_all && account.balance == 0 {
            return Err(TransferError::NotEnoughBalance);
        }

        let status = self.recipient_status(&request.recipient).await?;
        let bounce = single_transfer_bounce(&request.recipient, status);
        let message = build_single_message(request, bounce)?;

        let seqno = self.api.get_seqno(&wallet.address.to_raw()).await?;
        let body = build_body(wallet, seqno, valid_until, &[message])?;
        let boc = wrap(wallet, body.sign_placeholder()?)?;

        debug!(seqno, bounce, "estimating transfer");
        Ok(self.api.emulate(&boc, true).await?)
    }

    /// Sign with the mnemonic-derived key and broadcast a single transfer.
    ///
    /// `estimated_fee` comes from a prior [`estimate_transfer`] call and
    /// feeds the balance gate. Returns the broadcast base64 envelope.
    ///
    /// [`estimate_transfer`]: Self::estimate_transfer
    pub async fn send_transfer(
        &self,
        wallet: &WalletState,
        mnemonic: &Mnemonic,
        request: &TransferRequest,
        estimated_fee: u64,
    ) -> TransferResult<String> {
        let valid_until = self.checked_valid_until().await?;

        let account = self.api.get_account(&wallet.address.to_raw()).await?;
        if !request.send_all
            && request.amount.saturating_add(estimated_fee as u128) >= account.balance as u128
        {
            return Err(TransferError::NotEnoughBalance);
        }

        // Derived fresh on every call; never cached.
        let keypair = mnemonic.to_keypair();

        let status = self.recipient_status(&request.recipient).await?;
        let bounce = single_transfer_bounce(&request.recipient, status);
        let message = build_single_message(request, bounce)?;

        // Re-fetched as late as possible to narrow the window against a
        // concurrent submission from the same wallet.
        let seqno = self.api.get_seqno(&wallet.address.to_raw()).await?;
        let body = build_body(wallet, seqno, valid_until, &[message])?;
        let boc = wrap(wallet, body.sign(&keypair)?)?;

        debug!(seqno, bounce, "sending transfer");
        self.api.send_boc(&boc).await?;
        Ok(boc)
    }

    /// Estimate a batch (TonConnect-shaped) transfer.
    pub async fn estimate_batch(
        &self,
        wallet: &WalletState,
        messages: &[BatchMessage],
    ) -> TransferResult<TransferEstimation> {
        let valid_until = self.checked_valid_until().await?;
        check_ceiling(wallet, messages.len())?;

        let account = self.api.get_account(&wallet.address.to_raw()).await?;
        if account.balance == 0 {
            return Err(TransferError::NotEnoughBalance);
        }

        let accounts = self.fetch_accounts(messages).await?;
        let internal = build_batch_messages(messages, &accounts)?;

        let seqno = self.api.get_seqno(&wallet.address.to_raw()).await?;
        let body = build_body(wallet, seqno, valid_until, &internal)?;
        let boc = wrap(wallet, body.sign_placeholder()?)?;

        debug!(seqno, count = messages.len(), "estimating batch");
        Ok(self.api.emulate(&boc, true).await?)
    }

    /// Sign and broadcast a batch transfer. Returns the base64 envelope.
    pub async fn send_batch(
        &self,
        wallet: &WalletState,
        mnemonic: &Mnemonic,
        messages: &[BatchMessage],
    ) -> TransferResult<String> {
        let valid_until = self.checked_valid_until().await?;
        check_ceiling(wallet, messages.len())?;

        let account = self.api.get_account(&wallet.address.to_raw()).await?;
        let total: u128 = messages.iter().map(|m| m.amount).sum();
        if total >= account.balance as u128 {
            return Err(TransferError::NotEnoughBalance);
        }

        let keypair = mnemonic.to_keypair();

        let accounts = self.fetch_accounts(messages).await?;
        let internal = build_batch_messages(messages, &accounts)?;

        let seqno = self.api.get_seqno(&wallet.address.to_raw()).await?;
        let body = build_body(wallet, seqno, valid_until, &internal)?;
        let boc = wrap(wallet, body.sign(&keypair)?)?;

        debug!(seqno, count = messages.len(), "sending batch");
        self.api.send_boc(&boc).await?;
        Ok(boc)
    }

    /// Clock gate plus validity deadline, always the first step.
    async fn checked_valid_until(&self) -> TransferResult<u64> {
        let server_time = self.api.get_server_time().await?;
        let local = local_now();
        if server_time.abs_diff(local) > MAX_CLOCK_DRIFT_SECS {
            debug!(server_time, local, "clock drift over limit");
            return Err(TransferError::DateAndTime);
        }
        Ok(server_time + MESSAGE_TTL_SECS)
    }

    /// Recipient status for the bounce decision. DNS recipients skip the
    /// lookup; the policy ignores their status.
    async fn recipient_status(&self, recipient: &Recipient) -> TransferResult<AccountStatus> {
        if recipient.is_dns() {
            return Ok(AccountStatus::Nonexist);
        }
        let account = self.api.get_account(&recipient.address().to_raw()).await?;
        Ok(account.status)
    }

    /// Fresh status map for every batch recipient.
    async fn fetch_accounts(&self, messages: &[BatchMessage]) -> TransferResult<AccountsMap> {
        let mut accounts = AccountsMap::new();
        for message in messages {
            let raw = message.to.to_raw();
            if accounts.contains_key(&raw) {
                continue;
            }
            let account = self.api.get_account(&raw).await?;
            accounts.insert(raw, account.status);
        }
        Ok(accounts)
    }
}

fn local_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn check_ceiling(wallet: &WalletState, count: usize) -> TransferResult<()> {
    let max = wallet.version.max_messages();
    if count > max {
        return Err(TransferError::TooManyMessages { max, got: count });
    }
    Ok(())
}

fn build_single_message(
    request: &TransferRequest,
    bounce: bool,
) -> TransferResult<InternalMessage> {
    let mode = if request.send_all {
        send_mode::CARRY_ALL_REMAINING_BALANCE | send_mode::IGNORE_ERRORS
    } else {
        send_mode::PAY_GAS_SEPARATELY
    };

    let mut message = InternalMessage::new(
        request.recipient.address().clone(),
        request.amount,
        bounce,
        mode,
    );
    if let Some(text) = &request.comment {
        message = message.with_payload(Arc::new(payload::comment(text)?));
    }
    Ok(message)
}

fn build_batch_messages(
    messages: &[BatchMessage],
    accounts: &AccountsMap,
) -> TransferResult<Vec<InternalMessage>> {
    let mode = send_mode::PAY_GAS_SEPARATELY | send_mode::IGNORE_ERRORS;

    messages
        .iter()
        .map(|message| {
            let status = accounts
                .get(&message.to.to_raw())
                .copied()
                .unwrap_or(AccountStatus::Nonexist);
            let bounce = batch_message_bounce(&message.to, status);

            let mut internal =
                InternalMessage::new(message.to.clone(), message.amount, bounce, mode);
            if let Some(boc) = &message.payload {
                internal = internal.with_payload(decode_cell(boc)?);
            }
            if let Some(boc) = &message.state_init {
                internal = internal.with_state_init(decode_cell(boc)?);
            }
            Ok(internal)
        })
        .collect()
}

fn decode_cell(boc_b64: &str) -> TransferResult<Arc<Cell>> {
    let bag = BagOfCells::deserialize_from_base64(boc_b64)?;
    Ok(bag.single_root()?.clone())
}

fn build_body(
    wallet: &WalletState,
    seqno: u32,
    valid_until: u64,
    messages: &[InternalMessage],
) -> TransferResult<TransferBody> {
    Ok(TransferBody::build(
        wallet.version,
        wallet.wallet_id(),
        seqno,
        valid_until as u32,
        messages,
    )?)
}

fn wrap(wallet: &WalletState, signed_body: Cell) -> TransferResult<String> {
    let external = ExternalMessage::wrap(&wallet.address, signed_body)?;
    Ok(external.to_boc_base64()?)
}
