//! TON wallet contract support for tonvault.
//!
//! Covers the pieces needed to move funds from a wallet the user controls:
//! key derivation from a 24-word recovery phrase, transfer body construction
//! for the supported contract versions (W5, V4, V3), signing, and the
//! external message envelope the HTTP API accepts.

mod error;
mod keys;
mod message;
mod mnemonic;
mod transfer;
mod version;

pub use error::{WalletError, WalletResult};
pub use keys::KeyPair;
pub use message::{send_mode, InternalMessage};
pub use mnemonic::Mnemonic;
pub use transfer::{ExternalMessage, TransferBody};
pub use version::{Network, WalletVersion};
