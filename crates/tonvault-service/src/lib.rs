//! Transfer service and settings derivations for tonvault.
//!
//! [`TransferService`] drives the full flow: validation gates, fresh
//! balance/seqno fetches, body construction through `tonvault-wallet`,
//! estimation via emulation, and broadcast. The [`settings`] module holds
//! the pure list derivations behind the settings screens.

mod error;
pub mod settings;
mod state;
mod transfer;

pub use error::{TransferError, TransferResult};
pub use state::{AccountsMap, BatchMessage, Recipient, TransferRequest, WalletState};
pub use transfer::{batch_message_bounce, single_transfer_bounce, TransferService};
