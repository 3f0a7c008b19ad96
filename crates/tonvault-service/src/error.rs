//! Error types for tonvault-service.

use thiserror::Error;

/// Transfer flow errors. Fail-fast; nothing here is retried.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Local clock is out of sync with the service.
    #[error("local clock out of sync with service time")]
    DateAndTime,

    /// Balance does not cover the amount plus the estimated fee.
    #[error("not enough balance")]
    NotEnoughBalance,

    /// Batch exceeds the wallet version's message ceiling.
    #[error("too many messages: max {max}, got {got}")]
    TooManyMessages { max: usize, got: usize },

    #[error(transparent)]
    Api(#[from] tonvault_api::ApiError),

    #[error(transparent)]
    Wallet(#[from] tonvault_wallet::WalletError),

    #[error(transparent)]
    Cell(#[from] tonvault_cell::CellError),
}

/// Result type alias.
pub type TransferResult<T> = Result<T, TransferError>;
