//! Error types for tonvault-wallet.

use thiserror::Error;

/// Wallet error type.
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("cell error: {0}")]
    Cell(#[from] tonvault_cell::CellError),

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("invalid word in mnemonic: {0}")]
    InvalidWord(String),

    #[error("wrong word count: expected 24, got {0}")]
    WrongWordCount(usize),

    #[error("invalid key bytes: {0}")]
    InvalidKey(String),

    #[error("too many messages: max {max}, got {got}")]
    TooManyMessages { max: usize, got: usize },

    #[error("empty message list")]
    NoMessages,
}

/// Result type alias.
pub type WalletResult<T> = Result<T, WalletError>;
