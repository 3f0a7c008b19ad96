//! Error types for tonvault-api.

use thiserror::Error;

/// API client error type.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Result type alias.
pub type ApiResult<T> = Result<T, ApiError>;
