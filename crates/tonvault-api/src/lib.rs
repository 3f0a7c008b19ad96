//! HTTP API client for tonvault.
//!
//! Talks to a tonapi-shaped endpoint for the handful of calls the transfer
//! flow needs: account state, wallet seqno, server time, emulation, and
//! message submission. Deliberately stateless; callers decide when to fetch
//! and never reuse stale data.

mod client;
mod error;
mod types;

pub use client::TonApiClient;
pub use error::{ApiError, ApiResult};
pub use types::{Account, AccountStatus, TransferEstimation};
