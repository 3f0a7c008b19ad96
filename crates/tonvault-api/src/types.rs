//! Wire types of the HTTP API.

use serde::{Deserialize, Serialize};

/// On-chain account state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Account has never been touched.
    Nonexist,
    /// Account holds a balance but no deployed contract.
    Uninit,
    Active,
    Frozen,
}

impl AccountStatus {
    pub fn is_active(self) -> bool {
        matches!(self, AccountStatus::Active)
    }
}

/// Account state as returned by `GET /v2/accounts/{address}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub address: String,
    /// Balance in nanotons.
    pub balance: u64,
    pub status: AccountStatus,
}

/// Seqno of a wallet contract.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Seqno {
    pub seqno: u32,
}

/// Server-side unix time.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ServerTime {
    pub time: u64,
}

/// Result of emulating an external message.
///
/// The emulation endpoint returns a full event trace; the only field the
/// transfer flow needs is the `extra` balance delta, which is negative by
/// the total fee when the transfer succeeds.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferEstimation {
    pub event: serde_json::Value,
}

impl TransferEstimation {
    /// The account's `extra` balance change in nanotons.
    pub fn extra(&self) -> i64 {
        self.event
            .get("extra")
            .and_then(|v| v.as_i64())
            .unwrap_or(0)
    }

    /// Estimated fee in nanotons (zero when the emulation reported a gain).
    pub fn fee(&self) -> u64 {
        let extra = self.extra();
        if extra < 0 {
            extra.unsigned_abs()
        } else {
            0
        }
    }
}
