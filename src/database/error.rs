//! Error types for the ledger store.
//!
//! Every store operation returns [`LedgerError`]. Being on cooldown is not an
//! error; it is reported through [`GrantOutcome`](super::models::GrantOutcome).

use super::models::Identity;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The `users` table could not be created or migrated. Fatal at startup.
    #[error("schema error: {0}")]
    Schema(String),

    /// The identity has never registered.
    #[error("user {0} is not registered")]
    NotFound(Identity),

    /// A balance adjustment would have left the account negative.
    #[error("user {identity} has {balance}, cannot apply {delta}")]
    InsufficientFunds {
        identity: Identity,
        balance: i64,
        delta: i64,
    },

    /// Rejected before reaching storage.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// The operation did not finish in time. Its outcome is unknown.
    #[error("{op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },

    /// Any other storage fault (I/O, locking, corrupt file).
    #[error("storage error: {0}")]
    Storage(sqlx::Error),
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => LedgerError::Timeout {
                op: "pool acquire",
                after: Duration::ZERO,
            },
            other => LedgerError::Storage(other),
        }
    }
}

impl LedgerError {
    /// True for faults where retrying an idempotent operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Timeout { .. } | LedgerError::Storage(_))
    }
}
