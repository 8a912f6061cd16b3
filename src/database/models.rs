//! Data structures that map to the `users` table or describe store results.

use super::error::LedgerError;
use chrono::{DateTime, Duration, Utc};
use serenity::model::id::UserId;
use std::fmt;

/// A stable user identifier. Discord snowflakes in practice.
///
/// SQLite only has signed 64-bit integers, so the value is stored with its bits
/// reinterpreted as `i64`. The mapping is a bijection: every `u64` survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(pub u64);

impl Identity {
    pub fn get(self) -> u64 {
        self.0
    }

    pub(crate) fn to_db(self) -> i64 {
        self.0 as i64
    }

    pub(crate) fn from_db(raw: i64) -> Self {
        Identity(raw as u64)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for Identity {
    fn from(id: UserId) -> Self {
        Identity(id.get())
    }
}

impl From<u64> for Identity {
    fn from(id: u64) -> Self {
        Identity(id)
    }
}

/// One registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub identity: Identity,
    pub balance: i64,
    /// `None` means the user can work right away.
    pub cooldown_until: Option<DateTime<Utc>>,
}

/// Raw row as SQLite hands it back.
#[derive(sqlx::FromRow, Debug, Clone)]
pub(crate) struct AccountRow {
    pub identity: i64,
    pub balance: i64,
    pub cooldown_until: Option<i64>,
}

impl TryFrom<AccountRow> for UserAccount {
    type Error = LedgerError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(UserAccount {
            identity: Identity::from_db(row.identity),
            balance: row.balance,
            cooldown_until: row.cooldown_until.map(from_epoch).transpose()?,
        })
    }
}

/// Result of a cooldown-gated reward attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOutcome {
    Granted {
        amount: i64,
        balance: i64,
        cooldown_until: DateTime<Utc>,
    },
    /// Nothing was written.
    OnCooldown { remaining: Duration },
}

impl GrantOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, GrantOutcome::Granted { .. })
    }
}

/// Converts stored epoch seconds back into a UTC instant.
pub(crate) fn from_epoch(secs: i64) -> Result<DateTime<Utc>, LedgerError> {
    DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
        LedgerError::Storage(sqlx::Error::Decode(
            format!("cooldown_until {secs} is out of range").into(),
        ))
    })
}
