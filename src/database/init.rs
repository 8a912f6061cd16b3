//! This module defines shared database types and opens the connection pool.
//! The store is a single SQLite file; `DATABASE_URL` points at it.

use super::error::LedgerError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

/// A type alias for the database connection pool (`Pool<Sqlite>`).
/// This is used throughout the application to provide a consistent, clear name
/// for the shared database connection state.
pub type DbPool = Pool<Sqlite>;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_OP_TIMEOUT_MS: u64 = 5_000;

/// Where the store lives and how long callers are willing to wait on it.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// e.g. `sqlite://bot.db`. The file is created if missing.
    pub url: String,
    pub max_connections: u32,
    /// How long SQLite waits on a locked database before giving up.
    pub busy_timeout: Duration,
    /// Deadline for a single ledger operation, including pool acquisition.
    pub op_timeout: Duration,
}

impl StoreConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            op_timeout: Duration::from_millis(DEFAULT_OP_TIMEOUT_MS),
        }
    }

    #[must_use]
    pub const fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    #[must_use]
    pub const fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }
}

/// Opens the pool. WAL keeps readers off the writer's lock.
pub async fn connect(config: &StoreConfig) -> Result<DbPool, LedgerError> {
    let options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| LedgerError::Schema(format!("invalid database url '{}': {e}", config.url)))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(config.busy_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.op_timeout)
        .connect_with(options)
        .await?;

    tracing::info!(
        target = "ledger.store",
        url = %config.url,
        max_connections = config.max_connections,
        "opened ledger store"
    );
    Ok(pool)
}
