//! The ledger store handle.
//!
//! Built once at startup and handed to every command handler. Each call is
//! bounded by the configured operation timeout; when it fires the in-flight
//! statement or transaction is dropped, which rolls it back.

use super::economy;
use super::error::LedgerError;
use super::init::{self, DbPool, StoreConfig};
use super::models::{GrantOutcome, Identity, UserAccount};
use super::schema::{self, SchemaStatus};
use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use std::time::Duration as StdDuration;
use tracing::{instrument, warn};

#[derive(Clone, Debug)]
pub struct Ledger {
    pool: DbPool,
    op_timeout: StdDuration,
}

impl Ledger {
    pub fn new(pool: DbPool, op_timeout: StdDuration) -> Self {
        Self { pool, op_timeout }
    }

    /// Opens the store. Does not touch the schema; call [`Ledger::ensure_schema`].
    pub async fn open(config: &StoreConfig) -> Result<Self, LedgerError> {
        let pool = init::connect(config).await?;
        Ok(Self::new(pool, config.op_timeout))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Not bounded by the operation timeout: a migration may legitimately take a while.
    pub async fn ensure_schema(&self) -> Result<SchemaStatus, LedgerError> {
        schema::ensure_schema(&self.pool).await
    }

    #[instrument(level = "debug", skip(self), fields(identity = %identity))]
    pub async fn register(
        &self,
        identity: Identity,
        starting_balance: i64,
    ) -> Result<bool, LedgerError> {
        self.bounded(
            "register",
            economy::register(&self.pool, identity, starting_balance),
        )
        .await
    }

    pub async fn exists(&self, identity: Identity) -> Result<bool, LedgerError> {
        self.bounded("exists", economy::exists(&self.pool, identity))
            .await
    }

    pub async fn balance(&self, identity: Identity) -> Result<i64, LedgerError> {
        self.bounded("balance", economy::get_balance(&self.pool, identity))
            .await
    }

    pub async fn account(&self, identity: Identity) -> Result<UserAccount, LedgerError> {
        self.bounded("account", economy::get_account(&self.pool, identity))
            .await
    }

    #[instrument(level = "debug", skip(self), fields(identity = %identity))]
    pub async fn adjust_balance(&self, identity: Identity, delta: i64) -> Result<i64, LedgerError> {
        self.bounded(
            "adjust_balance",
            economy::adjust_balance(&self.pool, identity, delta),
        )
        .await
    }

    /// At most one grant per user per cooldown window, however many callers race.
    #[instrument(level = "debug", skip(self), fields(identity = %identity))]
    pub async fn grant_reward_if_eligible(
        &self,
        identity: Identity,
        amount: i64,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> Result<GrantOutcome, LedgerError> {
        self.bounded(
            "grant_reward",
            economy::grant_reward_if_eligible(&self.pool, identity, amount, now, cooldown),
        )
        .await
    }

    pub async fn list_all(&self) -> Result<Vec<UserAccount>, LedgerError> {
        self.bounded("list_all", economy::list_all(&self.pool)).await
    }

    #[instrument(level = "debug", skip(self), fields(identity = %identity))]
    pub async fn remove(&self, identity: Identity) -> Result<bool, LedgerError> {
        self.bounded("remove", economy::remove(&self.pool, identity))
            .await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn remove_all(&self) -> Result<u64, LedgerError> {
        self.bounded("remove_all", economy::remove_all(&self.pool))
            .await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, LedgerError>
    where
        F: Future<Output = Result<T, LedgerError>>,
    {
        let res = match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(LedgerError::Timeout {
                op,
                after: self.op_timeout,
            }),
        };
        if let Err(e) = &res
            && e.is_transient()
        {
            warn!(target = "ledger.store", op, error = %e, "ledger operation failed");
        }
        res
    }
}
