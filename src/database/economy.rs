//! Contains all database functions for the `users` table: registration,
//! balances and the cooldown-gated work reward.
//!
//! Every mutation is a single guarded statement, or a single transaction whose
//! first statement is the write, so two callers racing on one user cannot both
//! pass a check that only one of them should pass.

use super::error::LedgerError;
use super::init::DbPool;
use super::models::{AccountRow, GrantOutcome, Identity, UserAccount, from_epoch};
use chrono::{DateTime, Duration, Utc};

/// Inserts the user unless they already exist. Returns whether a row was created.
pub async fn register(
    pool: &DbPool,
    identity: Identity,
    starting_balance: i64,
) -> Result<bool, LedgerError> {
    if starting_balance < 0 {
        return Err(LedgerError::InvalidInput("starting balance must not be negative"));
    }
    let res = sqlx::query(
        "INSERT INTO users (identity, balance, cooldown_until) VALUES (?1, ?2, NULL) \
         ON CONFLICT(identity) DO NOTHING",
    )
    .bind(identity.to_db())
    .bind(starting_balance)
    .execute(pool)
    .await?;
    Ok(res.rows_affected() == 1)
}

pub async fn exists(pool: &DbPool, identity: Identity) -> Result<bool, LedgerError> {
    let found: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE identity = ?1)")
        .bind(identity.to_db())
        .fetch_one(pool)
        .await?;
    Ok(found != 0)
}

pub async fn get_balance(pool: &DbPool, identity: Identity) -> Result<i64, LedgerError> {
    sqlx::query_scalar("SELECT balance FROM users WHERE identity = ?1")
        .bind(identity.to_db())
        .fetch_optional(pool)
        .await?
        .ok_or(LedgerError::NotFound(identity))
}

pub async fn get_account(pool: &DbPool, identity: Identity) -> Result<UserAccount, LedgerError> {
    let row = sqlx::query_as::<_, AccountRow>(
        "SELECT identity, balance, cooldown_until FROM users WHERE identity = ?1",
    )
    .bind(identity.to_db())
    .fetch_optional(pool)
    .await?
    .ok_or(LedgerError::NotFound(identity))?;
    row.try_into()
}

/// Adds (or subtracts) coins in one statement and returns the new balance.
///
/// A debit may not take the balance below zero and a credit may not push it
/// past `i64::MAX`; nothing is written in either case. Credits are always
/// allowed on an account that is already negative (possible after migrating
/// old data).
pub async fn adjust_balance(
    pool: &DbPool,
    identity: Identity,
    delta: i64,
) -> Result<i64, LedgerError> {
    loop {
        let updated: Option<i64> = sqlx::query_scalar(
            "UPDATE users SET balance = balance + ?2 \
             WHERE identity = ?1 \
               AND (?2 >= 0 OR balance + ?2 >= 0) \
               AND (?2 <= 0 OR balance <= 9223372036854775807 - ?2) \
             RETURNING balance",
        )
        .bind(identity.to_db())
        .bind(delta)
        .fetch_optional(pool)
        .await?;
        if let Some(balance) = updated {
            return Ok(balance);
        }

        // The guard refused or the user is missing; find out which for the caller.
        let balance = get_balance(pool, identity).await?;
        let next = balance.checked_add(delta);
        if delta < 0 && next.is_none_or(|next| next < 0) {
            return Err(LedgerError::InsufficientFunds {
                identity,
                balance,
                delta,
            });
        }
        if next.is_none() {
            return Err(LedgerError::InvalidInput("balance would overflow"));
        }
        // The balance moved between the two statements; try again.
    }
}

/// Grants `amount` and restarts the cooldown if the user is off cooldown.
///
/// The eligibility check lives in the `UPDATE`'s `WHERE` clause, so the check
/// and the write are one step. When the update matches nothing, the follow-up
/// read runs in the same transaction, after the write lock was taken, so the
/// reported remaining time is the one that actually blocked the grant.
///
/// Cooldowns are stored at whole-second precision, so `cooldown` must be a
/// whole number of seconds.
pub async fn grant_reward_if_eligible(
    pool: &DbPool,
    identity: Identity,
    amount: i64,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> Result<GrantOutcome, LedgerError> {
    if amount < 0 {
        return Err(LedgerError::InvalidInput("reward amount must not be negative"));
    }
    if cooldown.num_seconds() < 1 {
        return Err(LedgerError::InvalidInput("cooldown must be at least one second"));
    }
    if cooldown.subsec_nanos() != 0 {
        return Err(LedgerError::InvalidInput("cooldown must be whole seconds"));
    }
    let now_secs = now.timestamp();
    let until_secs = now_secs
        .checked_add(cooldown.num_seconds())
        .ok_or(LedgerError::InvalidInput("cooldown ends out of range"))?;
    let cooldown_until = from_epoch(until_secs)?;

    let mut tx = pool.begin().await?;
    let granted: Option<i64> = sqlx::query_scalar(
        "UPDATE users SET balance = balance + ?2, cooldown_until = ?3 \
         WHERE identity = ?1 \
           AND (cooldown_until IS NULL OR cooldown_until <= ?4) \
           AND balance <= 9223372036854775807 - ?2 \
         RETURNING balance",
    )
    .bind(identity.to_db())
    .bind(amount)
    .bind(until_secs)
    .bind(now_secs)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some(balance) = granted {
        tx.commit().await?;
        return Ok(GrantOutcome::Granted {
            amount,
            balance,
            cooldown_until,
        });
    }

    let current: Option<(i64, Option<i64>)> =
        sqlx::query_as("SELECT balance, cooldown_until FROM users WHERE identity = ?1")
            .bind(identity.to_db())
            .fetch_optional(&mut *tx)
            .await?;
    tx.commit().await?;

    match current {
        None => Err(LedgerError::NotFound(identity)),
        Some((_, Some(until))) if until > now_secs => Ok(GrantOutcome::OnCooldown {
            remaining: from_epoch(until)? - now,
        }),
        Some(_) => Err(LedgerError::InvalidInput("balance would overflow")),
    }
}

/// Every account, in no particular order.
pub async fn list_all(pool: &DbPool) -> Result<Vec<UserAccount>, LedgerError> {
    sqlx::query_as::<_, AccountRow>("SELECT identity, balance, cooldown_until FROM users")
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(UserAccount::try_from)
        .collect()
}

pub async fn remove(pool: &DbPool, identity: Identity) -> Result<bool, LedgerError> {
    let res = sqlx::query("DELETE FROM users WHERE identity = ?1")
        .bind(identity.to_db())
        .execute(pool)
        .await?;
    Ok(res.rows_affected() == 1)
}

/// Deletes every account. Returns how many were removed.
pub async fn remove_all(pool: &DbPool) -> Result<u64, LedgerError> {
    let res = sqlx::query("DELETE FROM users").execute(pool).await?;
    Ok(res.rows_affected())
}
