//! Ledger store behaviour against a real on-disk SQLite file.

use beamconomy_bot::database::{
    GrantOutcome, Identity, Ledger, LedgerError, SchemaStatus, StoreConfig,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashSet;
use tempfile::TempDir;

const DAY: Duration = Duration::hours(24);

fn db_config(dir: &TempDir) -> StoreConfig {
    let path = dir.path().join("ledger.db");
    StoreConfig::new(&format!("sqlite://{}", path.display())).with_max_connections(8)
}

async fn fresh_ledger() -> (TempDir, Ledger) {
    let dir = tempfile::tempdir().expect("tempdir");
    let ledger = Ledger::open(&db_config(&dir)).await.expect("open ledger");
    assert_eq!(ledger.ensure_schema().await.unwrap(), SchemaStatus::Created);
    (dir, ledger)
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn ensure_schema_is_idempotent() {
    let (_dir, ledger) = fresh_ledger().await;
    ledger.register(Identity(1), 1000).await.unwrap();
    assert_eq!(ledger.ensure_schema().await.unwrap(), SchemaStatus::Current);
    assert_eq!(ledger.ensure_schema().await.unwrap(), SchemaStatus::Current);
    assert_eq!(ledger.balance(Identity(1)).await.unwrap(), 1000);
}

#[tokio::test]
async fn unknown_identity_is_not_found() {
    let (_dir, ledger) = fresh_ledger().await;
    let ghost = Identity(404);
    assert!(!ledger.exists(ghost).await.unwrap());
    assert!(matches!(
        ledger.balance(ghost).await,
        Err(LedgerError::NotFound(id)) if id == ghost
    ));
    assert!(matches!(
        ledger.account(ghost).await,
        Err(LedgerError::NotFound(_))
    ));
    assert!(matches!(
        ledger.grant_reward_if_eligible(ghost, 600, t0(), DAY).await,
        Err(LedgerError::NotFound(_))
    ));
    assert!(ledger.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn zero_balance_is_distinct_from_missing() {
    let (_dir, ledger) = fresh_ledger().await;
    assert!(ledger.register(Identity(5), 0).await.unwrap());
    assert!(ledger.exists(Identity(5)).await.unwrap());
    assert_eq!(ledger.balance(Identity(5)).await.unwrap(), 0);
}

#[tokio::test]
async fn duplicate_registration_is_a_noop() {
    let (_dir, ledger) = fresh_ledger().await;
    let id = Identity(42);
    assert!(ledger.register(id, 1000).await.unwrap());
    assert!(!ledger.register(id, 5000).await.unwrap());

    let account = ledger.account(id).await.unwrap();
    assert_eq!(account.balance, 1000);
    assert_eq!(account.cooldown_until, None);
    assert_eq!(ledger.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn reward_cycle_respects_cooldown() {
    let (_dir, ledger) = fresh_ledger().await;
    let id = Identity(7);
    ledger.register(id, 1000).await.unwrap();

    let first = ledger
        .grant_reward_if_eligible(id, 600, t0(), DAY)
        .await
        .unwrap();
    assert_eq!(
        first,
        GrantOutcome::Granted {
            amount: 600,
            balance: 1600,
            cooldown_until: t0() + DAY,
        }
    );
    let account = ledger.account(id).await.unwrap();
    assert_eq!(account.balance, 1600);
    assert_eq!(account.cooldown_until, Some(t0() + DAY));

    // Right away: refused, nothing written.
    let again = ledger
        .grant_reward_if_eligible(id, 600, t0() + Duration::seconds(1), DAY)
        .await
        .unwrap();
    match again {
        GrantOutcome::OnCooldown { remaining } => {
            assert_eq!(remaining, DAY - Duration::seconds(1));
        }
        other => panic!("expected cooldown, got {other:?}"),
    }
    assert_eq!(ledger.balance(id).await.unwrap(), 1600);
    assert_eq!(
        ledger.account(id).await.unwrap().cooldown_until,
        Some(t0() + DAY)
    );

    // Exactly at expiry the user is eligible again.
    let later = t0() + DAY;
    let third = ledger
        .grant_reward_if_eligible(id, 300, later, DAY)
        .await
        .unwrap();
    assert!(third.is_granted());
    let account = ledger.account(id).await.unwrap();
    assert_eq!(account.balance, 1900);
    assert_eq!(account.cooldown_until, Some(later + DAY));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_grants_pay_exactly_once() {
    let (_dir, ledger) = fresh_ledger().await;
    let id = Identity(99);
    ledger.register(id, 1000).await.unwrap();

    const N: usize = 24;
    let now = t0();
    let mut handles = Vec::with_capacity(N);
    for _ in 0..N {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            ledger.grant_reward_if_eligible(id, 600, now, DAY).await
        }));
    }

    let mut granted = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.expect("task panicked").expect("store error") {
            GrantOutcome::Granted { .. } => granted += 1,
            GrantOutcome::OnCooldown { remaining } => {
                assert_eq!(remaining, DAY);
                refused += 1;
            }
        }
    }
    assert_eq!(granted, 1);
    assert_eq!(refused, N - 1);
    assert_eq!(ledger.balance(id).await.unwrap(), 1600);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_grants_for_different_users_all_succeed() {
    let (_dir, ledger) = fresh_ledger().await;
    let ids: Vec<Identity> = (1..=12).map(Identity).collect();
    for id in &ids {
        ledger.register(*id, 1000).await.unwrap();
    }

    let mut handles = Vec::new();
    for id in ids.clone() {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            ledger.grant_reward_if_eligible(id, 100, t0(), DAY).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_granted());
    }
    for id in ids {
        assert_eq!(ledger.balance(id).await.unwrap(), 1100);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registration_creates_one_row() {
    let (_dir, ledger) = fresh_ledger().await;
    let id = Identity(31337);
    let mut handles = Vec::new();
    for _ in 0..10 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move { ledger.register(id, 1000).await }));
    }
    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            created += 1;
        }
    }
    assert_eq!(created, 1);
    assert_eq!(ledger.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn adjust_balance_applies_deltas() {
    let (_dir, ledger) = fresh_ledger().await;
    let id = Identity(8);
    ledger.register(id, 1600).await.unwrap();

    assert_eq!(ledger.adjust_balance(id, -200).await.unwrap(), 1400);
    assert_eq!(ledger.adjust_balance(id, 50).await.unwrap(), 1450);
    assert_eq!(ledger.adjust_balance(id, -1450).await.unwrap(), 0);
    assert_eq!(ledger.balance(id).await.unwrap(), 0);
}

#[tokio::test]
async fn adjust_balance_refuses_missing_and_overdraft() {
    let (_dir, ledger) = fresh_ledger().await;
    let ghost = Identity(1234);
    assert!(matches!(
        ledger.adjust_balance(ghost, 100).await,
        Err(LedgerError::NotFound(_))
    ));
    assert!(!ledger.exists(ghost).await.unwrap());

    let id = Identity(9);
    ledger.register(id, 100).await.unwrap();
    match ledger.adjust_balance(id, -101).await {
        Err(LedgerError::InsufficientFunds {
            balance, delta, ..
        }) => {
            assert_eq!(balance, 100);
            assert_eq!(delta, -101);
        }
        other => panic!("expected insufficient funds, got {other:?}"),
    }
    assert_eq!(ledger.balance(id).await.unwrap(), 100);

    ledger.adjust_balance(id, i64::MAX - 100).await.unwrap();
    assert!(matches!(
        ledger.adjust_balance(id, 1).await,
        Err(LedgerError::InvalidInput(_))
    ));
    assert_eq!(ledger.balance(id).await.unwrap(), i64::MAX);
}

#[tokio::test]
async fn grant_rejects_bad_input_without_writing() {
    let (_dir, ledger) = fresh_ledger().await;
    let id = Identity(10);
    ledger.register(id, 1000).await.unwrap();

    assert!(matches!(
        ledger.grant_reward_if_eligible(id, -5, t0(), DAY).await,
        Err(LedgerError::InvalidInput(_))
    ));
    assert!(matches!(
        ledger
            .grant_reward_if_eligible(id, 5, t0(), Duration::zero())
            .await,
        Err(LedgerError::InvalidInput(_))
    ));
    assert!(matches!(
        ledger
            .grant_reward_if_eligible(id, 5, t0(), Duration::milliseconds(1900))
            .await,
        Err(LedgerError::InvalidInput(_))
    ));
    let account = ledger.account(id).await.unwrap();
    assert_eq!(account.balance, 1000);
    assert_eq!(account.cooldown_until, None);
}

#[tokio::test]
async fn cooldown_survives_restart_at_second_precision() {
    let dir = tempfile::tempdir().unwrap();
    let id = Identity(77);
    let now = t0() + Duration::milliseconds(750);
    {
        let ledger = Ledger::open(&db_config(&dir)).await.unwrap();
        ledger.ensure_schema().await.unwrap();
        ledger.register(id, 1000).await.unwrap();
        ledger
            .grant_reward_if_eligible(id, 600, now, DAY)
            .await
            .unwrap();
        ledger.close().await;
    }

    let reopened = Ledger::open(&db_config(&dir)).await.unwrap();
    assert_eq!(reopened.ensure_schema().await.unwrap(), SchemaStatus::Current);
    let account = reopened.account(id).await.unwrap();
    assert_eq!(account.balance, 1600);
    assert_eq!(account.cooldown_until, Some(t0() + DAY));
}

#[tokio::test]
async fn full_range_identities_round_trip() {
    let (_dir, ledger) = fresh_ledger().await;
    let big = Identity(u64::MAX);
    let mid = Identity(i64::MAX as u64 + 1);
    let small = Identity(1);
    for id in [big, mid, small] {
        assert!(ledger.register(id, 1000).await.unwrap());
    }
    ledger.adjust_balance(mid, 1).await.unwrap();

    let listed: HashSet<(u64, i64)> = ledger
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|a| (a.identity.get(), a.balance))
        .collect();
    let expected: HashSet<(u64, i64)> =
        [(u64::MAX, 1000), (i64::MAX as u64 + 1, 1001), (1, 1000)].into();
    assert_eq!(listed, expected);
}

#[tokio::test]
async fn administrative_removal() {
    let (_dir, ledger) = fresh_ledger().await;
    for id in 1..=3 {
        ledger.register(Identity(id), 1000).await.unwrap();
    }
    assert!(ledger.remove(Identity(2)).await.unwrap());
    assert!(!ledger.remove(Identity(2)).await.unwrap());
    assert!(!ledger.exists(Identity(2)).await.unwrap());
    assert_eq!(ledger.remove_all().await.unwrap(), 2);
    assert!(ledger.list_all().await.unwrap().is_empty());

    // A removed user can join again from scratch.
    assert!(ledger.register(Identity(2), 1000).await.unwrap());
}
