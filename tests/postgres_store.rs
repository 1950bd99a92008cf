//! Tests of [`PostgresStore`] against a live database.
//!
//! Ignored by default. Run with a scratch database:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/payouts_test cargo test --test postgres_store -- --ignored
//! ```
//!
//! Both migration sets are applied on connect. Every test seeds its own
//! random accounts, so runs never collide on the `(account_id, period)` key.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::NaiveDate;
use payout_reconciler::config::{JobConfig, ReconcilerConfig};
use payout_reconciler::domain::payout::SYSTEM_GENERATED_NOTE;
use payout_reconciler::domain::{AccountId, Money, NewPayout, PayoutPeriod};
use payout_reconciler::persistence::{CreateOutcome, PayoutStore, PostgresStore};
use sqlx::PgPool;
use uuid::Uuid;

/// Connects to `DATABASE_URL`, or returns `None` when it is unset.
async fn connect() -> Option<(PostgresStore, PgPool)> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let config = ReconcilerConfig {
        listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        ledger_database_url: url.clone(),
        payout_database_url: url.clone(),
        database_max_connections: 8,
        database_min_connections: 1,
        database_connect_timeout_secs: 5,
        run_migrations: true,
        run_ledger_migrations: true,
        log_json: false,
        request_timeout_secs: 30,
        job: JobConfig::default(),
    };
    let store = match PostgresStore::connect(&config).await {
        Ok(store) => store,
        Err(e) => panic!("connect failed: {e}"),
    };
    let Ok(pool) = PgPool::connect(&url).await else {
        panic!("seed pool failed");
    };
    Some((store, pool))
}

fn september() -> PayoutPeriod {
    let Some(period) = PayoutPeriod::new(2026, 9) else {
        panic!("invalid period");
    };
    period
}

fn day(d: u32) -> NaiveDate {
    let Some(date) = NaiveDate::from_ymd_opt(2026, 9, d) else {
        panic!("invalid date");
    };
    date
}

async fn seed_account(pool: &PgPool, status: &str) -> AccountId {
    let id = AccountId::new();
    let result = sqlx::query("INSERT INTO accounts (id, status) VALUES ($1, $2)")
        .bind(*id.as_uuid())
        .bind(status)
        .execute(pool)
        .await;
    if let Err(e) = result {
        panic!("seed account failed: {e}");
    }
    id
}

async fn seed_event(pool: &PgPool, account: AccountId, on: NaiveDate, cents: i64, kind: &str) {
    let result = sqlx::query(
        "INSERT INTO revenue_events (id, account_id, occurred_on, amount_cents, kind) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(*account.as_uuid())
    .bind(on)
    .bind(cents)
    .bind(kind)
    .execute(pool)
    .await;
    if let Err(e) = result {
        panic!("seed event failed: {e}");
    }
}

fn new_payout(account: AccountId) -> NewPayout {
    NewPayout {
        account_id: account,
        period: september(),
        gross_revenue: Money::from_units(150),
        reconciliation: Money::from_units(30),
        total_payout: Money::from_units(120),
        payment_method_id: None,
        notes: SYSTEM_GENERATED_NOTE.to_string(),
    }
}

async fn activity_rows(pool: &PgPool, account: AccountId) -> i64 {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM activity_logs WHERE account_id = $1 AND action = 'payout_created'",
    )
    .bind(*account.as_uuid())
    .fetch_one(pool)
    .await;
    match count {
        Ok(n) => n,
        Err(e) => panic!("count failed: {e}"),
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn reward_reads_exclude_banned_accounts_and_other_months() {
    let Some((store, pool)) = connect().await else {
        return;
    };
    let active = seed_account(&pool, "active").await;
    let banned = seed_account(&pool, "banned").await;
    seed_event(&pool, active, day(1), 10_000, "reward").await;
    seed_event(&pool, active, day(30), 5_000, "reward").await;
    seed_event(&pool, banned, day(2), 99_900, "reward").await;
    let Some(october) = NaiveDate::from_ymd_opt(2026, 10, 1) else {
        panic!("invalid date");
    };
    seed_event(&pool, active, october, 7_000, "reward").await;
    seed_event(&pool, banned, day(3), -2_000, "reconciliation").await;

    let Ok(rewards) = store.fetch_reward_events(september()).await else {
        panic!("reward read failed");
    };
    let ours: Vec<_> = rewards
        .iter()
        .filter(|e| e.account_id == active || e.account_id == banned)
        .collect();
    assert_eq!(ours.len(), 2);
    assert!(ours.iter().all(|e| e.account_id == active));

    let Ok(recons) = store.fetch_reconciliation_events(september()).await else {
        panic!("reconciliation read failed");
    };
    assert!(recons.iter().any(|e| e.account_id == banned));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn create_payout_writes_audit_row_and_rejects_duplicates() {
    let Some((store, pool)) = connect().await else {
        return;
    };
    let account = seed_account(&pool, "active").await;

    let Ok(CreateOutcome::Created(payout)) = store.create_payout(new_payout(account)).await else {
        panic!("first insert should create");
    };
    assert_eq!(payout.total_payout, Money::from_units(120));
    assert_eq!(activity_rows(&pool, account).await, 1);

    let Ok(outcome) = store.create_payout(new_payout(account)).await else {
        panic!("second insert failed");
    };
    assert_eq!(outcome, CreateOutcome::AlreadyExists);
    assert_eq!(activity_rows(&pool, account).await, 1);

    let Ok(Some(found)) = store.find_payout(account, september()).await else {
        panic!("payout not found");
    };
    assert_eq!(found.id, payout.id);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_creates_insert_once() {
    let Some((store, pool)) = connect().await else {
        return;
    };
    let store = Arc::new(store);
    let account = seed_account(&pool, "active").await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.create_payout(new_payout(account)).await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await {
            Ok(Ok(CreateOutcome::Created(_))) => created += 1,
            Ok(Ok(CreateOutcome::AlreadyExists)) => {}
            Ok(Err(e)) => panic!("insert failed: {e}"),
            Err(e) => panic!("task failed: {e}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(activity_rows(&pool, account).await, 1);

    let Ok(listed) = store.list_payouts(september()).await else {
        panic!("list failed");
    };
    assert_eq!(listed.iter().filter(|p| p.account_id == account).count(), 1);
}
