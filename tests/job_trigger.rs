//! End-to-end tests of the job trigger endpoints over a real TCP listener,
//! backed by the in-memory store.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use payout_reconciler::api;
use payout_reconciler::app_state::AppState;
use payout_reconciler::config::JobConfig;
use payout_reconciler::domain::{AccountId, Money, PayoutPeriod, RevenueEvent};
use payout_reconciler::persistence::{InMemoryStore, PayoutStore};
use payout_reconciler::service::PayoutJob;
use serde_json::Value;

const SECRET: &str = "test-secret";

/// Starts the app on an ephemeral port and returns its address and store.
async fn spawn_app() -> (SocketAddr, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let config = JobConfig {
        shared_secret: Some(SECRET.to_string()),
        ..JobConfig::default()
    };
    let job = PayoutJob::new(Arc::clone(&store) as Arc<dyn PayoutStore>, config);
    let app = api::build_app(AppState::new(job), Duration::from_secs(30));

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, store)
}

fn september(day: u32) -> NaiveDate {
    let Some(date) = NaiveDate::from_ymd_opt(2026, 9, day) else {
        panic!("invalid date");
    };
    date
}

async fn post(addr: SocketAddr, path: &str, token: Option<&str>) -> (u16, Value) {
    let client = reqwest::Client::new();
    let mut request = client.post(format!("http://{addr}{path}"));
    if let Some(token) = token {
        request = request.header("Authorization", format!("Bearer {token}"));
    }
    let Ok(response) = request.send().await else {
        panic!("request failed");
    };
    let status = response.status().as_u16();
    let Ok(body) = response.json::<Value>().await else {
        panic!("body is not JSON");
    };
    (status, body)
}

#[tokio::test]
async fn missing_secret_is_rejected_without_side_effects() {
    let (addr, store) = spawn_app().await;
    store
        .add_events([RevenueEvent::reward(
            AccountId::new(),
            september(5),
            Money::from_units(500),
        )])
        .await;

    let (status, body) = post(addr, "/api/v1/jobs/monthly-payouts?period=2026-09", None).await;

    assert_eq!(status, 401);
    assert_eq!(body["error"]["code"], 1000);
    assert!(store.activity_log().await.is_empty());
}

#[tokio::test]
async fn wrong_secret_is_rejected() {
    let (addr, _) = spawn_app().await;
    let (status, _) = post(
        addr,
        "/api/v1/jobs/monthly-payouts?period=2026-09",
        Some("not-the-secret"),
    )
    .await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn run_reports_created_payouts() {
    let (addr, store) = spawn_app().await;
    let account = AccountId::new();
    store
        .add_events([
            RevenueEvent::reward(account, september(2), Money::from_units(150)),
            RevenueEvent::reconciliation(account, september(20), Money::from_units(-40)),
        ])
        .await;

    let (status, body) = post(
        addr,
        "/api/v1/jobs/monthly-payouts?period=2026-09",
        Some(SECRET),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["processedPayouts"], 1);
    assert_eq!(body["totalAmount"], "110.00");
    assert_eq!(body["period"], "2026-09");
    assert_eq!(body["payouts"][0]["account_id"], account.to_string());
    assert_eq!(body["payouts"][0]["amount"], "110.00");
    assert!(body["payouts"][0]["payout_id"].is_string());
}

#[tokio::test]
async fn legacy_trigger_name_is_idempotent_with_primary() {
    let (addr, store) = spawn_app().await;
    store
        .add_events([RevenueEvent::reward(
            AccountId::new(),
            september(9),
            Money::from_units(250),
        )])
        .await;

    let (_, first) = post(
        addr,
        "/api/v1/jobs/monthly-payouts?period=2026-09",
        Some(SECRET),
    )
    .await;
    let (status, second) = post(
        addr,
        "/api/v1/jobs/monthly-payments?period=2026-09",
        Some(SECRET),
    )
    .await;

    assert_eq!(first["processedPayouts"], 1);
    assert_eq!(status, 200);
    assert_eq!(second["processedPayouts"], 0);
    assert_eq!(second["skippedExisting"], 1);

    let Some(period) = PayoutPeriod::new(2026, 9) else {
        panic!("invalid period");
    };
    let Ok(payouts) = store.list_payouts(period).await else {
        panic!("list failed");
    };
    assert_eq!(payouts.len(), 1);
}

#[tokio::test]
async fn empty_period_reports_nothing_processed() {
    let (addr, _) = spawn_app().await;

    let (status, body) = post(
        addr,
        "/api/v1/jobs/monthly-payouts?period=2026-09",
        Some(SECRET),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["processed"], 0);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn ledger_failure_is_an_internal_error() {
    let (addr, store) = spawn_app().await;
    store.set_fail_ledger_reads(true).await;

    let (status, body) = post(
        addr,
        "/api/v1/jobs/monthly-payouts?period=2026-09",
        Some(SECRET),
    )
    .await;

    assert_eq!(status, 500);
    assert_eq!(body["error"]["code"], 3002);
}

#[tokio::test]
async fn malformed_period_is_a_bad_request() {
    let (addr, _) = spawn_app().await;
    let (status, body) = post(
        addr,
        "/api/v1/jobs/monthly-payouts?period=2026-13",
        Some(SECRET),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], 1001);
}

#[tokio::test]
async fn preview_and_listing_are_authenticated_reads() {
    let (addr, store) = spawn_app().await;
    store
        .add_events([RevenueEvent::reward(
            AccountId::new(),
            september(14),
            Money::from_units(120),
        )])
        .await;
    let client = reqwest::Client::new();

    let Ok(unauthorized) = client
        .get(format!("http://{addr}/api/v1/payouts?period=2026-09"))
        .send()
        .await
    else {
        panic!("request failed");
    };
    assert_eq!(unauthorized.status().as_u16(), 401);

    let Ok(preview) = client
        .get(format!(
            "http://{addr}/api/v1/jobs/monthly-payouts/preview?period=2026-09"
        ))
        .bearer_auth(SECRET)
        .send()
        .await
    else {
        panic!("request failed");
    };
    let Ok(preview) = preview.json::<Value>().await else {
        panic!("body is not JSON");
    };
    assert_eq!(preview["eligible"].as_array().map(Vec::len), Some(1));
    assert_eq!(preview["projectedTotal"], "120.00");
    assert_eq!(preview["minPayoutThreshold"], "100.00");
    assert_eq!(preview["accountsAggregated"], 1);

    let Ok(listing) = client
        .get(format!("http://{addr}/api/v1/payouts?period=2026-09"))
        .bearer_auth(SECRET)
        .send()
        .await
    else {
        panic!("request failed");
    };
    let Ok(listing) = listing.json::<Value>().await else {
        panic!("body is not JSON");
    };
    assert_eq!(listing["data"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn health_is_public() {
    let (addr, _) = spawn_app().await;
    let Ok(response) = reqwest::get(format!("http://{addr}/health")).await else {
        panic!("request failed");
    };
    assert_eq!(response.status().as_u16(), 200);
}
