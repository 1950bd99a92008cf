//! payout-reconciler server entry point.
//!
//! Connects to the ledger and payout databases and serves the job
//! trigger endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use payout_reconciler::api;
use payout_reconciler::app_state::AppState;
use payout_reconciler::config::ReconcilerConfig;
use payout_reconciler::persistence::PostgresStore;
use payout_reconciler::service::PayoutJob;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ReconcilerConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        addr = %config.listen_addr,
        threshold = %config.job.min_payout_threshold,
        "starting payout-reconciler"
    );
    if config.job.shared_secret.is_none() {
        tracing::warn!("PAYOUT_JOB_SECRET is not set; every job trigger will be rejected");
    }

    // Build persistence layer
    let store = PostgresStore::connect(&config)
        .await
        .context("connecting to databases")?;

    // Build service layer
    let job = PayoutJob::new(Arc::new(store), config.job.clone());

    // Build router
    let app = api::build_app(
        AppState::new(job),
        Duration::from_secs(config.request_timeout_secs),
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
