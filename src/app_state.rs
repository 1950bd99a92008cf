//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::PayoutJob;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The payout job, including its configuration.
    pub payout_job: Arc<PayoutJob>,
}

impl AppState {
    /// Wraps a job in shared state.
    #[must_use]
    pub fn new(payout_job: PayoutJob) -> Self {
        Self {
            payout_job: Arc::new(payout_job),
        }
    }
}
