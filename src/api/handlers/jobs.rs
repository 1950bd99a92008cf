//! Scheduler-triggered job endpoints.
//!
//! `monthly-payouts` and `monthly-payments` are the two trigger names the
//! scheduler has historically used; both run the same job.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::SchedulerAuth;
use crate::api::dto::{EmptyRunResponse, PayoutRunResponse, PeriodQuery};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, ReconcilerError};
use crate::service::PreviewReport;

/// `POST /jobs/monthly-payouts` — Run the monthly payout job.
///
/// # Errors
///
/// Returns [`ReconcilerError::Unauthorized`] for a bad shared secret,
/// [`ReconcilerError::InvalidRequest`] for a malformed period, and
/// [`ReconcilerError::LedgerRead`] if the ledger cannot be read.
#[utoipa::path(
    post,
    path = "/api/v1/jobs/monthly-payouts",
    tag = "Jobs",
    summary = "Run the monthly payout job",
    description = "Nets the period's reward and reconciliation revenue per account and creates one pending payout per eligible account. Safe to re-run: existing payouts are never duplicated or overwritten.",
    params(PeriodQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Run summary", body = PayoutRunResponse),
        (status = 400, description = "Malformed period", body = ErrorResponse),
        (status = 401, description = "Missing or incorrect shared secret", body = ErrorResponse),
        (status = 500, description = "Ledger read failed", body = ErrorResponse),
    )
)]
pub async fn run_monthly_payouts(
    _auth: SchedulerAuth,
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, ReconcilerError> {
    let period = query.resolve()?;
    let report = state.payout_job.run(period).await?;

    if report.accounts_considered == 0 {
        return Ok(Json(EmptyRunResponse::for_period(period)).into_response());
    }
    Ok(Json(PayoutRunResponse::from(report)).into_response())
}

/// `POST /jobs/monthly-payments` — Alias of [`run_monthly_payouts`].
///
/// # Errors
///
/// Same as [`run_monthly_payouts`].
#[utoipa::path(
    post,
    path = "/api/v1/jobs/monthly-payments",
    tag = "Jobs",
    summary = "Run the monthly payout job (legacy trigger name)",
    params(PeriodQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Run summary", body = PayoutRunResponse),
        (status = 401, description = "Missing or incorrect shared secret", body = ErrorResponse),
        (status = 500, description = "Ledger read failed", body = ErrorResponse),
    )
)]
pub async fn run_monthly_payments(
    auth: SchedulerAuth,
    state: State<AppState>,
    query: Query<PeriodQuery>,
) -> Result<Response, ReconcilerError> {
    run_monthly_payouts(auth, state, query).await
}

/// `GET /jobs/monthly-payouts/preview` — Dry run without writes.
///
/// # Errors
///
/// Returns [`ReconcilerError::Unauthorized`] for a bad shared secret and
/// [`ReconcilerError::LedgerRead`] if the ledger cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/jobs/monthly-payouts/preview",
    tag = "Jobs",
    summary = "Preview the monthly payout job",
    description = "Returns the per-account totals and the eligible set the job would process, without writing payouts or audit entries.",
    params(PeriodQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Eligible accounts", body = PreviewReport),
        (status = 401, description = "Missing or incorrect shared secret", body = ErrorResponse),
    )
)]
pub async fn preview_monthly_payouts(
    _auth: SchedulerAuth,
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<PreviewReport>, ReconcilerError> {
    let period = query.resolve()?;
    let preview = state.payout_job.preview(period).await?;
    Ok(Json(preview))
}

/// Job trigger routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/jobs/monthly-payouts", post(run_monthly_payouts))
        .route("/jobs/monthly-payments", post(run_monthly_payments))
        .route(
            "/jobs/monthly-payouts/preview",
            get(preview_monthly_payouts),
        )
}
