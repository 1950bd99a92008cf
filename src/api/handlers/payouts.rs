//! Operator read-back of recorded payouts.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::auth::SchedulerAuth;
use crate::api::dto::{PayoutListResponse, PeriodQuery};
use crate::app_state::AppState;
use crate::domain::Money;
use crate::error::{ErrorResponse, ReconcilerError};

/// `GET /payouts` — List payouts of a period.
///
/// # Errors
///
/// Returns [`ReconcilerError::Unauthorized`] for a bad shared secret and
/// [`ReconcilerError::PersistenceError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/payouts",
    tag = "Payouts",
    summary = "List payouts of a period",
    params(PeriodQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Payouts of the period", body = PayoutListResponse),
        (status = 401, description = "Missing or incorrect shared secret", body = ErrorResponse),
    )
)]
pub async fn list_payouts(
    _auth: SchedulerAuth,
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<PayoutListResponse>, ReconcilerError> {
    let period = query.resolve()?;
    let data = state.payout_job.list_payouts(period).await?;
    let total_amount: Money = data.iter().map(|p| p.total_payout).sum();
    Ok(Json(PayoutListResponse {
        period,
        data,
        total_amount,
    }))
}

/// Payout routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/payouts", get(list_payouts))
}
