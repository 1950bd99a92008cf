//! Job trigger, preview, and payout listing DTOs.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Money, Payout, PayoutPeriod};
use crate::error::ReconcilerError;
use crate::service::{JobReport, PayoutLine};

/// Optional `?period=YYYY-MM` query parameter.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    /// Calendar month (`YYYY-MM`). Defaults to the previous month.
    #[serde(default)]
    pub period: Option<String>,
}

impl PeriodQuery {
    /// Resolves the requested period, defaulting to the month before today
    /// (UTC).
    ///
    /// # Errors
    ///
    /// Returns [`ReconcilerError::InvalidRequest`] if `period` is present
    /// but not a valid `YYYY-MM` label.
    pub fn resolve(&self) -> Result<PayoutPeriod, ReconcilerError> {
        match self.period.as_deref() {
            Some(raw) => raw
                .parse()
                .map_err(|e| ReconcilerError::InvalidRequest(format!("{e}"))),
            None => Ok(PayoutPeriod::previous_month(Utc::now().date_naive())),
        }
    }
}

/// Response for a run that considered at least one account.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRunResponse {
    /// Number of payouts created.
    pub processed_payouts: usize,
    /// Sum of the created payouts.
    pub total_amount: Money,
    /// Period label.
    #[schema(value_type = String, example = "2026-09")]
    pub period: PayoutPeriod,
    /// Created payouts.
    pub payouts: Vec<PayoutLine>,
    /// Accounts that cleared the threshold.
    pub accounts_considered: usize,
    /// Accounts skipped because a payout already existed.
    pub skipped_existing: usize,
    /// Accounts skipped because reconciliation left nothing to pay.
    pub skipped_non_positive: usize,
    /// Accounts whose processing failed.
    pub failed: usize,
}

impl From<JobReport> for PayoutRunResponse {
    fn from(report: JobReport) -> Self {
        Self {
            processed_payouts: report.processed(),
            total_amount: report.total_amount,
            period: report.period,
            accounts_considered: report.accounts_considered,
            skipped_existing: report.skipped_existing,
            skipped_non_positive: report.skipped_non_positive,
            failed: report.failed,
            payouts: report.payouts,
        }
    }
}

/// Response for a run that found no eligible accounts.
#[derive(Debug, Serialize, ToSchema)]
pub struct EmptyRunResponse {
    /// Always zero.
    pub processed: usize,
    /// Explanation.
    pub message: String,
    /// Period label.
    #[schema(value_type = String, example = "2026-09")]
    pub period: PayoutPeriod,
}

impl EmptyRunResponse {
    /// Builds the response for `period`.
    #[must_use]
    pub fn for_period(period: PayoutPeriod) -> Self {
        Self {
            processed: 0,
            message: format!("no accounts eligible for payout in {period}"),
            period,
        }
    }
}

/// Response for `GET /api/v1/payouts`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PayoutListResponse {
    /// Period label.
    #[schema(value_type = String, example = "2026-09")]
    pub period: PayoutPeriod,
    /// Payouts recorded for the period, ordered by account.
    pub data: Vec<Payout>,
    /// Sum of `total_payout` over `data`.
    pub total_amount: Money,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn explicit_period_is_parsed() {
        let query = PeriodQuery {
            period: Some("2026-03".to_string()),
        };
        let Ok(period) = query.resolve() else {
            panic!("valid period rejected");
        };
        assert_eq!(period.label(), "2026-03");
    }

    #[test]
    fn malformed_period_is_invalid_request() {
        let query = PeriodQuery {
            period: Some("March".to_string()),
        };
        assert!(matches!(
            query.resolve(),
            Err(ReconcilerError::InvalidRequest(_))
        ));
    }

    #[test]
    fn missing_period_defaults_to_previous_month() {
        let expected = PayoutPeriod::previous_month(Utc::now().date_naive());
        assert!(matches!(PeriodQuery::default().resolve(), Ok(p) if p == expected));
    }

    #[test]
    fn run_response_uses_camel_case_keys() {
        let Some(period) = PayoutPeriod::new(2026, 9) else {
            panic!("invalid period");
        };
        let body = PayoutRunResponse {
            processed_payouts: 0,
            total_amount: Money::ZERO,
            period,
            payouts: Vec::new(),
            accounts_considered: 0,
            skipped_existing: 0,
            skipped_non_positive: 0,
            failed: 0,
        };
        let Ok(json) = serde_json::to_value(&body) else {
            panic!("serialization failed");
        };
        assert!(json.get("processedPayouts").is_some());
        assert!(json.get("totalAmount").is_some());
        assert_eq!(json.get("period").and_then(|v| v.as_str()), Some("2026-09"));
    }
}
