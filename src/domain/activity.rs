//! Append-only audit trail entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Payout};

/// Audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    /// A payout row was created for an account.
    PayoutCreated,
    /// A monthly payout run finished.
    MonthlyPayoutsCompleted,
}

impl ActivityAction {
    /// Storage discriminator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PayoutCreated => "payout_created",
            Self::MonthlyPayoutsCompleted => "monthly_payouts_completed",
        }
    }
}

/// One audit log row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityLogEntry {
    /// Row ID.
    pub id: Uuid,
    /// Affected account; `None` for system-level entries.
    pub account_id: Option<AccountId>,
    /// What happened.
    pub action: ActivityAction,
    /// Structured details (amounts, counts).
    pub details: serde_json::Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ActivityLogEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(
        account_id: Option<AccountId>,
        action: ActivityAction,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            action,
            details,
            created_at: Utc::now(),
        }
    }

    /// Audit entry recorded alongside a newly created payout.
    #[must_use]
    pub fn payout_created(payout: &Payout) -> Self {
        Self::new(
            Some(payout.account_id),
            ActivityAction::PayoutCreated,
            serde_json::json!({
                "payout_id": payout.id,
                "period": payout.period,
                "gross_revenue": payout.gross_revenue,
                "reconciliation": payout.reconciliation,
                "total_payout": payout.total_payout,
                "payment_method_id": payout.payment_method_id,
                "needs_payment_method": payout.needs_payment_method(),
            }),
        )
    }
}
