//! Payouts and the payment methods they are disbursed to.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{AccountId, Money, PayoutPeriod};

/// Note attached to every payout this job creates.
pub const SYSTEM_GENERATED_NOTE: &str = "Generated automatically by the monthly payout job";

/// Lifecycle status of a payout.
///
/// The job only ever creates [`PayoutStatus::Pending`] payouts; the later
/// transitions belong to the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    /// Awaiting operator approval.
    #[default]
    Pending,
    /// Approved for disbursement.
    Approved,
    /// Disbursed.
    Paid,
    /// Rejected by an operator.
    Rejected,
}

impl PayoutStatus {
    /// Storage discriminator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Paid => "paid",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unknown payout status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payout status: {0}")]
pub struct ParseStatusError(String);

impl FromStr for PayoutStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "paid" => Ok(Self::Paid),
            "rejected" => Ok(Self::Rejected),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A disbursement method registered by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Payment method ID.
    pub id: Uuid,
    /// Owning account.
    pub account_id: AccountId,
    /// At most one method per account carries this flag.
    pub is_default: bool,
}

/// Insert form of a payout, computed by the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayout {
    /// Account being paid.
    pub account_id: AccountId,
    /// Period the revenue was earned in.
    pub period: PayoutPeriod,
    /// Sum of reward revenue in the period.
    pub gross_revenue: Money,
    /// Magnitude of reconciliation deductions in the period.
    pub reconciliation: Money,
    /// `gross_revenue - reconciliation`; always positive for created payouts.
    pub total_payout: Money,
    /// Default payment method, if the account has one.
    pub payment_method_id: Option<Uuid>,
    /// Free-text note.
    pub notes: String,
}

/// A persisted payout row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Payout {
    /// Payout ID.
    pub id: Uuid,
    /// Account being paid.
    pub account_id: AccountId,
    /// Period label, unique per account.
    #[schema(value_type = String, example = "2026-09")]
    pub period: PayoutPeriod,
    /// Sum of reward revenue in the period.
    pub gross_revenue: Money,
    /// Magnitude of reconciliation deductions.
    pub reconciliation: Money,
    /// Net amount owed.
    pub total_payout: Money,
    /// Current status.
    pub status: PayoutStatus,
    /// Disbursement method; `None` until an operator resolves it.
    pub payment_method_id: Option<Uuid>,
    /// Free-text note.
    pub notes: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Payout {
    /// Materializes a pending payout from its insert form.
    #[must_use]
    pub fn from_new(new: NewPayout) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: new.account_id,
            period: new.period,
            gross_revenue: new.gross_revenue,
            reconciliation: new.reconciliation,
            total_payout: new.total_payout,
            status: PayoutStatus::Pending,
            payment_method_id: new.payment_method_id,
            notes: new.notes,
            created_at: Utc::now(),
        }
    }

    /// Returns `true` if an operator still has to attach a payment method.
    #[must_use]
    pub const fn needs_payment_method(&self) -> bool {
        self.payment_method_id.is_none()
    }
}
