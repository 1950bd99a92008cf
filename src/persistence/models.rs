//! Database row shapes and their conversion into domain types.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{
    AccountId, Money, PaymentMethod, Payout, PayoutPeriod, PayoutStatus, RevenueEvent, RevenueKind,
};
use crate::error::ReconcilerError;

/// A row of the `revenue_events` table.
#[derive(Debug, Clone, FromRow)]
pub struct RevenueEventRow {
    /// Row ID.
    pub id: Uuid,
    /// Owning account.
    pub account_id: Uuid,
    /// Ledger date.
    pub occurred_on: NaiveDate,
    /// Base-currency amount in cents.
    pub amount_cents: i64,
    /// Source-currency amount in minor units.
    pub currency_amount_cents: Option<i64>,
}

impl RevenueEventRow {
    /// Converts the row into a domain event of the given kind.
    #[must_use]
    pub fn into_event(self, kind: RevenueKind) -> RevenueEvent {
        RevenueEvent {
            id: self.id,
            account_id: AccountId::from_uuid(self.account_id),
            occurred_on: self.occurred_on,
            amount: Money::from_cents(self.amount_cents),
            currency_amount: self.currency_amount_cents.map(Money::from_cents),
            kind,
        }
    }
}

/// A row of the `payment_methods` table.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentMethodRow {
    /// Row ID.
    pub id: Uuid,
    /// Owning account.
    pub account_id: Uuid,
    /// Default flag.
    pub is_default: bool,
}

impl From<PaymentMethodRow> for PaymentMethod {
    fn from(row: PaymentMethodRow) -> Self {
        Self {
            id: row.id,
            account_id: AccountId::from_uuid(row.account_id),
            is_default: row.is_default,
        }
    }
}

/// A row of the `payouts` table.
#[derive(Debug, Clone, FromRow)]
pub struct PayoutRow {
    /// Row ID.
    pub id: Uuid,
    /// Account being paid.
    pub account_id: Uuid,
    /// Period label (`YYYY-MM`).
    pub period: String,
    /// Gross reward in cents.
    pub gross_revenue_cents: i64,
    /// Reconciliation magnitude in cents.
    pub reconciliation_cents: i64,
    /// Net payout in cents.
    pub total_payout_cents: i64,
    /// Status discriminator.
    pub status: String,
    /// Disbursement method.
    pub payment_method_id: Option<Uuid>,
    /// Free-text note.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PayoutRow> for Payout {
    type Error = ReconcilerError;

    fn try_from(row: PayoutRow) -> Result<Self, Self::Error> {
        let period: PayoutPeriod = row
            .period
            .parse()
            .map_err(|e| ReconcilerError::PersistenceError(format!("payout {}: {e}", row.id)))?;
        let status: PayoutStatus = row
            .status
            .parse()
            .map_err(|e| ReconcilerError::PersistenceError(format!("payout {}: {e}", row.id)))?;
        Ok(Self {
            id: row.id,
            account_id: AccountId::from_uuid(row.account_id),
            period,
            gross_revenue: Money::from_cents(row.gross_revenue_cents),
            reconciliation: Money::from_cents(row.reconciliation_cents),
            total_payout: Money::from_cents(row.total_payout_cents),
            status,
            payment_method_id: row.payment_method_id,
            notes: row.notes.unwrap_or_default(),
            created_at: row.created_at,
        })
    }
}
