//! Revenue ledger rows produced by the analytics pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Money};

/// Kind of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueKind {
    /// Earned revenue credited to the account.
    Reward,
    /// Adjustment deducting previously credited revenue.
    Reconciliation,
}

impl RevenueKind {
    /// Storage discriminator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Reward => "reward",
            Self::Reconciliation => "reconciliation",
        }
    }
}

/// Moderation status of an account.
///
/// Only [`AccountStatus::Active`] accounts have their rewards read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Account in good standing.
    #[default]
    Active,
    /// Account banned by moderation.
    Banned,
    /// Account disabled by its owner or an operator.
    Disabled,
}

impl AccountStatus {
    /// Storage discriminator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Banned => "banned",
            Self::Disabled => "disabled",
        }
    }

    /// Returns `true` if the account's rewards may be paid out.
    #[must_use]
    pub const fn is_payable(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// An immutable, dated revenue ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueEvent {
    /// Ledger row ID.
    pub id: Uuid,
    /// Account the revenue belongs to.
    pub account_id: AccountId,
    /// Day the revenue was recorded.
    pub occurred_on: NaiveDate,
    /// Base-currency amount. Reconciliation rows are usually negative.
    pub amount: Money,
    /// Amount in the source currency, kept for audit only.
    pub currency_amount: Option<Money>,
    /// Reward or reconciliation.
    pub kind: RevenueKind,
}

impl RevenueEvent {
    /// Creates a reward row with a fresh ID.
    #[must_use]
    pub fn reward(account_id: AccountId, occurred_on: NaiveDate, amount: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            occurred_on,
            amount,
            currency_amount: None,
            kind: RevenueKind::Reward,
        }
    }

    /// Creates a reconciliation row with a fresh ID.
    #[must_use]
    pub fn reconciliation(account_id: AccountId, occurred_on: NaiveDate, amount: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            occurred_on,
            amount,
            currency_amount: None,
            kind: RevenueKind::Reconciliation,
        }
    }
}
