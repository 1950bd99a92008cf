//! Per-account aggregation of a period's ledger and the payout threshold.
//!
//! Aggregation is pure: it takes the reward and reconciliation rows read
//! for one period and produces one [`AccountEarningsSummary`] per account
//! that earned rewards. Summaries are rebuilt on every run and never stored.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use super::{AccountId, Money, RevenueEvent};

/// Reward and reconciliation totals of one account for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct AccountEarningsSummary {
    /// Account the totals belong to.
    pub account_id: AccountId,
    /// Sum of reward amounts.
    pub total_reward: Money,
    /// Sum of reconciliation magnitudes.
    pub total_reconciliation: Money,
    /// `total_reward - total_reconciliation`.
    pub net_payout: Money,
}

impl AccountEarningsSummary {
    fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            total_reward: Money::ZERO,
            total_reconciliation: Money::ZERO,
            net_payout: Money::ZERO,
        }
    }

    /// Returns `true` if gross rewards reach `threshold`.
    #[must_use]
    pub fn meets_threshold(&self, threshold: Money) -> bool {
        self.total_reward >= threshold
    }
}

/// Builds per-account summaries, ordered by account ID.
///
/// Reconciliation amounts are deductions and are normalized to their
/// magnitude before subtraction. Accounts that only appear in
/// `reconciliations` get no summary.
#[must_use]
pub fn aggregate(
    rewards: &[RevenueEvent],
    reconciliations: &[RevenueEvent],
) -> Vec<AccountEarningsSummary> {
    let mut by_account: BTreeMap<AccountId, AccountEarningsSummary> = BTreeMap::new();

    for event in rewards {
        let summary = by_account
            .entry(event.account_id)
            .or_insert_with(|| AccountEarningsSummary::new(event.account_id));
        summary.total_reward = summary.total_reward.saturating_add(event.amount);
    }

    for event in reconciliations {
        if let Some(summary) = by_account.get_mut(&event.account_id) {
            summary.total_reconciliation =
                summary.total_reconciliation.saturating_add(event.amount.abs());
        }
    }

    by_account
        .into_values()
        .map(|mut summary| {
            summary.net_payout = summary
                .total_reward
                .saturating_sub(summary.total_reconciliation);
            summary
        })
        .collect()
}

/// Keeps the summaries whose gross reward reaches `threshold`.
///
/// The threshold applies before reconciliation; a retained summary may
/// still have a non-positive `net_payout`.
#[must_use]
pub fn filter_eligible(
    summaries: Vec<AccountEarningsSummary>,
    threshold: Money,
) -> Vec<AccountEarningsSummary> {
    summaries
        .into_iter()
        .filter(|s| s.meets_threshold(threshold))
        .collect()
}
