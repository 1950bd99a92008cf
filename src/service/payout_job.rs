//! Monthly payout job: fetch, aggregate, filter, then write per account.
//!
//! A run walks `Fetching → Aggregating → Filtering → Processing →
//! Summarizing → Done`. Only the ledger read can fail the run; everything
//! that goes wrong for a single account is logged, counted, and skipped.
//!
//! Per-account policy:
//!
//! | Situation                             | Outcome                                |
//! |---------------------------------------|----------------------------------------|
//! | gross reward below threshold          | filtered out before processing         |
//! | net payout ≤ 0                        | skipped, no row written                |
//! | no default payment method             | payout created with a null method      |
//! | payout exists for `(account, period)` | skipped, existing row untouched        |
//! | insert loses the uniqueness race      | skipped as existing                    |
//! | store error                           | counted as failed, batch continues     |

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::JobConfig;
use crate::domain::payout::SYSTEM_GENERATED_NOTE;
use crate::domain::{
    AccountEarningsSummary, AccountId, ActivityAction, ActivityLogEntry, Money, NewPayout, Payout,
    PayoutPeriod, aggregate, filter_eligible,
};
use crate::error::ReconcilerError;
use crate::persistence::{CreateOutcome, PayoutStore};

/// Stage of a job run, used as a structured logging field.
///
/// A run starts idle and has no work before `Fetching`, so no event is
/// logged for that state. During `Processing`, each account passes through
/// `Resolving`, `Checking`, then `Writing` or `Skipping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    /// Reading reward and reconciliation rows.
    Fetching,
    /// Summing per account.
    Aggregating,
    /// Applying the payout threshold.
    Filtering,
    /// Walking the eligible accounts.
    Processing,
    /// Looking up an account's default payment method.
    Resolving,
    /// Looking for an existing payout of the account and period.
    Checking,
    /// Inserting the payout and its audit entry.
    Writing,
    /// Leaving the account without a new payout.
    Skipping,
    /// Writing the run's audit entry.
    Summarizing,
    /// Run complete.
    Done,
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fetching => "fetching",
            Self::Aggregating => "aggregating",
            Self::Filtering => "filtering",
            Self::Processing => "processing",
            Self::Resolving => "resolving",
            Self::Checking => "checking",
            Self::Writing => "writing",
            Self::Skipping => "skipping",
            Self::Summarizing => "summarizing",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// A payout created during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PayoutLine {
    /// Account paid.
    pub account_id: AccountId,
    /// Net amount of the payout.
    pub amount: Money,
    /// ID of the created payout row.
    pub payout_id: Uuid,
    /// `true` when the account had no default payment method.
    pub needs_payment_method: bool,
}

impl From<&Payout> for PayoutLine {
    fn from(payout: &Payout) -> Self {
        Self {
            account_id: payout.account_id,
            amount: payout.total_payout,
            payout_id: payout.id,
            needs_payment_method: payout.needs_payment_method(),
        }
    }
}

/// Outcome of a complete run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
    /// Period the run covered.
    pub period: PayoutPeriod,
    /// Accounts with reward revenue in the period.
    pub accounts_aggregated: usize,
    /// Accounts that cleared the threshold.
    pub accounts_considered: usize,
    /// Payouts created by this run.
    pub payouts: Vec<PayoutLine>,
    /// Sum of `amount` over `payouts`.
    pub total_amount: Money,
    /// Accounts skipped because a payout already existed.
    pub skipped_existing: usize,
    /// Accounts skipped because reconciliation left nothing to pay.
    pub skipped_non_positive: usize,
    /// Accounts whose processing failed.
    pub failed: usize,
}

impl JobReport {
    fn new(period: PayoutPeriod, accounts_aggregated: usize, accounts_considered: usize) -> Self {
        Self {
            period,
            accounts_aggregated,
            accounts_considered,
            payouts: Vec::new(),
            total_amount: Money::ZERO,
            skipped_existing: 0,
            skipped_non_positive: 0,
            failed: 0,
        }
    }

    /// Number of payouts created.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.payouts.len()
    }

    fn record(&mut self, outcome: AccountOutcome) {
        match outcome {
            AccountOutcome::Created(line) => {
                self.total_amount = self.total_amount.saturating_add(line.amount);
                self.payouts.push(line);
            }
            AccountOutcome::AlreadyExists => self.skipped_existing += 1,
            AccountOutcome::NonPositive => self.skipped_non_positive += 1,
            AccountOutcome::Failed => self.failed += 1,
        }
    }

    fn audit_details(&self) -> serde_json::Value {
        serde_json::json!({
            "period": self.period,
            "accounts_aggregated": self.accounts_aggregated,
            "accounts_considered": self.accounts_considered,
            "payouts_created": self.processed(),
            "total_amount": self.total_amount,
            "skipped_existing": self.skipped_existing,
            "skipped_non_positive": self.skipped_non_positive,
            "failed": self.failed,
        })
    }
}

/// Read-only view of what a run would consider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewReport {
    /// Period previewed.
    #[schema(value_type = String, example = "2026-09")]
    pub period: PayoutPeriod,
    /// Threshold applied to gross reward.
    pub min_payout_threshold: Money,
    /// Accounts with reward revenue in the period.
    pub accounts_aggregated: usize,
    /// Summaries clearing the threshold, ordered by account.
    pub eligible: Vec<AccountEarningsSummary>,
    /// Sum of positive net payouts among `eligible`.
    pub projected_total: Money,
}

#[derive(Debug)]
enum AccountOutcome {
    Created(PayoutLine),
    AlreadyExists,
    NonPositive,
    Failed,
}

/// The monthly payout job.
///
/// Holds its store and [`JobConfig`]; each call to [`run`](Self::run) is
/// independent and safe to repeat for the same period.
#[derive(Debug, Clone)]
pub struct PayoutJob {
    store: Arc<dyn PayoutStore>,
    config: JobConfig,
}

impl PayoutJob {
    /// Creates a job over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn PayoutStore>, config: JobConfig) -> Self {
        Self { store, config }
    }

    /// Returns the job's configuration.
    #[must_use]
    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Runs the job for `period`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcilerError::LedgerRead`] if either ledger read fails.
    /// Nothing is written in that case. Per-account failures never surface
    /// here; they are counted in [`JobReport::failed`].
    pub async fn run(&self, period: PayoutPeriod) -> Result<JobReport, ReconcilerError> {
        tracing::info!(%period, "monthly payout run started");

        let (aggregated, eligible) = self.eligible_summaries(period).await?;

        tracing::debug!(phase = %JobPhase::Processing, %period, accounts = eligible.len());
        let mut report = JobReport::new(period, aggregated, eligible.len());
        for summary in &eligible {
            let outcome = self.process_account(period, summary).await;
            report.record(outcome);
        }

        tracing::debug!(phase = %JobPhase::Summarizing, %period);
        let entry = ActivityLogEntry::new(
            None,
            ActivityAction::MonthlyPayoutsCompleted,
            report.audit_details(),
        );
        if let Err(error) = self.store.append_activity(entry).await {
            tracing::error!(%period, %error, "failed to record run summary");
        }

        tracing::info!(
            phase = %JobPhase::Done,
            %period,
            considered = report.accounts_considered,
            created = report.processed(),
            total_amount = %report.total_amount,
            skipped_existing = report.skipped_existing,
            skipped_non_positive = report.skipped_non_positive,
            failed = report.failed,
            "monthly payout run finished"
        );
        Ok(report)
    }

    /// Computes what [`run`](Self::run) would consider, without writing.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcilerError::LedgerRead`] if either ledger read fails.
    pub async fn preview(&self, period: PayoutPeriod) -> Result<PreviewReport, ReconcilerError> {
        let (accounts_aggregated, eligible) = self.eligible_summaries(period).await?;
        let projected_total = eligible
            .iter()
            .map(|s| s.net_payout)
            .filter(|net| net.is_positive())
            .sum();
        Ok(PreviewReport {
            period,
            min_payout_threshold: self.config.min_payout_threshold,
            accounts_aggregated,
            eligible,
            projected_total,
        })
    }

    /// Lists the payouts recorded for `period`.
    ///
    /// # Errors
    ///
    /// Returns a [`ReconcilerError::PersistenceError`] on store failure.
    pub async fn list_payouts(&self, period: PayoutPeriod) -> Result<Vec<Payout>, ReconcilerError> {
        self.store.list_payouts(period).await
    }

    /// Fetches, aggregates, and filters the ledger of `period`. Returns the
    /// number of aggregated accounts and the eligible summaries.
    async fn eligible_summaries(
        &self,
        period: PayoutPeriod,
    ) -> Result<(usize, Vec<AccountEarningsSummary>), ReconcilerError> {
        let (start, end) = period.bounds();
        tracing::debug!(phase = %JobPhase::Fetching, %period, %start, %end);
        let rewards = self
            .store
            .fetch_reward_events(period)
            .await
            .map_err(|e| ReconcilerError::LedgerRead(e.to_string()))?;
        let reconciliations = self
            .store
            .fetch_reconciliation_events(period)
            .await
            .map_err(|e| ReconcilerError::LedgerRead(e.to_string()))?;

        tracing::debug!(
            phase = %JobPhase::Aggregating,
            %period,
            rewards = rewards.len(),
            reconciliations = reconciliations.len()
        );
        let summaries = aggregate(&rewards, &reconciliations);
        let aggregated = summaries.len();

        tracing::debug!(
            phase = %JobPhase::Filtering,
            %period,
            threshold = %self.config.min_payout_threshold
        );
        let eligible = filter_eligible(summaries, self.config.min_payout_threshold);
        Ok((aggregated, eligible))
    }

    async fn process_account(
        &self,
        period: PayoutPeriod,
        summary: &AccountEarningsSummary,
    ) -> AccountOutcome {
        let account_id = summary.account_id;

        if !summary.net_payout.is_positive() {
            tracing::info!(
                phase = %JobPhase::Skipping,
                %account_id,
                %period,
                total_reward = %summary.total_reward,
                total_reconciliation = %summary.total_reconciliation,
                "no payout after reconciliation"
            );
            return AccountOutcome::NonPositive;
        }

        tracing::debug!(phase = %JobPhase::Resolving, %account_id, %period);
        let payment_method_id = match self.store.find_default_payment_method(account_id).await {
            Ok(Some(method)) => Some(method.id),
            Ok(None) => {
                tracing::warn!(%account_id, %period, "no default payment method; payout needs one");
                None
            }
            Err(error) => {
                tracing::error!(%account_id, %period, %error, "payment method lookup failed");
                return AccountOutcome::Failed;
            }
        };

        tracing::debug!(phase = %JobPhase::Checking, %account_id, %period);
        match self.store.find_payout(account_id, period).await {
            Ok(Some(existing)) => {
                tracing::info!(
                    phase = %JobPhase::Skipping,
                    %account_id,
                    %period,
                    payout_id = %existing.id,
                    "payout already exists"
                );
                return AccountOutcome::AlreadyExists;
            }
            Ok(None) => {}
            Err(error) => {
                tracing::error!(%account_id, %period, %error, "duplicate check failed");
                return AccountOutcome::Failed;
            }
        }

        let new_payout = NewPayout {
            account_id,
            period,
            gross_revenue: summary.total_reward,
            reconciliation: summary.total_reconciliation,
            total_payout: summary.net_payout,
            payment_method_id,
            notes: SYSTEM_GENERATED_NOTE.to_string(),
        };

        tracing::debug!(phase = %JobPhase::Writing, %account_id, %period);
        match self.store.create_payout(new_payout).await {
            Ok(CreateOutcome::Created(payout)) => {
                tracing::info!(
                    %account_id,
                    %period,
                    payout_id = %payout.id,
                    amount = %payout.total_payout,
                    "payout created"
                );
                AccountOutcome::Created(PayoutLine::from(&payout))
            }
            Ok(CreateOutcome::AlreadyExists) => {
                tracing::info!(
                    phase = %JobPhase::Skipping,
                    %account_id,
                    %period,
                    "payout created concurrently"
                );
                AccountOutcome::AlreadyExists
            }
            Err(error) => {
                tracing::error!(%account_id, %period, %error, "payout write failed");
                AccountOutcome::Failed
            }
        }
    }
}
