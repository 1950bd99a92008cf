//! Persistence layer: revenue ledger reads and the payout store.
//!
//! [`PayoutStore`] is the seam between the payout job and storage. The
//! production implementation is [`postgres::PostgresStore`]; tests and
//! local dry runs use [`memory::InMemoryStore`].

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;

use crate::domain::{
    AccountId, ActivityLogEntry, NewPayout, PaymentMethod, Payout, PayoutPeriod, RevenueEvent,
};
use crate::error::ReconcilerError;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Result of an atomic payout insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The payout and its audit entry were written.
    Created(Payout),
    /// A payout for the same `(account_id, period)` already exists.
    AlreadyExists,
}

/// Storage operations needed by the payout job.
///
/// Ledger reads are read-only. Payout creation must be atomic with respect
/// to the `(account_id, period)` uniqueness invariant: two concurrent
/// inserts for the same key yield one `Created` and one `AlreadyExists`.
#[async_trait]
pub trait PayoutStore: Send + Sync + std::fmt::Debug {
    /// Reads reward rows in `period` for accounts whose status is payable.
    async fn fetch_reward_events(
        &self,
        period: PayoutPeriod,
    ) -> Result<Vec<RevenueEvent>, ReconcilerError>;

    /// Reads reconciliation rows in `period`, regardless of account status.
    async fn fetch_reconciliation_events(
        &self,
        period: PayoutPeriod,
    ) -> Result<Vec<RevenueEvent>, ReconcilerError>;

    /// Returns the account's default payment method, if any.
    async fn find_default_payment_method(
        &self,
        account_id: AccountId,
    ) -> Result<Option<PaymentMethod>, ReconcilerError>;

    /// Returns the payout already recorded for `(account_id, period)`.
    async fn find_payout(
        &self,
        account_id: AccountId,
        period: PayoutPeriod,
    ) -> Result<Option<Payout>, ReconcilerError>;

    /// Inserts a pending payout and its `payout_created` audit entry in one
    /// unit of work.
    async fn create_payout(&self, payout: NewPayout) -> Result<CreateOutcome, ReconcilerError>;

    /// Appends an audit entry.
    async fn append_activity(&self, entry: ActivityLogEntry) -> Result<(), ReconcilerError>;

    /// Lists payouts recorded for `period`, ordered by account.
    async fn list_payouts(&self, period: PayoutPeriod) -> Result<Vec<Payout>, ReconcilerError>;
}
