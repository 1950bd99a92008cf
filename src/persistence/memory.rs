//! In-memory payout store.
//!
//! [`InMemoryStore`] keeps the ledger, payment methods, payouts, and audit
//! log behind a single [`tokio::sync::RwLock`], so the payout
//! check-then-insert happens under one write guard and is atomic. Failure
//! switches let tests exercise the job's error paths.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CreateOutcome, PayoutStore};
use crate::domain::{
    AccountId, AccountStatus, ActivityLogEntry, NewPayout, PaymentMethod, Payout, PayoutPeriod,
    RevenueEvent, RevenueKind,
};
use crate::error::ReconcilerError;

#[derive(Debug, Default)]
struct State {
    statuses: HashMap<AccountId, AccountStatus>,
    events: Vec<RevenueEvent>,
    payment_methods: Vec<PaymentMethod>,
    payouts: BTreeMap<(PayoutPeriod, AccountId), Payout>,
    activity: Vec<ActivityLogEntry>,
}

#[derive(Debug, Default)]
struct Failures {
    ledger_reads: bool,
    method_lookups: HashSet<AccountId>,
    duplicate_checks: HashSet<AccountId>,
    payout_writes: HashSet<AccountId>,
    activity_appends: bool,
}

/// Store that lives entirely in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    failures: RwLock<Failures>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the moderation status of an account. Accounts default to active.
    pub async fn set_account_status(&self, account_id: AccountId, status: AccountStatus) {
        self.state.write().await.statuses.insert(account_id, status);
    }

    /// Appends ledger rows.
    pub async fn add_events(&self, events: impl IntoIterator<Item = RevenueEvent>) {
        self.state.write().await.events.extend(events);
    }

    /// Registers a payment method.
    pub async fn add_payment_method(&self, method: PaymentMethod) {
        self.state.write().await.payment_methods.push(method);
    }

    /// Returns a copy of the audit log in insertion order.
    pub async fn activity_log(&self) -> Vec<ActivityLogEntry> {
        self.state.read().await.activity.clone()
    }

    /// Makes every ledger read fail.
    pub async fn set_fail_ledger_reads(&self, fail: bool) {
        self.failures.write().await.ledger_reads = fail;
    }

    /// Makes payment method lookups for `account_id` fail.
    pub async fn fail_method_lookup_for(&self, account_id: AccountId) {
        self.failures
            .write()
            .await
            .method_lookups
            .insert(account_id);
    }

    /// Makes existing-payout lookups for `account_id` fail.
    pub async fn fail_duplicate_check_for(&self, account_id: AccountId) {
        self.failures
            .write()
            .await
            .duplicate_checks
            .insert(account_id);
    }

    /// Makes standalone audit appends fail.
    pub async fn set_fail_activity_append(&self, fail: bool) {
        self.failures.write().await.activity_appends = fail;
    }

    /// Makes payout writes for `account_id` fail.
    pub async fn fail_payout_write_for(&self, account_id: AccountId) {
        self.failures.write().await.payout_writes.insert(account_id);
    }

    async fn events_of(
        &self,
        kind: RevenueKind,
        period: PayoutPeriod,
        payable_only: bool,
    ) -> Result<Vec<RevenueEvent>, ReconcilerError> {
        if self.failures.read().await.ledger_reads {
            return Err(ReconcilerError::PersistenceError(
                "ledger unavailable".to_string(),
            ));
        }
        let state = self.state.read().await;
        Ok(state
            .events
            .iter()
            .filter(|e| e.kind == kind && period.contains(e.occurred_on))
            .filter(|e| {
                !payable_only
                    || state
                        .statuses
                        .get(&e.account_id)
                        .copied()
                        .unwrap_or_default()
                        .is_payable()
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PayoutStore for InMemoryStore {
    async fn fetch_reward_events(
        &self,
        period: PayoutPeriod,
    ) -> Result<Vec<RevenueEvent>, ReconcilerError> {
        self.events_of(RevenueKind::Reward, period, true).await
    }

    async fn fetch_reconciliation_events(
        &self,
        period: PayoutPeriod,
    ) -> Result<Vec<RevenueEvent>, ReconcilerError> {
        self.events_of(RevenueKind::Reconciliation, period, false)
            .await
    }

    async fn find_default_payment_method(
        &self,
        account_id: AccountId,
    ) -> Result<Option<PaymentMethod>, ReconcilerError> {
        if self.failures.read().await.method_lookups.contains(&account_id) {
            return Err(ReconcilerError::PersistenceError(format!(
                "payment method lookup failed for {account_id}"
            )));
        }
        let state = self.state.read().await;
        Ok(state
            .payment_methods
            .iter()
            .find(|m| m.account_id == account_id && m.is_default)
            .cloned())
    }

    async fn find_payout(
        &self,
        account_id: AccountId,
        period: PayoutPeriod,
    ) -> Result<Option<Payout>, ReconcilerError> {
        if self
            .failures
            .read()
            .await
            .duplicate_checks
            .contains(&account_id)
        {
            return Err(ReconcilerError::PersistenceError(format!(
                "payout lookup failed for {account_id}"
            )));
        }
        let state = self.state.read().await;
        Ok(state.payouts.get(&(period, account_id)).cloned())
    }

    async fn create_payout(&self, payout: NewPayout) -> Result<CreateOutcome, ReconcilerError> {
        if self
            .failures
            .read()
            .await
            .payout_writes
            .contains(&payout.account_id)
        {
            return Err(ReconcilerError::PersistenceError(format!(
                "payout write failed for {}",
                payout.account_id
            )));
        }

        let mut state = self.state.write().await;
        let key = (payout.period, payout.account_id);
        if state.payouts.contains_key(&key) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        let payout = Payout::from_new(payout);
        state
            .activity
            .push(ActivityLogEntry::payout_created(&payout));
        state.payouts.insert(key, payout.clone());
        Ok(CreateOutcome::Created(payout))
    }

    async fn append_activity(&self, entry: ActivityLogEntry) -> Result<(), ReconcilerError> {
        if self.failures.read().await.activity_appends {
            return Err(ReconcilerError::PersistenceError(
                "activity log unavailable".to_string(),
            ));
        }
        self.state.write().await.activity.push(entry);
        Ok(())
    }

    async fn list_payouts(&self, period: PayoutPeriod) -> Result<Vec<Payout>, ReconcilerError> {
        let state = self.state.read().await;
        Ok(state
            .payouts
            .range((period, AccountId::from_uuid(uuid::Uuid::nil()))..)
            .take_while(|((p, _), _)| *p == period)
            .map(|(_, payout)| payout.clone())
            .collect())
    }
}
