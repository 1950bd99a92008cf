//! PostgreSQL implementation of the payout store.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::{PaymentMethodRow, PayoutRow, RevenueEventRow};
use super::{CreateOutcome, PayoutStore};
use crate::config::ReconcilerConfig;
use crate::domain::{
    AccountId, AccountStatus, ActivityLogEntry, NewPayout, PaymentMethod, Payout, PayoutPeriod,
    RevenueEvent, RevenueKind,
};
use crate::error::ReconcilerError;

const PAYOUT_COLUMNS: &str = "id, account_id, period, gross_revenue_cents, reconciliation_cents, \
     total_payout_cents, status, payment_method_id, notes, created_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
///
/// The ledger and the payout tables may live in different databases;
/// when both URLs are equal the two handles share one pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    ledger: PgPool,
    payouts: PgPool,
}

impl PostgresStore {
    /// Creates a store over existing connection pools.
    #[must_use]
    pub fn new(ledger: PgPool, payouts: PgPool) -> Self {
        Self { ledger, payouts }
    }

    /// Connects both pools and, if enabled, runs the payout migrations
    /// against the payout pool and the development ledger schema against the
    /// ledger pool.
    ///
    /// # Errors
    ///
    /// Returns a [`ReconcilerError::PersistenceError`] if a connection or
    /// migration fails.
    pub async fn connect(config: &ReconcilerConfig) -> Result<Self, ReconcilerError> {
        let options = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs));

        let ledger = options.clone().connect(&config.ledger_database_url).await?;
        let payouts = if config.payout_database_url == config.ledger_database_url {
            ledger.clone()
        } else {
            options.connect(&config.payout_database_url).await?
        };

        // Both sets may share one database and one `_sqlx_migrations` table,
        // so each ignores versions applied by the other.
        if config.run_ledger_migrations {
            tracing::info!("running development ledger migrations");
            let mut migrator = sqlx::migrate!("./migrations/ledger");
            migrator.set_ignore_missing(true);
            migrator
                .run(&ledger)
                .await
                .map_err(|e| ReconcilerError::PersistenceError(e.to_string()))?;
        }

        if config.run_migrations {
            tracing::info!("running payout store migrations");
            let mut migrator = sqlx::migrate!("./migrations/payouts");
            migrator.set_ignore_missing(true);
            migrator
                .run(&payouts)
                .await
                .map_err(|e| ReconcilerError::PersistenceError(e.to_string()))?;
        }

        tracing::info!("database pools ready");
        Ok(Self::new(ledger, payouts))
    }

    async fn fetch_events(
        &self,
        kind: RevenueKind,
        period: PayoutPeriod,
        payable_only: bool,
    ) -> Result<Vec<RevenueEvent>, ReconcilerError> {
        let (start, end) = period.bounds();
        let sql = if payable_only {
            "SELECT e.id, e.account_id, e.occurred_on, e.amount_cents, e.currency_amount_cents \
             FROM revenue_events e JOIN accounts a ON a.id = e.account_id \
             WHERE e.kind = $1 AND e.occurred_on >= $2 AND e.occurred_on < $3 AND a.status = $4 \
             ORDER BY e.account_id, e.occurred_on"
        } else {
            "SELECT e.id, e.account_id, e.occurred_on, e.amount_cents, e.currency_amount_cents \
             FROM revenue_events e \
             WHERE e.kind = $1 AND e.occurred_on >= $2 AND e.occurred_on < $3 \
             ORDER BY e.account_id, e.occurred_on"
        };

        let mut query = sqlx::query_as::<_, RevenueEventRow>(sql)
            .bind(kind.as_str())
            .bind(start)
            .bind(end);
        if payable_only {
            query = query.bind(AccountStatus::Active.as_str());
        }

        let rows = query.fetch_all(&self.ledger).await?;
        Ok(rows.into_iter().map(|r| r.into_event(kind)).collect())
    }
}

#[async_trait]
impl PayoutStore for PostgresStore {
    async fn fetch_reward_events(
        &self,
        period: PayoutPeriod,
    ) -> Result<Vec<RevenueEvent>, ReconcilerError> {
        self.fetch_events(RevenueKind::Reward, period, true).await
    }

    async fn fetch_reconciliation_events(
        &self,
        period: PayoutPeriod,
    ) -> Result<Vec<RevenueEvent>, ReconcilerError> {
        self.fetch_events(RevenueKind::Reconciliation, period, false)
            .await
    }

    async fn find_default_payment_method(
        &self,
        account_id: AccountId,
    ) -> Result<Option<PaymentMethod>, ReconcilerError> {
        let row = sqlx::query_as::<_, PaymentMethodRow>(
            "SELECT id, account_id, is_default FROM payment_methods \
             WHERE account_id = $1 AND is_default = TRUE LIMIT 1",
        )
        .bind(*account_id.as_uuid())
        .fetch_optional(&self.ledger)
        .await?;

        Ok(row.map(PaymentMethod::from))
    }

    async fn find_payout(
        &self,
        account_id: AccountId,
        period: PayoutPeriod,
    ) -> Result<Option<Payout>, ReconcilerError> {
        let row = sqlx::query_as::<_, PayoutRow>(&format!(
            "SELECT {PAYOUT_COLUMNS} FROM payouts WHERE account_id = $1 AND period = $2"
        ))
        .bind(*account_id.as_uuid())
        .bind(period.label())
        .fetch_optional(&self.payouts)
        .await?;

        row.map(Payout::try_from).transpose()
    }

    async fn create_payout(&self, payout: NewPayout) -> Result<CreateOutcome, ReconcilerError> {
        let payout = Payout::from_new(payout);
        let mut tx = self.payouts.begin().await?;

        // The unique (account_id, period) constraint decides the race;
        // a conflicting insert returns no row.
        let inserted = sqlx::query_scalar::<_, uuid::Uuid>(
            "INSERT INTO payouts (id, account_id, period, gross_revenue_cents, \
             reconciliation_cents, total_payout_cents, status, payment_method_id, notes, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (account_id, period) DO NOTHING RETURNING id",
        )
        .bind(payout.id)
        .bind(*payout.account_id.as_uuid())
        .bind(payout.period.label())
        .bind(payout.gross_revenue.cents())
        .bind(payout.reconciliation.cents())
        .bind(payout.total_payout.cents())
        .bind(payout.status.as_str())
        .bind(payout.payment_method_id)
        .bind(&payout.notes)
        .bind(payout.created_at)
        .fetch_optional(&mut *tx)
        .await?;

        if inserted.is_none() {
            tx.rollback().await?;
            return Ok(CreateOutcome::AlreadyExists);
        }

        insert_activity(&mut tx, &ActivityLogEntry::payout_created(&payout)).await?;
        tx.commit().await?;

        Ok(CreateOutcome::Created(payout))
    }

    async fn append_activity(&self, entry: ActivityLogEntry) -> Result<(), ReconcilerError> {
        let mut conn = self.payouts.acquire().await?;
        insert_activity(&mut conn, &entry).await
    }

    async fn list_payouts(&self, period: PayoutPeriod) -> Result<Vec<Payout>, ReconcilerError> {
        let rows = sqlx::query_as::<_, PayoutRow>(&format!(
            "SELECT {PAYOUT_COLUMNS} FROM payouts WHERE period = $1 ORDER BY account_id"
        ))
        .bind(period.label())
        .fetch_all(&self.payouts)
        .await?;

        rows.into_iter().map(Payout::try_from).collect()
    }
}

async fn insert_activity(
    conn: &mut sqlx::PgConnection,
    entry: &ActivityLogEntry,
) -> Result<(), ReconcilerError> {
    sqlx::query(
        "INSERT INTO activity_logs (id, account_id, action, details, created_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(entry.id)
    .bind(entry.account_id.map(uuid::Uuid::from))
    .bind(entry.action.as_str())
    .bind(&entry.details)
    .bind(entry.created_at)
    .execute(conn)
    .await?;
    Ok(())
}
