use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use salescope_core::basket::BasketRule;
use salescope_core::records::{
    CustomerId, CustomerScoreRecord, HistorySnapshot, ItemAnalyticsRecord, ScoreAlert, TierBucket,
};
use salescope_core::{analytics::ItemSales, payment::InvoiceTerms};

pub mod alert;
pub mod basket;
pub mod history;
pub mod item_analytics;
pub mod ledger;
pub mod score;

pub use alert::SqlAlertRepository;
pub use basket::SqlBasketRuleRepository;
pub use history::SqlHistoryRepository;
pub use item_analytics::SqlItemAnalyticsRepository;
pub use ledger::{CustomerPurchases, SqlLedgerReader};
pub use score::SqlScoreRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("record not found: {0}")]
    NotFound(String),
}

/// Read-only queries against the host application's ledger tables.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Every customer, with purchase aggregates over invoices posted on or
    /// after `period_start`. Customers without invoices still appear.
    async fn customer_purchases(
        &self,
        period_start: NaiveDate,
    ) -> Result<Vec<CustomerPurchases>, RepositoryError>;

    /// All of one customer's submitted, non-cancelled, non-return invoices
    /// with their settlement data.
    async fn invoice_terms(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<InvoiceTerms>, RepositoryError>;

    /// Per-item sales aggregates over the window, monthly demand vector
    /// anchored at `today`'s calendar month.
    async fn item_sales(
        &self,
        window_start: NaiveDate,
        today: NaiveDate,
    ) -> Result<Vec<ItemSales>, RepositoryError>;

    /// Item-code lists per submitted invoice, for basket mining.
    async fn invoice_baskets(&self) -> Result<Vec<Vec<String>>, RepositoryError>;
}

#[async_trait]
pub trait ScoreRepository: Send + Sync {
    /// Load the customer's score row, or a blank one when none exists yet.
    /// The boolean reports whether a stored row was found.
    async fn get_or_create(
        &self,
        customer_id: &CustomerId,
    ) -> Result<(CustomerScoreRecord, bool), RepositoryError>;

    /// Upsert keyed by customer id; at most one row per customer.
    async fn upsert(&self, record: &CustomerScoreRecord) -> Result<(), RepositoryError>;

    async fn list_all(&self) -> Result<Vec<CustomerScoreRecord>, RepositoryError>;

    /// Tier membership counts with mean average score, best tier first.
    async fn tier_distribution(&self) -> Result<Vec<TierBucket>, RepositoryError>;
}

#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn insert(&self, alert: &ScoreAlert) -> Result<(), RepositoryError>;

    /// Newest first; `unread_only` hides acknowledged alerts.
    async fn list(&self, limit: i64, unread_only: bool)
        -> Result<Vec<ScoreAlert>, RepositoryError>;

    /// Flip the read flag. Errors with `NotFound` for an unknown id.
    async fn mark_read(&self, alert_id: &str) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Insert unless a snapshot for the (customer, day) pair already exists.
    /// Returns whether a row was written.
    async fn insert_if_absent(&self, snapshot: &HistorySnapshot)
        -> Result<bool, RepositoryError>;

    /// Snapshots on or after `from`, oldest first, optionally for one customer.
    async fn trend(
        &self,
        customer_id: Option<&CustomerId>,
        from: NaiveDate,
    ) -> Result<Vec<HistorySnapshot>, RepositoryError>;
}

#[async_trait]
pub trait ItemAnalyticsRepository: Send + Sync {
    /// Upsert keyed by item id, overwriting every computed column.
    async fn upsert(&self, record: &ItemAnalyticsRecord) -> Result<(), RepositoryError>;

    async fn list_all(&self) -> Result<Vec<ItemAnalyticsRecord>, RepositoryError>;
}

#[async_trait]
pub trait BasketRuleRepository: Send + Sync {
    /// Replace the whole rule table in one transaction so readers never see
    /// a partially rebuilt set. Returns the number of rules written.
    async fn replace_all(
        &self,
        rules: &[BasketRule],
        written_at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    async fn count(&self) -> Result<i64, RepositoryError>;
}
