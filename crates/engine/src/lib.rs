//! Pipeline orchestration over the ledger reader and the derived-record
//! repositories. Each entry point is a synchronous batch: it either completes
//! or aborts on the first repository error, leaving earlier writes committed.

mod analytics;
mod reports;
mod scoring;
mod snapshots;

use serde::Serialize;
use thiserror::Error;

use salescope_core::config::{AnalysisConfig, AppConfig};
use salescope_db::repositories::{
    SqlAlertRepository, SqlBasketRuleRepository, SqlHistoryRepository, SqlItemAnalyticsRepository,
    SqlLedgerReader, SqlScoreRepository,
};
use salescope_db::{connect_with_settings, migrations, repositories::RepositoryError, DbPool};

pub use salescope_core::records::{HistorySnapshot, ScoreAlert, TierBucket};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("database connection failed: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScoringRunSummary {
    pub processed: u64,
    pub alerts_created: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnalyticsRunSummary {
    pub processed: u64,
    pub rules_written: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotRunSummary {
    pub snapshots_created: u64,
}

/// The composition root: analysis settings plus the repositories every
/// pipeline works through.
pub struct Engine {
    pool: DbPool,
    analysis: AnalysisConfig,
    ledger: SqlLedgerReader,
    scores: SqlScoreRepository,
    alerts: SqlAlertRepository,
    history: SqlHistoryRepository,
    items: SqlItemAnalyticsRepository,
    baskets: SqlBasketRuleRepository,
}

impl Engine {
    pub fn new(pool: DbPool, analysis: AnalysisConfig) -> Self {
        Self {
            ledger: SqlLedgerReader::new(pool.clone()),
            scores: SqlScoreRepository::new(pool.clone()),
            alerts: SqlAlertRepository::new(pool.clone()),
            history: SqlHistoryRepository::new(pool.clone()),
            items: SqlItemAnalyticsRepository::new(pool.clone()),
            baskets: SqlBasketRuleRepository::new(pool.clone()),
            pool,
            analysis,
        }
    }

    /// Connect, migrate and wire an engine from loaded configuration.
    pub async fn bootstrap(config: &AppConfig) -> Result<Self, EngineError> {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(EngineError::Connect)?;

        migrations::run_pending(&pool).await.map_err(EngineError::Migration)?;

        tracing::info!(
            event_name = "engine.bootstrap.completed",
            database_url = %config.database.url,
            "engine connected and migrations applied"
        );

        Ok(Self::new(pool, config.analysis.clone()))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
