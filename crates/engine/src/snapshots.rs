//! Daily history snapshots and the trend read path.

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use salescope_core::records::{CustomerId, HistorySnapshot};
use salescope_db::repositories::{HistoryRepository, ScoreRepository};

use crate::{Engine, EngineError, SnapshotRunSummary};

impl Engine {
    /// Copy every current score record into today's immutable snapshot.
    /// At most one snapshot exists per customer per calendar day, so a
    /// same-day re-run reports zero new snapshots.
    pub async fn create_history_snapshot(
        &self,
        today: NaiveDate,
    ) -> Result<SnapshotRunSummary, EngineError> {
        let records = self.scores.list_all().await?;

        let mut summary = SnapshotRunSummary::default();
        for record in &records {
            let snapshot =
                HistorySnapshot::of(record, today, format!("hist-{}", Uuid::new_v4()));
            if self.history.insert_if_absent(&snapshot).await? {
                summary.snapshots_created += 1;
            }
        }

        tracing::info!(
            event_name = "snapshots.run.completed",
            scanned = records.len(),
            snapshots_created = summary.snapshots_created,
            snapshot_date = %today,
            "history snapshot run completed"
        );
        Ok(summary)
    }

    /// Snapshots within the trailing `days` window, oldest first, optionally
    /// for a single customer.
    pub async fn trend_data(
        &self,
        customer_id: Option<&CustomerId>,
        days: i64,
        today: NaiveDate,
    ) -> Result<Vec<HistorySnapshot>, EngineError> {
        let from = today - Duration::days(days);
        Ok(self.history.trend(customer_id, from).await?)
    }
}
