//! Read endpoints over the derived tables.

use salescope_core::records::{ScoreAlert, TierBucket};
use salescope_db::repositories::{AlertRepository, ScoreRepository};

use crate::{Engine, EngineError};

impl Engine {
    /// Tier membership counts with mean average score, best tier first.
    pub async fn segment_distribution(&self) -> Result<Vec<TierBucket>, EngineError> {
        Ok(self.scores.tier_distribution().await?)
    }

    /// Recent alerts, newest first.
    pub async fn alerts(
        &self,
        limit: i64,
        unread_only: bool,
    ) -> Result<Vec<ScoreAlert>, EngineError> {
        Ok(self.alerts.list(limit, unread_only).await?)
    }

    /// Acknowledge one alert. Unknown ids surface as `NotFound`.
    pub async fn mark_alert_read(&self, alert_id: &str) -> Result<(), EngineError> {
        Ok(self.alerts.mark_read(alert_id).await?)
    }
}
