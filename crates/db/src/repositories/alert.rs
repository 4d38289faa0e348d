use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use salescope_core::records::{CustomerId, ScoreAlert};
use salescope_core::scoring::AlertDirection;
use salescope_core::tiers::Tier;

use super::{AlertRepository, RepositoryError};
use crate::DbPool;

pub struct SqlAlertRepository {
    pool: DbPool,
}

impl SqlAlertRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertRepository for SqlAlertRepository {
    async fn insert(&self, alert: &ScoreAlert) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO score_alert (
                id, customer_id, direction, previous_average, new_average,
                previous_tier, new_tier, created_at, is_read
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&alert.id)
        .bind(&alert.customer_id.0)
        .bind(alert.direction.to_string())
        .bind(alert.previous_average)
        .bind(alert.new_average)
        .bind(alert.previous_tier.label())
        .bind(alert.new_tier.label())
        .bind(alert.created_at.to_rfc3339())
        .bind(i64::from(alert.is_read))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(
        &self,
        limit: i64,
        unread_only: bool,
    ) -> Result<Vec<ScoreAlert>, RepositoryError> {
        let sql = if unread_only {
            "SELECT id, customer_id, direction, previous_average, new_average,
                    previous_tier, new_tier, created_at, is_read
             FROM score_alert
             WHERE is_read = 0
             ORDER BY created_at DESC, id DESC
             LIMIT ?"
        } else {
            "SELECT id, customer_id, direction, previous_average, new_average,
                    previous_tier, new_tier, created_at, is_read
             FROM score_alert
             ORDER BY created_at DESC, id DESC
             LIMIT ?"
        };

        let rows = sqlx::query(sql).bind(limit).fetch_all(&self.pool).await?;

        let mut alerts = Vec::with_capacity(rows.len());
        for row in rows {
            let direction_raw: String = row.try_get("direction")?;
            let previous_tier_raw: String = row.try_get("previous_tier")?;
            let new_tier_raw: String = row.try_get("new_tier")?;
            let created_at_raw: String = row.try_get("created_at")?;
            let is_read: i64 = row.try_get("is_read")?;

            alerts.push(ScoreAlert {
                id: row.try_get("id")?,
                customer_id: CustomerId(row.try_get("customer_id")?),
                direction: AlertDirection::from_str(&direction_raw)
                    .map_err(RepositoryError::Decode)?,
                previous_average: row.try_get("previous_average")?,
                new_average: row.try_get("new_average")?,
                previous_tier: Tier::from_str(&previous_tier_raw)
                    .map_err(RepositoryError::Decode)?,
                new_tier: Tier::from_str(&new_tier_raw).map_err(RepositoryError::Decode)?,
                created_at: parse_timestamp(&created_at_raw)?,
                is_read: is_read != 0,
            });
        }

        Ok(alerts)
    }

    async fn mark_read(&self, alert_id: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE score_alert SET is_read = 1 WHERE id = ?")
            .bind(alert_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("score_alert `{alert_id}`")));
        }
        Ok(())
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid created_at `{value}`: {error}")))
}
