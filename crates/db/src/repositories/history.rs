use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use salescope_core::records::{CustomerId, HistorySnapshot};
use salescope_core::tiers::Tier;

use super::{HistoryRepository, RepositoryError};
use crate::DbPool;

pub struct SqlHistoryRepository {
    pool: DbPool,
}

impl SqlHistoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn snapshot_from_row(row: &SqliteRow) -> Result<HistorySnapshot, RepositoryError> {
        let snapshot_date_raw: String = row.try_get("snapshot_date")?;
        let tier_raw: String = row.try_get("tier")?;
        let created_at_raw: String = row.try_get("created_at")?;
        let recency: i64 = row.try_get("recency_score")?;
        let frequency: i64 = row.try_get("frequency_score")?;
        let monetary: i64 = row.try_get("monetary_score")?;

        Ok(HistorySnapshot {
            id: row.try_get("id")?,
            customer_id: CustomerId(row.try_get("customer_id")?),
            snapshot_date: parse_date(&snapshot_date_raw)?,
            recency_score: decode_score("recency_score", recency)?,
            frequency_score: decode_score("frequency_score", frequency)?,
            monetary_score: decode_score("monetary_score", monetary)?,
            payment_score: row.try_get("payment_score")?,
            average_score: row.try_get("average_score")?,
            tier: Tier::from_str(&tier_raw).map_err(RepositoryError::Decode)?,
            rfmp: row.try_get("rfmp")?,
            created_at: parse_timestamp(&created_at_raw)?,
        })
    }
}

#[async_trait]
impl HistoryRepository for SqlHistoryRepository {
    async fn insert_if_absent(
        &self,
        snapshot: &HistorySnapshot,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO score_history (
                id, customer_id, snapshot_date, recency_score, frequency_score,
                monetary_score, payment_score, average_score, tier, rfmp, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (customer_id, snapshot_date) DO NOTHING
            "#,
        )
        .bind(&snapshot.id)
        .bind(&snapshot.customer_id.0)
        .bind(snapshot.snapshot_date.to_string())
        .bind(i64::from(snapshot.recency_score))
        .bind(i64::from(snapshot.frequency_score))
        .bind(i64::from(snapshot.monetary_score))
        .bind(snapshot.payment_score)
        .bind(snapshot.average_score)
        .bind(snapshot.tier.label())
        .bind(&snapshot.rfmp)
        .bind(snapshot.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn trend(
        &self,
        customer_id: Option<&CustomerId>,
        from: NaiveDate,
    ) -> Result<Vec<HistorySnapshot>, RepositoryError> {
        const COLUMNS: &str = "id, customer_id, snapshot_date, recency_score, frequency_score,
             monetary_score, payment_score, average_score, tier, rfmp, created_at";

        let rows = match customer_id {
            Some(customer_id) => {
                sqlx::query(&format!(
                    "SELECT {COLUMNS} FROM score_history
                     WHERE snapshot_date >= ? AND customer_id = ?
                     ORDER BY snapshot_date ASC, customer_id ASC"
                ))
                .bind(from.to_string())
                .bind(&customer_id.0)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {COLUMNS} FROM score_history
                     WHERE snapshot_date >= ?
                     ORDER BY snapshot_date ASC, customer_id ASC"
                ))
                .bind(from.to_string())
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(Self::snapshot_from_row).collect()
    }
}

fn decode_score(field: &str, value: i64) -> Result<u8, RepositoryError> {
    u8::try_from(value)
        .map_err(|_| RepositoryError::Decode(format!("{field} `{value}` does not fit in u8")))
}

fn parse_date(value: &str) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|error| {
        RepositoryError::Decode(format!("invalid snapshot_date `{value}`: {error}"))
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid created_at `{value}`: {error}")))
}
