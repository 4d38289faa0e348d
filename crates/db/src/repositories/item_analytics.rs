use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use salescope_core::analytics::{AbcClass, XyzClass};
use salescope_core::records::{ItemAnalyticsRecord, ItemId};

use super::{ItemAnalyticsRepository, RepositoryError};
use crate::DbPool;

pub struct SqlItemAnalyticsRepository {
    pool: DbPool,
}

impl SqlItemAnalyticsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemAnalyticsRepository for SqlItemAnalyticsRepository {
    async fn upsert(&self, record: &ItemAnalyticsRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO item_analytics (
                item_id, revenue, profit, quantity_sold, invoice_count, abc_class,
                xyz_class, coefficient_of_variation, turnover_ratio, gmroi, last_calculated
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (item_id) DO UPDATE SET
                revenue = excluded.revenue,
                profit = excluded.profit,
                quantity_sold = excluded.quantity_sold,
                invoice_count = excluded.invoice_count,
                abc_class = excluded.abc_class,
                xyz_class = excluded.xyz_class,
                coefficient_of_variation = excluded.coefficient_of_variation,
                turnover_ratio = excluded.turnover_ratio,
                gmroi = excluded.gmroi,
                last_calculated = excluded.last_calculated
            "#,
        )
        .bind(&record.item_id.0)
        .bind(record.revenue.to_string())
        .bind(record.profit.to_string())
        .bind(record.quantity_sold)
        .bind(record.invoice_count)
        .bind(record.abc_class.to_string())
        .bind(record.xyz_class.to_string())
        .bind(record.coefficient_of_variation)
        .bind(record.turnover_ratio)
        .bind(record.gmroi)
        .bind(record.last_calculated.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<ItemAnalyticsRecord>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT
                item_id,
                CAST(revenue AS TEXT) AS revenue_text,
                CAST(profit AS TEXT) AS profit_text,
                quantity_sold,
                invoice_count,
                abc_class,
                xyz_class,
                coefficient_of_variation,
                turnover_ratio,
                gmroi,
                last_calculated
            FROM item_analytics
            ORDER BY item_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let revenue_text: String = row.try_get("revenue_text")?;
            let profit_text: String = row.try_get("profit_text")?;
            let abc_raw: String = row.try_get("abc_class")?;
            let xyz_raw: String = row.try_get("xyz_class")?;
            let last_calculated_raw: String = row.try_get("last_calculated")?;

            records.push(ItemAnalyticsRecord {
                item_id: ItemId(row.try_get("item_id")?),
                revenue: parse_decimal("revenue", &revenue_text)?,
                profit: parse_decimal("profit", &profit_text)?,
                quantity_sold: row.try_get("quantity_sold")?,
                invoice_count: row.try_get("invoice_count")?,
                abc_class: AbcClass::from_str(&abc_raw).map_err(RepositoryError::Decode)?,
                xyz_class: XyzClass::from_str(&xyz_raw).map_err(RepositoryError::Decode)?,
                coefficient_of_variation: row.try_get("coefficient_of_variation")?,
                turnover_ratio: row.try_get("turnover_ratio")?,
                gmroi: row.try_get("gmroi")?,
                last_calculated: parse_timestamp(&last_calculated_raw)?,
            });
        }

        Ok(records)
    }
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value)
        .map_err(|error| RepositoryError::Decode(format!("invalid {field}: {error}")))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| {
            RepositoryError::Decode(format!("invalid last_calculated `{value}`: {error}"))
        })
}
