use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

use salescope_core::records::{CustomerId, CustomerScoreRecord, TierBucket};
use salescope_core::tiers::Tier;

use super::{RepositoryError, ScoreRepository};
use crate::DbPool;

pub struct SqlScoreRepository {
    pool: DbPool,
}

impl SqlScoreRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn record_from_row(row: &SqliteRow) -> Result<CustomerScoreRecord, RepositoryError> {
        let customer_id: String = row.try_get("customer_id")?;
        let recency_score: i64 = row.try_get("recency_score")?;
        let frequency_score: i64 = row.try_get("frequency_score")?;
        let monetary_score: i64 = row.try_get("monetary_score")?;
        let tier_raw: String = row.try_get("tier")?;
        let last_purchase_raw: Option<String> = row.try_get("last_purchase_date")?;
        let total_spent_text: String = row.try_get("total_spent_text")?;
        let changed_on_raw: Option<String> = row.try_get("average_changed_on")?;
        let last_calculated_raw: String = row.try_get("last_calculated")?;

        Ok(CustomerScoreRecord {
            customer_id: CustomerId(customer_id),
            recency_score: decode_score("recency_score", recency_score)?,
            frequency_score: decode_score("frequency_score", frequency_score)?,
            monetary_score: decode_score("monetary_score", monetary_score)?,
            payment_score: row.try_get("payment_score")?,
            total_score: row.try_get("total_score")?,
            average_score: row.try_get("average_score")?,
            tier: Tier::from_str(&tier_raw).map_err(RepositoryError::Decode)?,
            rfmp: row.try_get("rfmp")?,
            last_purchase_date: last_purchase_raw
                .map(|raw| parse_date("last_purchase_date", &raw))
                .transpose()?,
            days_since_purchase: row.try_get("days_since_purchase")?,
            total_orders: row.try_get("total_orders")?,
            total_spent: Decimal::from_str(&total_spent_text)
                .map_err(|error| RepositoryError::Decode(format!("invalid total_spent: {error}")))?,
            on_time_invoices: row.try_get("on_time_invoices")?,
            late_invoices: row.try_get("late_invoices")?,
            avg_days_late: row.try_get("avg_days_late")?,
            credit_days: row.try_get("credit_days")?,
            previous_average: row.try_get("previous_average")?,
            average_changed_on: changed_on_raw
                .map(|raw| parse_date("average_changed_on", &raw))
                .transpose()?,
            last_calculated: parse_timestamp("last_calculated", &last_calculated_raw)?,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    customer_id,
    recency_score,
    frequency_score,
    monetary_score,
    payment_score,
    total_score,
    average_score,
    tier,
    rfmp,
    last_purchase_date,
    days_since_purchase,
    total_orders,
    CAST(total_spent AS TEXT) AS total_spent_text,
    on_time_invoices,
    late_invoices,
    avg_days_late,
    credit_days,
    previous_average,
    average_changed_on,
    last_calculated
"#;

#[async_trait]
impl ScoreRepository for SqlScoreRepository {
    async fn get_or_create(
        &self,
        customer_id: &CustomerId,
    ) -> Result<(CustomerScoreRecord, bool), RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM customer_score WHERE customer_id = ?"
        ))
        .bind(&customer_id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok((Self::record_from_row(&row)?, true)),
            None => Ok((CustomerScoreRecord::empty(customer_id.clone()), false)),
        }
    }

    async fn upsert(&self, record: &CustomerScoreRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO customer_score (
                customer_id, recency_score, frequency_score, monetary_score, payment_score,
                total_score, average_score, tier, rfmp, last_purchase_date, days_since_purchase,
                total_orders, total_spent, on_time_invoices, late_invoices, avg_days_late,
                credit_days, previous_average, average_changed_on, last_calculated
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (customer_id) DO UPDATE SET
                recency_score = excluded.recency_score,
                frequency_score = excluded.frequency_score,
                monetary_score = excluded.monetary_score,
                payment_score = excluded.payment_score,
                total_score = excluded.total_score,
                average_score = excluded.average_score,
                tier = excluded.tier,
                rfmp = excluded.rfmp,
                last_purchase_date = excluded.last_purchase_date,
                days_since_purchase = excluded.days_since_purchase,
                total_orders = excluded.total_orders,
                total_spent = excluded.total_spent,
                on_time_invoices = excluded.on_time_invoices,
                late_invoices = excluded.late_invoices,
                avg_days_late = excluded.avg_days_late,
                credit_days = excluded.credit_days,
                previous_average = excluded.previous_average,
                average_changed_on = excluded.average_changed_on,
                last_calculated = excluded.last_calculated
            "#,
        )
        .bind(&record.customer_id.0)
        .bind(i64::from(record.recency_score))
        .bind(i64::from(record.frequency_score))
        .bind(i64::from(record.monetary_score))
        .bind(record.payment_score)
        .bind(record.total_score)
        .bind(record.average_score)
        .bind(record.tier.label())
        .bind(&record.rfmp)
        .bind(record.last_purchase_date.map(|date| date.to_string()))
        .bind(record.days_since_purchase)
        .bind(record.total_orders)
        .bind(record.total_spent.to_string())
        .bind(record.on_time_invoices)
        .bind(record.late_invoices)
        .bind(record.avg_days_late)
        .bind(record.credit_days)
        .bind(record.previous_average)
        .bind(record.average_changed_on.map(|date| date.to_string()))
        .bind(record.last_calculated.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<CustomerScoreRecord>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM customer_score ORDER BY customer_id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::record_from_row).collect()
    }

    async fn tier_distribution(&self) -> Result<Vec<TierBucket>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT tier, COUNT(*) AS count, AVG(average_score) AS avg_score
            FROM customer_score
            GROUP BY tier
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut buckets = Vec::with_capacity(rows.len());
        for row in rows {
            let tier_raw: String = row.try_get("tier")?;
            buckets.push(TierBucket {
                tier: Tier::from_str(&tier_raw).map_err(RepositoryError::Decode)?,
                count: row.try_get("count")?,
                avg_score: row.try_get("avg_score")?,
            });
        }

        // Band order, best first, for dashboard consumption.
        buckets.sort_by_key(|bucket| {
            Tier::ALL.iter().position(|tier| *tier == bucket.tier).unwrap_or(Tier::ALL.len())
        });
        Ok(buckets)
    }
}

fn decode_score(field: &str, value: i64) -> Result<u8, RepositoryError> {
    u8::try_from(value)
        .map_err(|_| RepositoryError::Decode(format!("{field} `{value}` does not fit in u8")))
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|error| RepositoryError::Decode(format!("invalid {field} `{value}`: {error}")))
}

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid {field} `{value}`: {error}")))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use salescope_core::records::{CustomerId, CustomerScoreRecord};
    use salescope_core::tiers::Tier;

    use super::{ScoreRepository, SqlScoreRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    async fn insert_customer(pool: &DbPool, id: &str) {
        sqlx::query("INSERT INTO customer (id, name) VALUES (?, ?)")
            .bind(id)
            .bind(format!("{id} Inc"))
            .execute(pool)
            .await
            .expect("insert customer");
    }

    fn sample_record(id: &str) -> CustomerScoreRecord {
        let mut record = CustomerScoreRecord::empty(CustomerId(id.to_string()));
        record.recency_score = 5;
        record.frequency_score = 4;
        record.monetary_score = 3;
        record.payment_score = 4.5;
        record.total_score = 16.5;
        record.average_score = 4.1;
        record.tier = Tier::Good;
        record.rfmp = "5-4-3-4.5".to_string();
        record.last_purchase_date = NaiveDate::from_ymd_opt(2026, 5, 20);
        record.days_since_purchase = Some(12);
        record.total_orders = 7;
        record.total_spent = Decimal::new(1234_50, 2);
        record.on_time_invoices = 5;
        record.late_invoices = 2;
        record.avg_days_late = 3.4;
        record.credit_days = 30;
        record.last_calculated = Utc::now();
        record
    }

    #[tokio::test]
    async fn get_or_create_reports_missing_record_as_blank() {
        let pool = setup_pool().await;
        insert_customer(&pool, "CUST-1").await;

        let repo = SqlScoreRepository::new(pool.clone());
        let (record, existed) =
            repo.get_or_create(&CustomerId("CUST-1".to_string())).await.expect("get_or_create");

        assert!(!existed);
        assert_eq!(record.average_score, 0.0);
        assert_eq!(record.previous_average, 0.0);

        pool.close().await;
    }

    #[tokio::test]
    async fn upsert_round_trips_every_field() {
        let pool = setup_pool().await;
        insert_customer(&pool, "CUST-1").await;

        let repo = SqlScoreRepository::new(pool.clone());
        let mut record = sample_record("CUST-1");
        record.previous_average = 3.6;
        record.average_changed_on = NaiveDate::from_ymd_opt(2026, 6, 1);
        repo.upsert(&record).await.expect("upsert");

        let (loaded, existed) =
            repo.get_or_create(&CustomerId("CUST-1".to_string())).await.expect("reload");

        assert!(existed);
        assert_eq!(loaded.recency_score, 5);
        assert_eq!(loaded.payment_score, 4.5);
        assert_eq!(loaded.tier, Tier::Good);
        assert_eq!(loaded.rfmp, "5-4-3-4.5");
        assert_eq!(loaded.total_spent, Decimal::new(1234_50, 2));
        assert_eq!(loaded.previous_average, 3.6);
        assert_eq!(loaded.average_changed_on, NaiveDate::from_ymd_opt(2026, 6, 1));
        assert_eq!(loaded.days_since_purchase, Some(12));

        pool.close().await;
    }

    #[tokio::test]
    async fn upsert_keeps_one_row_per_customer() {
        let pool = setup_pool().await;
        insert_customer(&pool, "CUST-1").await;

        let repo = SqlScoreRepository::new(pool.clone());
        repo.upsert(&sample_record("CUST-1")).await.expect("first upsert");

        let mut updated = sample_record("CUST-1");
        updated.average_score = 2.2;
        updated.tier = Tier::Fair;
        repo.upsert(&updated).await.expect("second upsert");

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM customer_score WHERE customer_id = 'CUST-1'")
                .fetch_one(&pool)
                .await
                .expect("count rows");
        assert_eq!(count, 1);

        let (loaded, _) =
            repo.get_or_create(&CustomerId("CUST-1".to_string())).await.expect("reload");
        assert_eq!(loaded.average_score, 2.2);
        assert_eq!(loaded.tier, Tier::Fair);

        pool.close().await;
    }

    #[tokio::test]
    async fn tier_distribution_groups_in_band_order() {
        let pool = setup_pool().await;
        for (id, average, tier) in [
            ("CUST-1", 4.2, Tier::Good),
            ("CUST-2", 4.6, Tier::Good),
            ("CUST-3", 1.5, Tier::Poor),
        ] {
            insert_customer(&pool, id).await;
            let mut record = sample_record(id);
            record.average_score = average;
            record.tier = tier;
            SqlScoreRepository::new(pool.clone()).upsert(&record).await.expect("upsert");
        }

        let repo = SqlScoreRepository::new(pool.clone());
        let buckets = repo.tier_distribution().await.expect("distribution");

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].tier, Tier::Good);
        assert_eq!(buckets[0].count, 2);
        assert!((buckets[0].avg_score - 4.4).abs() < 1e-9);
        assert_eq!(buckets[1].tier, Tier::Poor);
        assert_eq!(buckets[1].count, 1);

        pool.close().await;
    }
}
