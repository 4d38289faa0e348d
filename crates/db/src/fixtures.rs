use crate::connection::DbPool;
use crate::repositories::RepositoryError;
use sqlx::Executor;
use sqlx::Row;

const SEED_CUSTOMER_IDS: &[&str] = &["cust-acme", "cust-globex", "cust-initech"];
const SEED_ITEM_IDS: &[&str] = &["item-widget", "item-gadget", "item-gizmo"];
const SEED_INVOICE_COUNT: i64 = 10;
const SEED_PAYMENT_COUNT: i64 = 7;
const SEED_LINE_COUNT: i64 = 14;

/// Deterministic demo ledger covering the scoring and analytics pipelines:
/// a reliable payer, a chronically late payer, a customer with no history,
/// and items with steady, lumpy and stockless demand.
pub struct DemoLedgerDataset;

#[derive(Debug)]
pub struct SeedResult {
    pub customers: Vec<&'static str>,
    pub items: Vec<&'static str>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

impl DemoLedgerDataset {
    /// SQL fixture content for the demo ledger.
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_ledger.sql");

    /// Load the demo ledger into the database.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult { customers: SEED_CUSTOMER_IDS.to_vec(), items: SEED_ITEM_IDS.to_vec() })
    }

    /// Verify that the seed data exists and matches the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let customer_count = count_rows(
            pool,
            "SELECT COUNT(*) AS count FROM customer WHERE id IN ('cust-acme', 'cust-globex', 'cust-initech')",
        )
        .await?;
        checks.push(("customers", customer_count == SEED_CUSTOMER_IDS.len() as i64));

        let item_count = count_rows(
            pool,
            "SELECT COUNT(*) AS count FROM item WHERE id IN ('item-widget', 'item-gadget', 'item-gizmo')",
        )
        .await?;
        checks.push(("items", item_count == SEED_ITEM_IDS.len() as i64));

        let invoice_count =
            count_rows(pool, "SELECT COUNT(*) AS count FROM sales_invoice").await?;
        checks.push(("invoices", invoice_count == SEED_INVOICE_COUNT));

        let payment_count =
            count_rows(pool, "SELECT COUNT(*) AS count FROM payment_entry").await?;
        checks.push(("payments", payment_count == SEED_PAYMENT_COUNT));

        let line_count =
            count_rows(pool, "SELECT COUNT(*) AS count FROM sales_invoice_item").await?;
        checks.push(("invoice-lines", line_count == SEED_LINE_COUNT));

        let dead_rows = count_rows(
            pool,
            "SELECT COUNT(*) AS count FROM sales_invoice WHERE cancelled = 1 OR is_return = 1",
        )
        .await?;
        checks.push(("excluded-invoices", dead_rows == 2));

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }
}

async fn count_rows(pool: &DbPool, sql: &str) -> Result<i64, RepositoryError> {
    let row = sqlx::query(sql).fetch_one(pool).await?;
    Ok(row.get::<i64, _>("count"))
}

#[cfg(test)]
mod tests {
    use super::DemoLedgerDataset;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn demo_ledger_loads_and_verifies() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");

        let seeded = DemoLedgerDataset::load(&pool).await.expect("load demo ledger");
        assert_eq!(seeded.customers.len(), 3);

        let verification = DemoLedgerDataset::verify(&pool).await.expect("verify demo ledger");
        assert!(
            verification.all_present,
            "failed checks: {:?}",
            verification
                .checks
                .iter()
                .filter(|(_, passed)| !passed)
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
        );

        pool.close().await;
    }
}
