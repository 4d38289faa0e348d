use std::collections::BTreeMap;
use std::collections::HashSet;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sqlx::Row;

use salescope_core::analytics::ItemSales;
use salescope_core::payment::InvoiceTerms;
use salescope_core::records::CustomerId;

use super::{LedgerReader, RepositoryError};
use crate::DbPool;

/// One customer's identity and purchase aggregates for a scoring run.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomerPurchases {
    pub customer_id: CustomerId,
    pub name: String,
    pub credit_days: i64,
    pub last_purchase: Option<NaiveDate>,
    pub order_count: i64,
    pub total_spent: Decimal,
}

/// Read-only SQL view over the host application's ledger tables.
pub struct SqlLedgerReader {
    pool: DbPool,
}

impl SqlLedgerReader {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn parse_decimal(field: &str, value: &str) -> Result<Decimal, RepositoryError> {
        Decimal::from_str(value)
            .map_err(|error| RepositoryError::Decode(format!("invalid {field}: {error}")))
    }

    fn parse_date(field: &str, value: &str) -> Result<NaiveDate, RepositoryError> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|error| RepositoryError::Decode(format!("invalid {field} `{value}`: {error}")))
    }
}

#[async_trait]
impl LedgerReader for SqlLedgerReader {
    async fn customer_purchases(
        &self,
        period_start: NaiveDate,
    ) -> Result<Vec<CustomerPurchases>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT
                c.id AS customer_id,
                c.name AS customer_name,
                IFNULL(pt.credit_days, 0) AS credit_days,
                MAX(si.posting_date) AS last_purchase_date,
                COUNT(DISTINCT si.id) AS order_count,
                CAST(IFNULL(SUM(si.grand_total), 0) AS TEXT) AS total_spent_text
            FROM customer c
            LEFT JOIN payment_term pt ON pt.id = c.payment_term_id
            LEFT JOIN sales_invoice si
                ON si.customer_id = c.id
                AND si.submitted = 1
                AND si.cancelled = 0
                AND si.posting_date >= ?
            GROUP BY c.id, c.name
            ORDER BY c.id ASC
            "#,
        )
        .bind(period_start.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut customers = Vec::with_capacity(rows.len());
        for row in rows {
            let customer_id: String = row.try_get("customer_id")?;
            let name: String = row.try_get("customer_name")?;
            let credit_days: i64 = row.try_get("credit_days")?;
            let last_purchase_raw: Option<String> = row.try_get("last_purchase_date")?;
            let order_count: i64 = row.try_get("order_count")?;
            let total_spent_text: String = row.try_get("total_spent_text")?;

            let last_purchase = last_purchase_raw
                .map(|raw| Self::parse_date("last_purchase_date", &raw))
                .transpose()?;

            customers.push(CustomerPurchases {
                customer_id: CustomerId(customer_id),
                name,
                credit_days,
                last_purchase,
                order_count,
                total_spent: Self::parse_decimal("total_spent", &total_spent_text)?,
            });
        }

        Ok(customers)
    }

    async fn invoice_terms(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<InvoiceTerms>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT
                si.id AS invoice_id,
                si.posting_date,
                si.due_date,
                CAST(si.grand_total AS TEXT) AS grand_total_text,
                CAST(si.outstanding_amount AS TEXT) AS outstanding_text,
                (
                    SELECT MAX(pe.posting_date)
                    FROM payment_entry pe
                    WHERE pe.invoice_id = si.id AND pe.voided = 0
                ) AS settled_on
            FROM sales_invoice si
            WHERE si.customer_id = ?
                AND si.submitted = 1
                AND si.cancelled = 0
                AND si.is_return = 0
            ORDER BY si.posting_date ASC, si.id ASC
            "#,
        )
        .bind(&customer_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut invoices = Vec::with_capacity(rows.len());
        for row in rows {
            let invoice_id: String = row.try_get("invoice_id")?;
            let posting_raw: String = row.try_get("posting_date")?;
            let due_raw: Option<String> = row.try_get("due_date")?;
            let grand_total_text: String = row.try_get("grand_total_text")?;
            let outstanding_text: String = row.try_get("outstanding_text")?;
            let settled_raw: Option<String> = row.try_get("settled_on")?;

            invoices.push(InvoiceTerms {
                invoice_id,
                posting_date: Self::parse_date("posting_date", &posting_raw)?,
                due_date: due_raw.map(|raw| Self::parse_date("due_date", &raw)).transpose()?,
                grand_total: Self::parse_decimal("grand_total", &grand_total_text)?,
                outstanding: Self::parse_decimal("outstanding_amount", &outstanding_text)?,
                settled_on: settled_raw
                    .map(|raw| Self::parse_date("settled_on", &raw))
                    .transpose()?,
            });
        }

        Ok(invoices)
    }

    async fn item_sales(
        &self,
        window_start: NaiveDate,
        today: NaiveDate,
    ) -> Result<Vec<ItemSales>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT
                sii.item_id,
                sii.invoice_id,
                si.posting_date,
                sii.qty,
                CAST(sii.net_amount AS TEXT) AS net_amount_text,
                CAST(i.valuation_rate AS TEXT) AS valuation_rate_text,
                i.stock_qty
            FROM sales_invoice_item sii
            JOIN sales_invoice si ON si.id = sii.invoice_id
            JOIN item i ON i.id = sii.item_id
            WHERE si.submitted = 1
                AND si.cancelled = 0
                AND si.posting_date >= ?
            ORDER BY sii.item_id ASC, si.posting_date ASC
            "#,
        )
        .bind(window_start.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut accumulators: BTreeMap<String, SalesAccumulator> = BTreeMap::new();

        for row in rows {
            let item_id: String = row.try_get("item_id")?;
            let invoice_id: String = row.try_get("invoice_id")?;
            let posting_raw: String = row.try_get("posting_date")?;
            let qty: f64 = row.try_get("qty")?;
            let net_amount_text: String = row.try_get("net_amount_text")?;
            let valuation_rate_text: String = row.try_get("valuation_rate_text")?;
            let stock_qty: f64 = row.try_get("stock_qty")?;

            let posting_date = Self::parse_date("posting_date", &posting_raw)?;
            let net_amount = Self::parse_decimal("net_amount", &net_amount_text)?;
            let valuation_rate = Self::parse_decimal("valuation_rate", &valuation_rate_text)?;

            let entry = accumulators
                .entry(item_id)
                .or_insert_with(|| SalesAccumulator::new(valuation_rate, stock_qty));
            entry.add(posting_date, today, qty, net_amount);
            entry.invoices.insert(invoice_id);
        }

        Ok(accumulators.into_iter().map(|(item_id, acc)| acc.into_sales(item_id)).collect())
    }

    async fn invoice_baskets(&self) -> Result<Vec<Vec<String>>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT si.id AS invoice_id, sii.item_id
            FROM sales_invoice si
            JOIN sales_invoice_item sii ON sii.invoice_id = si.id
            WHERE si.submitted = 1 AND si.cancelled = 0
            ORDER BY si.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut baskets: Vec<Vec<String>> = Vec::new();
        let mut current_invoice: Option<String> = None;

        for row in rows {
            let invoice_id: String = row.try_get("invoice_id")?;
            let item_id: String = row.try_get("item_id")?;

            if current_invoice.as_deref() != Some(invoice_id.as_str()) {
                current_invoice = Some(invoice_id);
                baskets.push(Vec::new());
            }
            if let Some(basket) = baskets.last_mut() {
                basket.push(item_id);
            }
        }

        Ok(baskets)
    }
}

struct SalesAccumulator {
    revenue: Decimal,
    cogs: Decimal,
    quantity: f64,
    invoices: HashSet<String>,
    monthly: [f64; 12],
    valuation_rate: Decimal,
    stock_qty: f64,
}

impl SalesAccumulator {
    fn new(valuation_rate: Decimal, stock_qty: f64) -> Self {
        Self {
            revenue: Decimal::ZERO,
            cogs: Decimal::ZERO,
            quantity: 0.0,
            invoices: HashSet::new(),
            monthly: [0.0; 12],
            valuation_rate,
            stock_qty,
        }
    }

    fn add(&mut self, posting_date: NaiveDate, today: NaiveDate, qty: f64, net_amount: Decimal) {
        self.revenue += net_amount;
        self.cogs += self.valuation_rate * Decimal::from_f64(qty).unwrap_or_default();
        self.quantity += qty;

        let months_ago = (today.year() - posting_date.year()) * 12 + today.month() as i32
            - posting_date.month() as i32;
        if (0..12).contains(&months_ago) {
            self.monthly[months_ago as usize] += qty;
        }
    }

    fn into_sales(self, item_id: String) -> ItemSales {
        let inventory_value =
            self.valuation_rate * Decimal::from_f64(self.stock_qty).unwrap_or_default();
        ItemSales {
            item_id,
            revenue: self.revenue,
            cogs: self.cogs,
            quantity: self.quantity,
            invoice_count: self.invoices.len() as i64,
            monthly_quantities: self.monthly,
            inventory_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use salescope_core::records::CustomerId;

    use super::{LedgerReader, SqlLedgerReader};
    use crate::{connect_with_settings, migrations, DbPool};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    async fn insert_customer(pool: &DbPool, id: &str, terms: Option<&str>) {
        sqlx::query("INSERT INTO customer (id, name, payment_term_id) VALUES (?, ?, ?)")
            .bind(id)
            .bind(format!("{id} Inc"))
            .bind(terms)
            .execute(pool)
            .await
            .expect("insert customer");
    }

    async fn insert_terms(pool: &DbPool, id: &str, credit_days: i64) {
        sqlx::query("INSERT INTO payment_term (id, title, credit_days) VALUES (?, ?, ?)")
            .bind(id)
            .bind(id)
            .bind(credit_days)
            .execute(pool)
            .await
            .expect("insert payment term");
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_invoice(
        pool: &DbPool,
        id: &str,
        customer: &str,
        posting: &str,
        due: Option<&str>,
        grand_total: &str,
        outstanding: &str,
        flags: (i64, i64, i64),
    ) {
        sqlx::query(
            "INSERT INTO sales_invoice (
                id, customer_id, posting_date, due_date, grand_total, outstanding_amount,
                submitted, cancelled, is_return
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(customer)
        .bind(posting)
        .bind(due)
        .bind(grand_total)
        .bind(outstanding)
        .bind(flags.0)
        .bind(flags.1)
        .bind(flags.2)
        .execute(pool)
        .await
        .expect("insert invoice");
    }

    async fn insert_payment(pool: &DbPool, id: &str, invoice: &str, posting: &str, voided: i64) {
        sqlx::query(
            "INSERT INTO payment_entry (id, invoice_id, posting_date, amount, voided)
             VALUES (?, ?, ?, 0, ?)",
        )
        .bind(id)
        .bind(invoice)
        .bind(posting)
        .bind(voided)
        .execute(pool)
        .await
        .expect("insert payment");
    }

    async fn insert_item(pool: &DbPool, id: &str, valuation_rate: &str, stock_qty: f64) {
        sqlx::query("INSERT INTO item (id, name, valuation_rate, stock_qty) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(id)
            .bind(valuation_rate)
            .bind(stock_qty)
            .execute(pool)
            .await
            .expect("insert item");
    }

    async fn insert_line(
        pool: &DbPool,
        id: &str,
        invoice: &str,
        item: &str,
        qty: f64,
        net_amount: &str,
    ) {
        sqlx::query(
            "INSERT INTO sales_invoice_item (id, invoice_id, item_id, qty, net_amount)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(invoice)
        .bind(item)
        .bind(qty)
        .bind(net_amount)
        .execute(pool)
        .await
        .expect("insert line");
    }

    #[tokio::test]
    async fn purchase_aggregates_cover_only_window_and_live_invoices() {
        let pool = setup_pool().await;
        insert_terms(&pool, "net-30", 30).await;
        insert_customer(&pool, "CUST-1", Some("net-30")).await;
        insert_customer(&pool, "CUST-2", None).await;

        insert_invoice(&pool, "inv-1", "CUST-1", "2026-03-01", None, "100", "0", (1, 0, 0)).await;
        insert_invoice(&pool, "inv-2", "CUST-1", "2026-05-10", None, "250", "0", (1, 0, 0)).await;
        // Outside the window.
        insert_invoice(&pool, "inv-3", "CUST-1", "2024-01-01", None, "999", "0", (1, 0, 0)).await;
        // Cancelled and draft rows never count.
        insert_invoice(&pool, "inv-4", "CUST-1", "2026-05-20", None, "999", "0", (1, 1, 0)).await;
        insert_invoice(&pool, "inv-5", "CUST-1", "2026-05-21", None, "999", "0", (0, 0, 0)).await;

        let reader = SqlLedgerReader::new(pool.clone());
        let customers = reader.customer_purchases(date(2025, 6, 1)).await.expect("aggregates");

        assert_eq!(customers.len(), 2);
        let first = &customers[0];
        assert_eq!(first.customer_id, CustomerId("CUST-1".to_string()));
        assert_eq!(first.credit_days, 30);
        assert_eq!(first.last_purchase, Some(date(2026, 5, 10)));
        assert_eq!(first.order_count, 2);
        assert_eq!(first.total_spent, Decimal::new(350, 0));

        let second = &customers[1];
        assert_eq!(second.credit_days, 0);
        assert_eq!(second.last_purchase, None);
        assert_eq!(second.order_count, 0);
        assert_eq!(second.total_spent, Decimal::ZERO);

        pool.close().await;
    }

    #[tokio::test]
    async fn invoice_terms_resolve_latest_live_payment() {
        let pool = setup_pool().await;
        insert_customer(&pool, "CUST-1", None).await;
        insert_invoice(
            &pool,
            "inv-1",
            "CUST-1",
            "2026-01-01",
            Some("2026-02-01"),
            "500",
            "0",
            (1, 0, 0),
        )
        .await;
        insert_payment(&pool, "pay-1", "inv-1", "2026-01-20", 0).await;
        insert_payment(&pool, "pay-2", "inv-1", "2026-02-03", 0).await;
        // A later voided payment must not move the settlement date.
        insert_payment(&pool, "pay-3", "inv-1", "2026-03-15", 1).await;
        // Return invoices are excluded from payment scoring.
        insert_invoice(&pool, "inv-2", "CUST-1", "2026-01-05", None, "-100", "0", (1, 0, 1)).await;

        let reader = SqlLedgerReader::new(pool.clone());
        let invoices =
            reader.invoice_terms(&CustomerId("CUST-1".to_string())).await.expect("terms");

        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].invoice_id, "inv-1");
        assert_eq!(invoices[0].due_date, Some(date(2026, 2, 1)));
        assert_eq!(invoices[0].settled_on, Some(date(2026, 2, 3)));

        pool.close().await;
    }

    #[tokio::test]
    async fn item_sales_aggregate_revenue_quantity_and_monthly_buckets() {
        let pool = setup_pool().await;
        insert_customer(&pool, "CUST-1", None).await;
        insert_item(&pool, "widget", "10", 5.0).await;
        insert_invoice(&pool, "inv-1", "CUST-1", "2026-06-10", None, "0", "0", (1, 0, 0)).await;
        insert_invoice(&pool, "inv-2", "CUST-1", "2026-04-02", None, "0", "0", (1, 0, 0)).await;
        insert_line(&pool, "line-1", "inv-1", "widget", 3.0, "45").await;
        insert_line(&pool, "line-2", "inv-1", "widget", 1.0, "15").await;
        insert_line(&pool, "line-3", "inv-2", "widget", 2.0, "30").await;

        let reader = SqlLedgerReader::new(pool.clone());
        let sales =
            reader.item_sales(date(2025, 6, 15), date(2026, 6, 15)).await.expect("item sales");

        assert_eq!(sales.len(), 1);
        let widget = &sales[0];
        assert_eq!(widget.item_id, "widget");
        assert_eq!(widget.revenue, Decimal::new(90, 0));
        assert_eq!(widget.cogs, Decimal::new(60, 0)); // 6 units at valuation 10
        assert_eq!(widget.quantity, 6.0);
        assert_eq!(widget.invoice_count, 2);
        assert_eq!(widget.monthly_quantities[0], 4.0); // June
        assert_eq!(widget.monthly_quantities[2], 2.0); // April
        assert_eq!(widget.inventory_value, Decimal::new(50, 0));

        pool.close().await;
    }

    #[tokio::test]
    async fn invoice_baskets_group_items_per_invoice() {
        let pool = setup_pool().await;
        insert_customer(&pool, "CUST-1", None).await;
        insert_item(&pool, "a", "1", 0.0).await;
        insert_item(&pool, "b", "1", 0.0).await;
        insert_invoice(&pool, "inv-1", "CUST-1", "2026-06-01", None, "0", "0", (1, 0, 0)).await;
        insert_invoice(&pool, "inv-2", "CUST-1", "2026-06-02", None, "0", "0", (1, 0, 0)).await;
        insert_line(&pool, "line-1", "inv-1", "a", 1.0, "1").await;
        insert_line(&pool, "line-2", "inv-1", "b", 1.0, "1").await;
        insert_line(&pool, "line-3", "inv-2", "a", 1.0, "1").await;

        let reader = SqlLedgerReader::new(pool.clone());
        let baskets = reader.invoice_baskets().await.expect("baskets");

        assert_eq!(baskets.len(), 2);
        assert_eq!(baskets[0], vec!["a".to_string(), "b".to_string()]);
        assert_eq!(baskets[1], vec!["a".to_string()]);

        pool.close().await;
    }
}
