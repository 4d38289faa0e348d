//! Product analytics pipeline plus the market-basket analyzer. The two are
//! independent of customer scoring and always run together.

use chrono::{Months, NaiveDate, Utc};

use salescope_core::analytics::profile_items;
use salescope_core::basket::mine_rules;
use salescope_core::records::ItemAnalyticsRecord;
use salescope_db::repositories::{BasketRuleRepository, ItemAnalyticsRepository, LedgerReader};

use crate::{AnalyticsRunSummary, Engine, EngineError};

impl Engine {
    /// Recompute item analytics over the trailing twelve months and rebuild
    /// the basket-rule table. Item rows are fully overwritten; there is no
    /// change detection for products.
    pub async fn calculate_product_analytics(
        &self,
        today: NaiveDate,
    ) -> Result<AnalyticsRunSummary, EngineError> {
        let window_start =
            today.checked_sub_months(Months::new(12)).unwrap_or(NaiveDate::MIN);

        let sales = self.ledger.item_sales(window_start, today).await?;
        tracing::info!(
            event_name = "analytics.run.started",
            items = sales.len(),
            window_start = %window_start,
            "product analytics run started"
        );

        let now = Utc::now();
        let mut summary = AnalyticsRunSummary::default();

        for profile in profile_items(sales) {
            self.items.upsert(&ItemAnalyticsRecord::from_profile(profile, now)).await?;
            summary.processed += 1;
        }

        let baskets = self.ledger.invoice_baskets().await?;
        let rules = mine_rules(&baskets);
        summary.rules_written = self.baskets.replace_all(&rules, now).await?;

        tracing::info!(
            event_name = "analytics.run.completed",
            processed = summary.processed,
            rules_written = summary.rules_written,
            "product analytics run completed"
        );
        Ok(summary)
    }
}
