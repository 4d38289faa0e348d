//! Customer scoring pipeline: ledger aggregates through the score mapper and
//! payment scorer into upserted score records, with change alerts.

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use salescope_core::payment::PaymentScorer;
use salescope_core::records::ScoreAlert;
use salescope_core::scoring::{detect_change, PurchaseAggregates, ScoreCard};
use salescope_core::thresholds::ThresholdLadders;
use salescope_db::repositories::{AlertRepository, LedgerReader, ScoreRepository};

use crate::{Engine, EngineError, ScoringRunSummary};

impl Engine {
    /// Score every customer as of `today`.
    ///
    /// Re-running after a mid-batch failure is safe for the score rows
    /// themselves (pure upserts) but can re-emit an alert for a customer
    /// whose previous-average bookkeeping was already rewritten before the
    /// failure; the caller owns any batch-level transaction.
    pub async fn calculate_scores(
        &self,
        today: NaiveDate,
    ) -> Result<ScoringRunSummary, EngineError> {
        let ladders = ThresholdLadders::resolve(&self.analysis.thresholds);
        let scorer = PaymentScorer::new(ladders.payment);
        let period_start = today - Duration::days(self.analysis.period_days);

        let customers = self.ledger.customer_purchases(period_start).await?;
        tracing::info!(
            event_name = "scoring.run.started",
            customers = customers.len(),
            period_start = %period_start,
            "customer scoring run started"
        );

        let mut summary = ScoringRunSummary::default();
        let now = Utc::now();

        for customer in customers {
            let invoices = self.ledger.invoice_terms(&customer.customer_id).await?;
            let profile = scorer.assess(&invoices, today, customer.credit_days);

            let purchases = PurchaseAggregates {
                last_purchase: customer.last_purchase,
                order_count: customer.order_count,
                total_spent: customer.total_spent,
            };
            let card = ScoreCard::build(&ladders, &purchases, &profile, today);

            let (mut record, _existed) = self.scores.get_or_create(&customer.customer_id).await?;
            let previous_average = record.average_score;
            let previous_tier = record.tier;
            record.apply(&card, &purchases, &profile, now);

            if let Some(change) =
                detect_change(previous_average, card.average, self.analysis.score_sensitivity)
            {
                record.previous_average = change.previous;
                record.average_changed_on = Some(today);

                if self.analysis.alert_on_downgrade {
                    self.alerts
                        .insert(&ScoreAlert {
                            id: format!("alert-{}", Uuid::new_v4()),
                            customer_id: customer.customer_id.clone(),
                            direction: change.direction,
                            previous_average: change.previous,
                            new_average: change.current,
                            previous_tier,
                            new_tier: card.tier,
                            created_at: now,
                            is_read: false,
                        })
                        .await?;
                    summary.alerts_created += 1;

                    tracing::debug!(
                        event_name = "scoring.alert.created",
                        customer_id = %customer.customer_id.0,
                        direction = %change.direction,
                        previous_average = change.previous,
                        new_average = change.current,
                        "score change alert created"
                    );
                }
            }

            self.scores.upsert(&record).await?;
            summary.processed += 1;
        }

        tracing::info!(
            event_name = "scoring.run.completed",
            processed = summary.processed,
            alerts_created = summary.alerts_created,
            "customer scoring run completed"
        );
        Ok(summary)
    }
}
