//! Per-invoice payment-lateness scoring.
//!
//! Each mature invoice contributes one 1..=5 score derived from how late it
//! was (or currently is) against its due date; the customer's payment score is
//! the mean of those per-invoice scores. Customers with nothing scoreable get
//! the benefit of the doubt: a flat 5.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::thresholds::ThresholdLadder;

/// Settlement tolerance: an invoice is considered fully paid once its
/// outstanding amount is within this absolute band of zero.
const SETTLED_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 1); // 0.1

/// Payment-relevant view of one invoice, as read from the ledger. Cancelled
/// and return invoices are filtered out before they reach the scorer.
#[derive(Clone, Debug, PartialEq)]
pub struct InvoiceTerms {
    pub invoice_id: String,
    pub posting_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub grand_total: Decimal,
    pub outstanding: Decimal,
    /// Posting date of the latest non-void payment linked to the invoice,
    /// when any payment exists.
    pub settled_on: Option<NaiveDate>,
}

/// Aggregated payment behaviour for one customer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaymentProfile {
    /// Mean per-invoice score, one decimal. 5.0 when nothing was scoreable.
    pub score: f64,
    /// Invoices settled (or judged) at zero or negative days late.
    pub on_time: i64,
    /// Invoices settled (or judged) past their due date.
    pub late: i64,
    /// Mean days late across scored invoices, one decimal. 0 when none.
    pub avg_days_late: f64,
    /// Credit days resolved from the customer's payment terms.
    pub credit_days: i64,
}

/// Stateless scorer over a payment-lateness ladder (lower is better).
#[derive(Clone, Copy, Debug)]
pub struct PaymentScorer {
    ladder: ThresholdLadder,
}

impl PaymentScorer {
    pub fn new(ladder: ThresholdLadder) -> Self {
        Self { ladder }
    }

    /// Score a customer's invoices as of `today`.
    ///
    /// Per invoice:
    /// - due date is the explicit one, else posting date plus `credit_days`;
    /// - a settled invoice is judged on its effective settlement date (latest
    ///   payment posting date, falling back to the invoice's own posting date
    ///   when no payment row exists);
    /// - an unsettled invoice is judged on `today` once the due date has
    ///   passed, and excluded entirely while still immature.
    pub fn assess(
        &self,
        invoices: &[InvoiceTerms],
        today: NaiveDate,
        credit_days: i64,
    ) -> PaymentProfile {
        let mut score_sum = 0u32;
        let mut days_late_sum = 0i64;
        let mut on_time = 0i64;
        let mut late = 0i64;
        let mut scored = 0u32;

        for invoice in invoices {
            let due = invoice
                .due_date
                .unwrap_or_else(|| invoice.posting_date + chrono::Duration::days(credit_days));

            let days_late = if invoice.outstanding.abs() <= SETTLED_TOLERANCE {
                let settled = invoice.settled_on.unwrap_or(invoice.posting_date);
                (settled - due).num_days()
            } else if today < due {
                // Not yet judgeable: unpaid but still inside its terms.
                continue;
            } else {
                (today - due).num_days()
            };

            score_sum += u32::from(self.ladder.score(days_late as f64));
            days_late_sum += days_late;
            if days_late > 0 {
                late += 1;
            } else {
                on_time += 1;
            }
            scored += 1;
        }

        if scored == 0 {
            return PaymentProfile { score: 5.0, on_time: 0, late: 0, avg_days_late: 0.0, credit_days };
        }

        PaymentProfile {
            score: round1(f64::from(score_sum) / f64::from(scored)),
            on_time,
            late,
            avg_days_late: round1(days_late_sum as f64 / f64::from(scored)),
            credit_days,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{InvoiceTerms, PaymentProfile, PaymentScorer};
    use crate::thresholds::{ThresholdLadders, ThresholdOverrides};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn scorer() -> PaymentScorer {
        PaymentScorer::new(ThresholdLadders::resolve(&ThresholdOverrides::default()).payment)
    }

    fn invoice(id: &str) -> InvoiceTerms {
        InvoiceTerms {
            invoice_id: id.to_string(),
            posting_date: date(2025, 12, 1),
            due_date: Some(date(2026, 1, 1)),
            grand_total: Decimal::new(100_000, 2),
            outstanding: Decimal::ZERO,
            settled_on: None,
        }
    }

    #[test]
    fn settled_invoice_scores_on_settlement_date() {
        // Due 2026-01-01, fully paid 2026-01-03: two days late.
        let paid = InvoiceTerms { settled_on: Some(date(2026, 1, 3)), ..invoice("inv-1") };

        let profile = scorer().assess(&[paid], date(2026, 2, 1), 0);

        // 2 days late falls in the default 7-day band: score 4.
        assert_eq!(profile.score, 4.0);
        assert_eq!(profile.late, 1);
        assert_eq!(profile.on_time, 0);
        assert_eq!(profile.avg_days_late, 2.0);
    }

    #[test]
    fn early_settlement_counts_on_time_with_negative_days() {
        let paid = InvoiceTerms { settled_on: Some(date(2025, 12, 20)), ..invoice("inv-1") };

        let profile = scorer().assess(&[paid], date(2026, 2, 1), 0);

        assert_eq!(profile.score, 5.0); // -12 days, within the -7 early band
        assert_eq!(profile.on_time, 1);
        assert_eq!(profile.avg_days_late, -12.0);
    }

    #[test]
    fn settled_invoice_without_payment_row_falls_back_to_posting_date() {
        // Marked paid but no payment entry found: judged on its posting date,
        // which precedes the due date, so it counts as on time.
        let profile = scorer().assess(&[invoice("inv-1")], date(2026, 2, 1), 0);

        assert_eq!(profile.on_time, 1);
        assert_eq!(profile.avg_days_late, -31.0);
    }

    #[test]
    fn immature_unpaid_invoice_is_excluded() {
        let open = InvoiceTerms { outstanding: Decimal::new(100_000, 2), ..invoice("inv-1") };

        // Evaluated before the due date: nothing scoreable, default 5.
        let profile = scorer().assess(&[open], date(2025, 12, 20), 0);

        assert_eq!(
            profile,
            PaymentProfile { score: 5.0, on_time: 0, late: 0, avg_days_late: 0.0, credit_days: 0 }
        );
    }

    #[test]
    fn overdue_unpaid_invoice_is_judged_against_today() {
        let open = InvoiceTerms { outstanding: Decimal::new(100_000, 2), ..invoice("inv-1") };

        // 40 days past due as of 2026-02-10: score 2 band (8..=30 is 3, 31..=60 is 2).
        let profile = scorer().assess(&[open], date(2026, 2, 10), 0);

        assert_eq!(profile.score, 2.0);
        assert_eq!(profile.late, 1);
        assert_eq!(profile.avg_days_late, 40.0);
    }

    #[test]
    fn missing_due_date_uses_posting_plus_credit_days() {
        let open = InvoiceTerms {
            due_date: None,
            outstanding: Decimal::new(100_000, 2),
            ..invoice("inv-1")
        };

        // Posting 2025-12-01 + 30 credit days = due 2025-12-31; 10 days late.
        let profile = scorer().assess(&[open], date(2026, 1, 10), 30);

        assert_eq!(profile.score, 3.0);
        assert_eq!(profile.credit_days, 30);
        assert_eq!(profile.avg_days_late, 10.0);
    }

    #[test]
    fn residual_outstanding_within_tolerance_counts_as_settled() {
        let nearly = InvoiceTerms {
            outstanding: Decimal::new(9, 2), // 0.09
            settled_on: Some(date(2026, 1, 1)),
            ..invoice("inv-1")
        };

        let profile = scorer().assess(&[nearly], date(2026, 3, 1), 0);

        assert_eq!(profile.on_time, 1);
        assert_eq!(profile.avg_days_late, 0.0);
    }

    #[test]
    fn mean_score_rounds_to_one_decimal() {
        let paid_on_time = InvoiceTerms { settled_on: Some(date(2026, 1, 1)), ..invoice("inv-1") };
        let paid_late = InvoiceTerms { settled_on: Some(date(2026, 1, 15)), ..invoice("inv-2") };
        let very_late = InvoiceTerms { settled_on: Some(date(2026, 3, 20)), ..invoice("inv-3") };

        // Scores 4, 3, 1 -> mean 2.666... -> 2.7.
        let profile = scorer().assess(&[paid_on_time, paid_late, very_late], date(2026, 4, 1), 0);

        assert_eq!(profile.score, 2.7);
        assert_eq!(profile.on_time, 1);
        assert_eq!(profile.late, 2);
    }

    #[test]
    fn no_invoices_defaults_to_five() {
        let profile = scorer().assess(&[], date(2026, 1, 1), 45);

        assert_eq!(profile.score, 5.0);
        assert_eq!(profile.credit_days, 45);
    }
}
