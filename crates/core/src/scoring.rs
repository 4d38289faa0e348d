//! Customer score-card assembly and change detection.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::payment::PaymentProfile;
use crate::thresholds::ThresholdLadders;
use crate::tiers::Tier;

/// Recency sentinel for customers with no purchase history.
pub const NEVER_PURCHASED_DAYS: i64 = 9999;

/// Purchase history aggregated over the analysis period.
#[derive(Clone, Debug, PartialEq)]
pub struct PurchaseAggregates {
    pub last_purchase: Option<NaiveDate>,
    pub order_count: i64,
    pub total_spent: Decimal,
}

/// The four sub-scores plus their composite, for one customer.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreCard {
    pub recency: u8,
    pub frequency: u8,
    pub monetary: u8,
    /// Mean of per-invoice lateness scores, one decimal (1.0..=5.0).
    pub payment: f64,
    /// Sum of the four sub-scores (4.0..=20.0).
    pub total: f64,
    /// total / 4, one decimal (1.0..=5.0).
    pub average: f64,
    pub tier: Tier,
    /// None when the customer has never purchased (sentinel recency applies).
    pub days_since_purchase: Option<i64>,
}

impl ScoreCard {
    pub fn build(
        ladders: &ThresholdLadders,
        purchases: &PurchaseAggregates,
        payment: &PaymentProfile,
        today: NaiveDate,
    ) -> Self {
        let days_since_purchase = purchases.last_purchase.map(|last| (today - last).num_days());
        let recency_days = days_since_purchase.unwrap_or(NEVER_PURCHASED_DAYS);

        let recency = ladders.recency.score(recency_days as f64);
        let frequency = ladders.frequency.score(purchases.order_count as f64);
        let monetary = ladders.monetary.score(purchases.total_spent.to_f64().unwrap_or(0.0));

        let total = f64::from(recency) + f64::from(frequency) + f64::from(monetary) + payment.score;
        let average = round1(total / 4.0);

        Self {
            recency,
            frequency,
            monetary,
            payment: payment.score,
            total,
            average,
            tier: Tier::from_average(average),
            days_since_purchase,
        }
    }

    /// Compact `r-f-m-p` rendering, e.g. `5-4-3-4.5`. A whole-number payment
    /// score drops its fraction, matching the integer sub-scores.
    pub fn rfmp(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.recency,
            self.frequency,
            self.monetary,
            format_payment(self.payment)
        )
    }
}

fn format_payment(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.0}")
    } else {
        format!("{score:.1}")
    }
}

/// Direction of a detected average-score change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertDirection {
    Upgrade,
    Downgrade,
}

impl fmt::Display for AlertDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertDirection::Upgrade => "Upgrade",
            AlertDirection::Downgrade => "Downgrade",
        })
    }
}

impl FromStr for AlertDirection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Upgrade" => Ok(AlertDirection::Upgrade),
            "Downgrade" => Ok(AlertDirection::Downgrade),
            other => Err(format!("unknown alert direction `{other}`")),
        }
    }
}

/// A qualifying average-score transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreChange {
    pub previous: f64,
    pub current: f64,
    pub direction: AlertDirection,
}

/// Detect a qualifying change between the stored and the freshly computed
/// average. A previous average of zero means the customer was never scored,
/// so nothing qualifies; below-sensitivity movement leaves the stored
/// bookkeeping untouched.
pub fn detect_change(previous: f64, current: f64, sensitivity: f64) -> Option<ScoreChange> {
    if previous == 0.0 || (previous - current).abs() < sensitivity {
        return None;
    }

    let direction = if current < previous {
        AlertDirection::Downgrade
    } else {
        AlertDirection::Upgrade
    };
    Some(ScoreChange { previous, current, direction })
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{detect_change, AlertDirection, PurchaseAggregates, ScoreCard};
    use crate::payment::PaymentProfile;
    use crate::thresholds::{ThresholdLadders, ThresholdOverrides};
    use crate::tiers::Tier;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ladders() -> ThresholdLadders {
        ThresholdLadders::resolve(&ThresholdOverrides::default())
    }

    fn payment(score: f64) -> PaymentProfile {
        PaymentProfile { score, on_time: 0, late: 0, avg_days_late: 0.0, credit_days: 0 }
    }

    #[test]
    fn never_purchased_customer_gets_floor_scores_and_benefit_of_the_doubt() {
        let purchases = PurchaseAggregates {
            last_purchase: None,
            order_count: 0,
            total_spent: Decimal::ZERO,
        };

        let card = ScoreCard::build(&ladders(), &purchases, &payment(5.0), date(2026, 6, 1));

        assert_eq!(card.recency, 1);
        assert_eq!(card.frequency, 1);
        assert_eq!(card.monetary, 1);
        assert_eq!(card.payment, 5.0);
        assert_eq!(card.total, 8.0);
        assert_eq!(card.average, 2.0);
        assert_eq!(card.tier, Tier::Fair);
        assert_eq!(card.days_since_purchase, None);
        assert_eq!(card.rfmp(), "1-1-1-5");
    }

    #[test]
    fn active_customer_scores_from_ladders() {
        let purchases = PurchaseAggregates {
            last_purchase: Some(date(2026, 5, 20)),
            order_count: 6,
            total_spent: Decimal::new(3_000_000, 2), // 30_000
        };

        let card = ScoreCard::build(&ladders(), &purchases, &payment(3.5), date(2026, 6, 1));

        assert_eq!(card.recency, 5); // 12 days
        assert_eq!(card.frequency, 4); // 6 orders
        assert_eq!(card.monetary, 4); // 30k
        assert_eq!(card.total, 16.5);
        assert_eq!(card.average, 4.1);
        assert_eq!(card.tier, Tier::Good);
        assert_eq!(card.days_since_purchase, Some(12));
        assert_eq!(card.rfmp(), "5-4-4-3.5");
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        let purchases = PurchaseAggregates {
            last_purchase: Some(date(2026, 5, 31)),
            order_count: 1,
            total_spent: Decimal::new(100, 0),
        };

        // 5 + 1 + 1 + 2.4 = 9.4; 9.4 / 4 = 2.35 -> 2.4 at one decimal.
        let card = ScoreCard::build(&ladders(), &purchases, &payment(2.4), date(2026, 6, 1));

        assert_eq!(card.average, 2.4);
    }

    #[test]
    fn change_at_sensitivity_threshold_qualifies() {
        let change = detect_change(3.0, 2.5, 0.5).expect("0.5 drop qualifies");
        assert_eq!(change.direction, AlertDirection::Downgrade);
        assert_eq!(change.previous, 3.0);
        assert_eq!(change.current, 2.5);
    }

    #[test]
    fn change_below_sensitivity_is_ignored() {
        assert_eq!(detect_change(3.0, 2.8, 0.5), None);
        assert_eq!(detect_change(3.0, 3.0, 0.5), None);
    }

    #[test]
    fn upgrade_detected_on_rise() {
        let change = detect_change(2.4, 3.0, 0.5).expect("0.6 rise qualifies");
        assert_eq!(change.direction, AlertDirection::Upgrade);
    }

    #[test]
    fn unscored_customer_never_produces_a_change() {
        assert_eq!(detect_change(0.0, 4.0, 0.5), None);
    }
}
