//! Threshold ladders and the value-to-score mapper.
//!
//! Each of the four RFMP metrics is bucketed against an ordered ladder of four
//! cut points, one per score from 5 down to 2; score 1 is the catch-all below
//! every cut point. Missing overrides fall back to fixed defaults.

use serde::{Deserialize, Serialize};

/// Default recency cut points (days since last purchase) for scores 5..=2.
pub const DEFAULT_RECENCY_DAYS: [f64; 4] = [30.0, 60.0, 90.0, 180.0];
/// Default frequency cut points (order counts) for scores 5..=2.
pub const DEFAULT_FREQUENCY_ORDERS: [f64; 4] = [10.0, 5.0, 3.0, 2.0];
/// Default monetary cut points (total spend) for scores 5..=2.
pub const DEFAULT_MONETARY_AMOUNTS: [f64; 4] = [50_000.0, 25_000.0, 10_000.0, 2_000.0];
/// Default payment-lateness cut points (days late, negative = early) for scores 5..=2.
pub const DEFAULT_PAYMENT_DAYS_LATE: [f64; 4] = [-7.0, 7.0, 30.0, 60.0];

/// Whether larger values of a metric deserve higher scores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Frequency, monetary: bigger is better, cut points descend.
    HigherIsBetter,
    /// Recency, payment lateness: smaller is better, cut points ascend.
    LowerIsBetter,
}

/// An ordered sequence of four cut points for scores 5, 4, 3, 2.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdLadder {
    pub cuts: [f64; 4],
    pub direction: Direction,
}

impl ThresholdLadder {
    pub fn new(cuts: [f64; 4], direction: Direction) -> Self {
        Self { cuts, direction }
    }

    /// Map a value onto a score in 1..=5.
    ///
    /// The ladder is scanned from the score-5 cut point down; the first cut
    /// point the value satisfies (inclusive comparison, so ties take the
    /// higher score) wins, and 1 is returned when none match.
    pub fn score(&self, value: f64) -> u8 {
        for (index, cut) in self.cuts.iter().enumerate() {
            let hit = match self.direction {
                Direction::HigherIsBetter => value >= *cut,
                Direction::LowerIsBetter => value <= *cut,
            };
            if hit {
                return 5 - index as u8;
            }
        }
        1
    }
}

/// Optional per-metric cut-point overrides, four per metric, read from
/// configuration. Any missing value falls back to the documented default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    pub recency_days_5: Option<f64>,
    pub recency_days_4: Option<f64>,
    pub recency_days_3: Option<f64>,
    pub recency_days_2: Option<f64>,
    pub frequency_orders_5: Option<f64>,
    pub frequency_orders_4: Option<f64>,
    pub frequency_orders_3: Option<f64>,
    pub frequency_orders_2: Option<f64>,
    pub monetary_amount_5: Option<f64>,
    pub monetary_amount_4: Option<f64>,
    pub monetary_amount_3: Option<f64>,
    pub monetary_amount_2: Option<f64>,
    pub payment_days_5: Option<f64>,
    pub payment_days_4: Option<f64>,
    pub payment_days_3: Option<f64>,
    pub payment_days_2: Option<f64>,
}

/// The four resolved ladders used by a scoring run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThresholdLadders {
    pub recency: ThresholdLadder,
    pub frequency: ThresholdLadder,
    pub monetary: ThresholdLadder,
    pub payment: ThresholdLadder,
}

impl ThresholdLadders {
    /// Resolve configuration overrides into concrete ladders.
    ///
    /// Known limitation: cut points are not validated for monotonicity. A
    /// non-monotonic override set silently produces inconsistent scoring.
    pub fn resolve(overrides: &ThresholdOverrides) -> Self {
        Self {
            recency: ThresholdLadder::new(
                [
                    overrides.recency_days_5.unwrap_or(DEFAULT_RECENCY_DAYS[0]),
                    overrides.recency_days_4.unwrap_or(DEFAULT_RECENCY_DAYS[1]),
                    overrides.recency_days_3.unwrap_or(DEFAULT_RECENCY_DAYS[2]),
                    overrides.recency_days_2.unwrap_or(DEFAULT_RECENCY_DAYS[3]),
                ],
                Direction::LowerIsBetter,
            ),
            frequency: ThresholdLadder::new(
                [
                    overrides.frequency_orders_5.unwrap_or(DEFAULT_FREQUENCY_ORDERS[0]),
                    overrides.frequency_orders_4.unwrap_or(DEFAULT_FREQUENCY_ORDERS[1]),
                    overrides.frequency_orders_3.unwrap_or(DEFAULT_FREQUENCY_ORDERS[2]),
                    overrides.frequency_orders_2.unwrap_or(DEFAULT_FREQUENCY_ORDERS[3]),
                ],
                Direction::HigherIsBetter,
            ),
            monetary: ThresholdLadder::new(
                [
                    overrides.monetary_amount_5.unwrap_or(DEFAULT_MONETARY_AMOUNTS[0]),
                    overrides.monetary_amount_4.unwrap_or(DEFAULT_MONETARY_AMOUNTS[1]),
                    overrides.monetary_amount_3.unwrap_or(DEFAULT_MONETARY_AMOUNTS[2]),
                    overrides.monetary_amount_2.unwrap_or(DEFAULT_MONETARY_AMOUNTS[3]),
                ],
                Direction::HigherIsBetter,
            ),
            payment: ThresholdLadder::new(
                [
                    overrides.payment_days_5.unwrap_or(DEFAULT_PAYMENT_DAYS_LATE[0]),
                    overrides.payment_days_4.unwrap_or(DEFAULT_PAYMENT_DAYS_LATE[1]),
                    overrides.payment_days_3.unwrap_or(DEFAULT_PAYMENT_DAYS_LATE[2]),
                    overrides.payment_days_2.unwrap_or(DEFAULT_PAYMENT_DAYS_LATE[3]),
                ],
                Direction::LowerIsBetter,
            ),
        }
    }
}
