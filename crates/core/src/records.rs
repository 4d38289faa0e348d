//! Persisted record shapes owned by the derived tables.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analytics::{AbcClass, ItemProfile, XyzClass};
use crate::payment::PaymentProfile;
use crate::scoring::{AlertDirection, PurchaseAggregates, ScoreCard};
use crate::tiers::Tier;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

/// One row per customer in `customer_score`, upserted by the scoring pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomerScoreRecord {
    pub customer_id: CustomerId,
    pub recency_score: u8,
    pub frequency_score: u8,
    pub monetary_score: u8,
    pub payment_score: f64,
    pub total_score: f64,
    pub average_score: f64,
    pub tier: Tier,
    pub rfmp: String,
    pub last_purchase_date: Option<NaiveDate>,
    pub days_since_purchase: Option<i64>,
    pub total_orders: i64,
    pub total_spent: Decimal,
    pub on_time_invoices: i64,
    pub late_invoices: i64,
    pub avg_days_late: f64,
    pub credit_days: i64,
    /// Average as of the last qualifying change; 0 until one occurs.
    pub previous_average: f64,
    pub average_changed_on: Option<NaiveDate>,
    pub last_calculated: DateTime<Utc>,
}

impl CustomerScoreRecord {
    /// Blank record for a customer that has never been scored.
    pub fn empty(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            recency_score: 0,
            frequency_score: 0,
            monetary_score: 0,
            payment_score: 0.0,
            total_score: 0.0,
            average_score: 0.0,
            tier: Tier::Poor,
            rfmp: String::new(),
            last_purchase_date: None,
            days_since_purchase: None,
            total_orders: 0,
            total_spent: Decimal::ZERO,
            on_time_invoices: 0,
            late_invoices: 0,
            avg_days_late: 0.0,
            credit_days: 0,
            previous_average: 0.0,
            average_changed_on: None,
            last_calculated: DateTime::<Utc>::MIN_UTC,
        }
    }

    /// Overwrite the computed fields from a fresh run, leaving the
    /// previous-average bookkeeping untouched.
    pub fn apply(
        &mut self,
        card: &ScoreCard,
        purchases: &PurchaseAggregates,
        payment: &PaymentProfile,
        calculated_at: DateTime<Utc>,
    ) {
        self.recency_score = card.recency;
        self.frequency_score = card.frequency;
        self.monetary_score = card.monetary;
        self.payment_score = card.payment;
        self.total_score = card.total;
        self.average_score = card.average;
        self.tier = card.tier;
        self.rfmp = card.rfmp();
        self.last_purchase_date = purchases.last_purchase;
        self.days_since_purchase = card.days_since_purchase;
        self.total_orders = purchases.order_count;
        self.total_spent = purchases.total_spent;
        self.on_time_invoices = payment.on_time;
        self.late_invoices = payment.late;
        self.avg_days_late = payment.avg_days_late;
        self.credit_days = payment.credit_days;
        self.last_calculated = calculated_at;
    }
}

/// A score-change alert. Immutable after creation except for the read flag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreAlert {
    pub id: String,
    pub customer_id: CustomerId,
    pub direction: AlertDirection,
    pub previous_average: f64,
    pub new_average: f64,
    pub previous_tier: Tier,
    pub new_tier: Tier,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

/// Immutable daily copy of a customer's scores.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub id: String,
    pub customer_id: CustomerId,
    pub snapshot_date: NaiveDate,
    pub recency_score: u8,
    pub frequency_score: u8,
    pub monetary_score: u8,
    pub payment_score: f64,
    pub average_score: f64,
    pub tier: Tier,
    pub rfmp: String,
    pub created_at: DateTime<Utc>,
}

impl HistorySnapshot {
    pub fn of(record: &CustomerScoreRecord, snapshot_date: NaiveDate, id: String) -> Self {
        Self {
            id,
            customer_id: record.customer_id.clone(),
            snapshot_date,
            recency_score: record.recency_score,
            frequency_score: record.frequency_score,
            monetary_score: record.monetary_score,
            payment_score: record.payment_score,
            average_score: record.average_score,
            tier: record.tier,
            rfmp: record.rfmp.clone(),
            created_at: Utc::now(),
        }
    }
}

/// One row per item in `item_analytics`, fully rewritten each run.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemAnalyticsRecord {
    pub item_id: ItemId,
    pub revenue: Decimal,
    pub profit: Decimal,
    pub quantity_sold: f64,
    pub invoice_count: i64,
    pub abc_class: AbcClass,
    pub xyz_class: XyzClass,
    pub coefficient_of_variation: f64,
    pub turnover_ratio: f64,
    pub gmroi: f64,
    pub last_calculated: DateTime<Utc>,
}

impl ItemAnalyticsRecord {
    pub fn from_profile(profile: ItemProfile, calculated_at: DateTime<Utc>) -> Self {
        Self {
            item_id: ItemId(profile.item_id),
            revenue: profile.revenue,
            profit: profile.profit,
            quantity_sold: profile.quantity,
            invoice_count: profile.invoice_count,
            abc_class: profile.abc,
            xyz_class: profile.xyz,
            coefficient_of_variation: profile.coefficient_of_variation,
            turnover_ratio: profile.turnover_ratio,
            gmroi: profile.gmroi,
            last_calculated: calculated_at,
        }
    }
}

/// Aggregated tier membership for the segment-distribution report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierBucket {
    pub tier: Tier,
    pub count: i64,
    pub avg_score: f64,
}
