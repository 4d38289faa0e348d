pub mod analytics;
pub mod basket;
pub mod config;
pub mod payment;
pub mod records;
pub mod scoring;
pub mod thresholds;
pub mod tiers;

pub use analytics::{AbcClass, ItemProfile, ItemSales, XyzClass};
pub use basket::BasketRule;
pub use config::{AnalysisConfig, AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use payment::{InvoiceTerms, PaymentProfile, PaymentScorer};
pub use records::{
    CustomerId, CustomerScoreRecord, HistorySnapshot, ItemAnalyticsRecord, ItemId, ScoreAlert,
    TierBucket,
};
pub use scoring::{detect_change, AlertDirection, PurchaseAggregates, ScoreCard, ScoreChange};
pub use thresholds::{Direction, ThresholdLadder, ThresholdLadders, ThresholdOverrides};
pub use tiers::Tier;
