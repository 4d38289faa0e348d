use serde::Serialize;

use salescope_core::config::{AppConfig, LoadOptions};
use salescope_core::thresholds::ThresholdLadders;

#[derive(Debug, Serialize)]
struct EffectiveConfig {
    database_url: String,
    database_max_connections: u32,
    database_timeout_secs: u64,
    analysis_period_days: i64,
    alert_on_downgrade: bool,
    score_sensitivity: f64,
    logging_level: String,
    resolved_thresholds: ResolvedThresholds,
}

/// The four ladders after defaults are applied, cut points for scores 5..=2.
#[derive(Debug, Serialize)]
struct ResolvedThresholds {
    recency_days: [f64; 4],
    frequency_orders: [f64; 4],
    monetary_amounts: [f64; 4],
    payment_days_late: [f64; 4],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("configuration issue: {error}"),
    };

    let ladders = ThresholdLadders::resolve(&config.analysis.thresholds);
    let effective = EffectiveConfig {
        database_url: config.database.url,
        database_max_connections: config.database.max_connections,
        database_timeout_secs: config.database.timeout_secs,
        analysis_period_days: config.analysis.period_days,
        alert_on_downgrade: config.analysis.alert_on_downgrade,
        score_sensitivity: config.analysis.score_sensitivity,
        logging_level: config.logging.level,
        resolved_thresholds: ResolvedThresholds {
            recency_days: ladders.recency.cuts,
            frequency_orders: ladders.frequency.cuts,
            monetary_amounts: ladders.monetary.cuts,
            payment_days_late: ladders.payment.cuts,
        },
    };

    serde_json::to_string_pretty(&effective)
        .unwrap_or_else(|error| format!("failed to render configuration: {error}"))
}
