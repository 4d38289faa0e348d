use chrono::Utc;

use salescope_core::records::CustomerId;

use crate::commands::{self, engine_failure, CommandResult};

pub fn run(customer: Option<String>, days: i64) -> CommandResult {
    commands::execute("trend", |engine| async move {
        let today = Utc::now().date_naive();
        let customer_id = customer.map(CustomerId);
        let snapshots =
            engine.trend_data(customer_id.as_ref(), days, today).await.map_err(engine_failure)?;
        engine.close().await;

        let data = serde_json::to_value(&snapshots)
            .map_err(|error| ("serialization", error.to_string(), 7u8))?;
        Ok(CommandResult::success_with_data(
            "trend",
            format!("{} snapshots in the trailing {days} days", snapshots.len()),
            data,
        ))
    })
}
