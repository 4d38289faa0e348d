use chrono::{NaiveDate, Utc};

use crate::commands::{self, engine_failure, CommandResult};

pub fn run(date: Option<NaiveDate>) -> CommandResult {
    commands::execute("score", |engine| async move {
        let today = date.unwrap_or_else(|| Utc::now().date_naive());
        let summary = engine.calculate_scores(today).await.map_err(engine_failure)?;
        engine.close().await;

        let data = serde_json::to_value(summary)
            .map_err(|error| ("serialization", error.to_string(), 7u8))?;
        Ok(CommandResult::success_with_data(
            "score",
            format!("scored customers as of {today}"),
            data,
        ))
    })
}
