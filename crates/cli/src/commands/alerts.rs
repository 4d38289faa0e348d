use crate::commands::{self, engine_failure, CommandResult};

pub fn run(limit: i64, unread_only: bool) -> CommandResult {
    commands::execute("alerts", |engine| async move {
        let alerts = engine.alerts(limit, unread_only).await.map_err(engine_failure)?;
        engine.close().await;

        let scope = if unread_only { "unread" } else { "all" };
        let data = serde_json::to_value(&alerts)
            .map_err(|error| ("serialization", error.to_string(), 7u8))?;
        Ok(CommandResult::success_with_data(
            "alerts",
            format!("{} {scope} alerts", alerts.len()),
            data,
        ))
    })
}
