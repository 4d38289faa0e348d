use crate::commands::{self, engine_failure, CommandResult};

pub fn run() -> CommandResult {
    commands::execute("segments", |engine| async move {
        let distribution = engine.segment_distribution().await.map_err(engine_failure)?;
        engine.close().await;

        let data = serde_json::to_value(&distribution)
            .map_err(|error| ("serialization", error.to_string(), 7u8))?;
        Ok(CommandResult::success_with_data(
            "segments",
            format!("{} tiers with scored customers", distribution.len()),
            data,
        ))
    })
}
