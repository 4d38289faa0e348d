use salescope_db::repositories::RepositoryError;
use salescope_engine::EngineError;

use crate::commands::{self, CommandResult};

pub fn run(alert_id: &str) -> CommandResult {
    let alert_id = alert_id.to_string();
    commands::execute("mark-read", |engine| async move {
        let outcome = engine.mark_alert_read(&alert_id).await;
        engine.close().await;

        match outcome {
            Ok(()) => Ok(CommandResult::success(
                "mark-read",
                format!("alert `{alert_id}` acknowledged"),
            )),
            Err(EngineError::Repository(RepositoryError::NotFound(message))) => {
                Err(("not_found", message, 1u8))
            }
            Err(error) => Err(("repository", error.to_string(), 6u8)),
        }
    })
}
