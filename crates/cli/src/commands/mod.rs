pub mod alerts;
pub mod analytics;
pub mod config;
pub mod doctor;
pub mod mark_read;
pub mod migrate;
pub mod score;
pub mod seed;
pub mod segments;
pub mod snapshot;
pub mod trend;

use std::future::Future;
use std::sync::Once;

use serde::Serialize;

use salescope_core::config::{AppConfig, LoadOptions};
use salescope_engine::{Engine, EngineError};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::build(command, "ok", None, message.into(), None, 0)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self::build(command, "ok", None, message.into(), Some(data), 0)
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::build(command, "error", Some(error_class.to_string()), message.into(), None, exit_code)
    }

    fn build(
        command: &str,
        status: &str,
        error_class: Option<String>,
        message: String,
        data: Option<serde_json::Value>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: status.to_string(),
            error_class,
            message,
            data,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

static LOGGING_INIT: Once = Once::new();

/// Structured logging goes to stderr so command stdout stays machine-readable.
fn init_logging(config: &AppConfig) {
    use salescope_core::config::LogFormat::*;
    use tracing::Level;

    LOGGING_INIT.call_once(|| {
        let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
        let builder = tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .with_writer(std::io::stderr);

        match config.logging.format {
            Compact => builder.compact().init(),
            Pretty => builder.pretty().init(),
            Json => builder.json().init(),
        }
    });
}

/// Shared command scaffold: load config, build a runtime, bootstrap the
/// engine, and hand it to the command body. The body owns the engine and is
/// responsible for closing it.
pub(crate) fn execute<Fut>(
    command: &'static str,
    run: impl FnOnce(Engine) -> Fut,
) -> CommandResult
where
    Fut: Future<Output = Result<CommandResult, (&'static str, String, u8)>>,
{
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                command,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };
    init_logging(&config);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let engine = Engine::bootstrap(&config).await.map_err(engine_failure)?;
        run(engine).await
    });

    match result {
        Ok(result) => result,
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(command, error_class, message, exit_code)
        }
    }
}

pub(crate) fn engine_failure(error: EngineError) -> (&'static str, String, u8) {
    match &error {
        EngineError::Connect(_) => ("db_connectivity", error.to_string(), 4),
        EngineError::Migration(_) => ("migration", error.to_string(), 5),
        EngineError::Repository(_) => ("repository", error.to_string(), 6),
    }
}

#[cfg(test)]
mod tests {
    use super::CommandResult;

    #[test]
    fn success_payload_omits_error_class_and_data() {
        let result = CommandResult::success("score", "done");
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("\"status\":\"ok\""));
        assert!(result.output.contains("\"error_class\":null"));
        assert!(!result.output.contains("\"data\""));
    }

    #[test]
    fn data_payload_embeds_serialized_value() {
        let result = CommandResult::success_with_data(
            "score",
            "done",
            serde_json::json!({"processed": 3}),
        );
        assert!(result.output.contains("\"data\":{\"processed\":3}"));
    }

    #[test]
    fn failure_payload_carries_class_and_exit_code() {
        let result = CommandResult::failure("score", "db_connectivity", "no database", 4);
        assert_eq!(result.exit_code, 4);
        assert!(result.output.contains("\"error_class\":\"db_connectivity\""));
    }
}
