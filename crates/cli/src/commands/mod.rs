pub mod bids;
pub mod config;
pub mod drafts;
pub mod migrate;
pub mod submit;

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use movemate_client::transport::ReqwestTransport;
use movemate_core::config::{AppConfig, LoadOptions};
use movemate_core::errors::{ApplicationError, InterfaceError};
use movemate_db::repositories::{LocalDraftRepository, SqlKeyValueStore};
use movemate_db::{connect_from_config, migrations, DbPool};

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
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
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

/// A command failure before it is rendered: `(error_class, message, exit_code)`.
pub(crate) type Failure = (&'static str, String, u8);

/// Failures that reached the API are reported through the user-facing
/// interface mapping, tagged with the correlation id.
pub(crate) fn interface_failure(error: ApplicationError, correlation_id: &str) -> Failure {
    let interface = error.into_interface(correlation_id);
    let exit_code = match interface {
        InterfaceError::BadRequest { .. } => 2,
        InterfaceError::ServiceUnavailable { .. } => 5,
        InterfaceError::Internal { .. } => 3,
    };
    let message =
        format!("{} {interface} (correlation_id={correlation_id})", interface.user_message());
    (interface.error_class(), message, exit_code)
}

/// Loads config and runs `task` on a current-thread runtime, rendering either
/// outcome as a [`CommandResult`].
pub(crate) fn execute<F, Fut>(command: &str, task: F) -> CommandResult
where
    F: FnOnce(AppConfig) -> Fut,
    Fut: Future<Output = Result<String, Failure>>,
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

    match runtime.block_on(task(config)) {
        Ok(message) => CommandResult::success(command, message),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(command, error_class, message, exit_code)
        }
    }
}

pub(crate) async fn open_storage(config: &AppConfig) -> Result<DbPool, Failure> {
    let pool = connect_from_config(&config.storage)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;
    Ok(pool)
}

pub(crate) type DraftRepo = LocalDraftRepository<SqlKeyValueStore>;

pub(crate) fn draft_repository(pool: &DbPool) -> DraftRepo {
    LocalDraftRepository::new(SqlKeyValueStore::new(pool.clone()))
}

pub(crate) fn api_transport(config: &AppConfig) -> Result<Arc<ReqwestTransport>, Failure> {
    ReqwestTransport::from_config(&config.api)
        .map(Arc::new)
        .map_err(|error| ("transport_init", error.to_string(), 3u8))
}
