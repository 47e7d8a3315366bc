use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use tracing::info;

use movemate_client::BookingController;
use movemate_core::domain::draft::{Draft, DraftSource};
use movemate_core::domain::request::{RequestId, ServiceRequest};
use movemate_core::errors::{ApplicationError, BookingError};
use movemate_core::flows::BookingStep;
use movemate_core::session::{ApplyStatus, BookingSession};

use crate::commands::{
    api_transport, draft_repository, execute, interface_failure, open_storage, CommandResult,
    Failure,
};

#[derive(Debug, Clone)]
pub struct SubmitArgs {
    pub step: u8,
    pub values: PathBuf,
    pub request_id: Option<String>,
    pub edit: bool,
}

pub fn run(args: SubmitArgs) -> CommandResult {
    let Some(step) = BookingStep::from_number(args.step) else {
        let error = BookingError::InvalidStep(args.step);
        return CommandResult::failure("submit", "invalid_step", error.to_string(), 2);
    };
    let values = match read_values(&args.values) {
        Ok(values) => values,
        Err(error) => {
            return CommandResult::failure("submit", "values_file", format!("{error:#}"), 2);
        }
    };

    execute("submit", |config| async move {
        let mut session =
            BookingSession::default().with_coordinate_policy(config.booking.coordinate_policy);
        seed_session(&mut session, values, args.request_id.map(RequestId), args.edit);

        let pool = open_storage(&config).await?;
        let transport = api_transport(&config)?;
        let mut controller = BookingController::open(session, transport, draft_repository(&pool))
            .await
            .map_err(|error| ("storage", error.to_string(), 4u8))?;

        let correlation_id = controller.session().correlation_id().to_string();
        let status = controller
            .submit_step(step)
            .await
            .map_err(|error| booking_failure(error, &correlation_id))?;
        let request_id = controller
            .session()
            .request_id()
            .map(ToString::to_string)
            .unwrap_or_else(|| "<none>".to_string());
        info!(
            event_name = "cli.submit.finished",
            step = step.number(),
            request_id = %request_id,
            correlation_id = controller.session().correlation_id(),
            "step submission finished"
        );
        pool.close().await;

        finished(step, status, &request_id)
    })
}

/// Failed results already came back as `Err` from `submit_step`.
fn finished(step: BookingStep, status: ApplyStatus, request_id: &str) -> Result<String, Failure> {
    if status == ApplyStatus::Superseded {
        return Err(("superseded", format!("step {step} result was not applied"), 5));
    }
    Ok(format!("step {step} accepted; request_id={request_id}"))
}

fn read_values(path: &Path) -> anyhow::Result<ServiceRequest> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read values file `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("values file `{}` is not a valid request", path.display()))
}

/// Without a request id the session starts fresh; with one it continues that
/// request in create or edit mode.
fn seed_session(
    session: &mut BookingSession,
    values: ServiceRequest,
    request_id: Option<RequestId>,
    is_editing: bool,
) {
    match request_id.or_else(|| values.id.clone()) {
        Some(id) => {
            let now = Utc::now();
            let draft =
                Draft { id, created_at: now, last_modified: now, data: values, source: DraftSource::Local };
            session.load_draft(&draft);
        }
        None => *session.values_mut() = values,
    }
    session.set_editing(is_editing);
}

/// Local rule failures keep their own class; server rejections go through the
/// interface mapping.
fn booking_failure(error: BookingError, correlation_id: &str) -> Failure {
    if matches!(error, BookingError::Remote { .. }) {
        return interface_failure(ApplicationError::Booking(error), correlation_id);
    }
    let error_class = match &error {
        BookingError::Validation(_) => "validation",
        BookingError::StaleCoordinates { .. } => "stale_coordinates",
        BookingError::MissingPrerequisite { .. } => "missing_prerequisite",
        BookingError::InvalidStep(_) => "invalid_step",
        BookingError::Flow(_) => "flow",
        BookingError::Remote { .. } => "remote",
    };
    (error_class, error.to_string(), 2)
}
