use serde::Serialize;
use serde_json::Value;

use crate::domain::request::{request_id_from, RequestId};
use crate::errors::BookingError;
use crate::flows::BookingStep;
use crate::payload::StepPayload;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    pub is_editing: bool,
    pub request_id: Option<RequestId>,
}

impl SubmitOptions {
    pub fn create(request_id: Option<RequestId>) -> Self {
        Self { is_editing: false, request_id }
    }

    pub fn edit(request_id: Option<RequestId>) -> Self {
        Self { is_editing: true, request_id }
    }

    /// Steps after the first address an existing request, so they cannot run
    /// without its id.
    pub fn require_request_id(&self, step: BookingStep) -> Result<Option<&RequestId>, BookingError> {
        match (&self.request_id, step) {
            (Some(id), _) => Ok(Some(id)),
            (None, BookingStep::Contact) => Ok(None),
            (None, step) => Err(BookingError::MissingPrerequisite { step }),
        }
    }

    /// Create-mode successes add a draft; edit-mode successes update one.
    pub fn draft_write(&self) -> DraftWrite {
        if self.is_editing {
            DraftWrite::Update
        } else {
            DraftWrite::Add
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftWrite {
    Add,
    Update,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubmissionOutcome {
    pub step: BookingStep,
    pub status: u16,
    pub data: Value,
    /// The id the server returned, or the one the submission was made with.
    pub request_id: Option<RequestId>,
}

impl SubmissionOutcome {
    pub fn new(step: BookingStep, status: u16, data: Value, known: Option<&RequestId>) -> Self {
        let request_id = request_id_from(&data).or_else(|| known.cloned());
        Self { step, status, data, request_id }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubmissionFailure {
    pub step: BookingStep,
    pub error: BookingError,
}

impl SubmissionFailure {
    pub fn new(step: BookingStep, error: BookingError) -> Self {
        Self { step, error }
    }
}

pub type SubmissionResult = Result<SubmissionOutcome, SubmissionFailure>;

/// Identifies one in-flight submission. Only the most recent ticket issued for
/// a step may change that step's state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubmissionTicket {
    pub step: BookingStep,
    pub generation: u64,
}

/// Everything needed to send one step: its ticket, body and create/edit mode.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedSubmission {
    pub ticket: SubmissionTicket,
    pub payload: StepPayload,
    pub options: SubmitOptions,
}
