//! The booking session: one explicit owner for the form values, the current
//! step, per-step errors and in-flight submissions.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use uuid::Uuid;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, NoopAuditSink};
use crate::domain::draft::Draft;
use crate::domain::request::{RequestId, RequestType, ServiceRequest};
use crate::domain::stop::JourneyStop;
use crate::errors::{BookingError, DomainError};
use crate::flows::{BookingEvent, BookingStep, FlowAction, FlowContext, FlowEngine, FourStepBooking};
use crate::identity::{IdGenerator, UuidIdGenerator};
use crate::journey::{self, Reprojection};
use crate::payload::{format_payload_with, CoordinatePolicy, FormatOptions, StepPayload};
use crate::submission::{
    PreparedSubmission, SubmissionResult, SubmissionTicket, SubmitOptions,
};
use crate::validation::validate_step;

const SESSION_ACTOR: &str = "booking-session";

/// What [`BookingSession::apply_outcome`] did with a submission result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyStatus {
    Applied,
    Failed,
    /// A newer submission for the same step was issued after this one.
    Superseded,
}

pub struct BookingSession {
    values: ServiceRequest,
    step: BookingStep,
    request_id: Option<RequestId>,
    is_editing: bool,
    errors: BTreeMap<BookingStep, String>,
    submitted: BTreeSet<BookingStep>,
    in_flight: HashMap<BookingStep, u64>,
    next_generation: u64,
    engine: FlowEngine<FourStepBooking>,
    ids: Arc<dyn IdGenerator>,
    audit_sink: Arc<dyn AuditSink>,
    correlation_id: String,
    format: FormatOptions,
}

impl Default for BookingSession {
    fn default() -> Self {
        Self::new(Arc::new(UuidIdGenerator), Arc::new(NoopAuditSink))
    }
}

impl BookingSession {
    pub fn new(ids: Arc<dyn IdGenerator>, audit_sink: Arc<dyn AuditSink>) -> Self {
        let engine = FlowEngine::default();
        Self {
            values: ServiceRequest::default(),
            step: engine.initial_step(),
            request_id: None,
            is_editing: false,
            errors: BTreeMap::new(),
            submitted: BTreeSet::new(),
            in_flight: HashMap::new(),
            next_generation: 0,
            engine,
            ids,
            audit_sink,
            correlation_id: Uuid::new_v4().to_string(),
            format: FormatOptions::default(),
        }
    }

    /// Reopens a stored draft in edit mode at the first step.
    pub fn resume(draft: &Draft, ids: Arc<dyn IdGenerator>, audit_sink: Arc<dyn AuditSink>) -> Self {
        let mut session = Self::new(ids, audit_sink);
        session.load_draft(draft);
        session
    }

    /// Replaces the whole session state with a stored draft, in edit mode.
    pub fn load_draft(&mut self, draft: &Draft) {
        self.discard_state();
        self.values = draft.data.clone();
        self.values.id = Some(draft.id.clone());
        self.request_id = Some(draft.id.clone());
        self.is_editing = true;
        self.step = self.engine.initial_step();
    }

    pub fn with_coordinate_policy(mut self, policy: CoordinatePolicy) -> Self {
        self.format.coordinate_policy = policy;
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    pub fn values(&self) -> &ServiceRequest {
        &self.values
    }

    /// Per-field edits; the last write wins.
    pub fn values_mut(&mut self) -> &mut ServiceRequest {
        &mut self.values
    }

    pub fn step(&self) -> BookingStep {
        self.step
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.is_editing
    }

    pub fn set_editing(&mut self, is_editing: bool) {
        self.is_editing = is_editing;
    }

    pub fn coordinate_policy(&self) -> CoordinatePolicy {
        self.format.coordinate_policy
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn error(&self, step: BookingStep) -> Option<&str> {
        self.errors.get(&step).map(String::as_str)
    }

    /// Step errors keyed `step1` .. `step4`.
    pub fn errors(&self) -> BTreeMap<String, String> {
        self.errors.iter().map(|(step, message)| (step.error_key(), message.clone())).collect()
    }

    pub fn is_submitted(&self, step: BookingStep) -> bool {
        self.submitted.contains(&step)
    }

    pub fn set_request_type(&mut self, to: RequestType) -> Vec<JourneyStop> {
        let from = self.values.request_type;
        let Reprojection { values, discarded_stops } =
            journey::switch_request_type(from, to, &self.values, self.ids.as_ref());
        self.values = values;

        if !discarded_stops.is_empty() {
            self.emit(
                self.audit_context()
                    .event("booking.stops_discarded", AuditCategory::Flow, AuditOutcome::Success)
                    .with_metadata("from", from.as_str())
                    .with_metadata("to", to.as_str())
                    .with_metadata("discarded", discarded_stops.len().to_string()),
            );
        }
        discarded_stops
    }

    /// Reprojection result without applying it, so callers can confirm a lossy
    /// downgrade first.
    pub fn preview_request_type(&self, to: RequestType) -> Reprojection {
        journey::switch_request_type(self.values.request_type, to, &self.values, self.ids.as_ref())
    }

    pub fn add_stop(&mut self, stop: JourneyStop) -> usize {
        journey::add_stop(&mut self.values.journey_stops, stop)
    }

    pub fn update_stop(&mut self, index: usize, stop: JourneyStop) -> Result<(), DomainError> {
        journey::update_stop(&mut self.values.journey_stops, index, stop)
    }

    pub fn remove_stop(&mut self, index: usize) -> Result<JourneyStop, DomainError> {
        journey::remove_stop(&mut self.values.journey_stops, index)
    }

    /// Preview of a step body without issuing a ticket.
    pub fn payload(&self, step: BookingStep) -> StepPayload {
        format_payload_with(step, &self.values, self.format)
    }

    pub fn submit_options(&self) -> SubmitOptions {
        SubmitOptions { is_editing: self.is_editing, request_id: self.request_id.clone() }
    }

    /// Validates the current step and issues a ticket for sending it.
    pub fn begin_submission(&mut self) -> Result<PreparedSubmission, BookingError> {
        self.begin_submission_for(self.step)
    }

    pub fn begin_submission_for(
        &mut self,
        step: BookingStep,
    ) -> Result<PreparedSubmission, BookingError> {
        if let Err(error) = validate_step(step, &self.values, self.format.coordinate_policy) {
            self.errors.insert(step, error.to_string());
            self.submitted.remove(&step);
            return Err(error);
        }

        self.next_generation += 1;
        let ticket = SubmissionTicket { step, generation: self.next_generation };
        self.in_flight.insert(step, ticket.generation);

        Ok(PreparedSubmission { ticket, payload: self.payload(step), options: self.submit_options() })
    }

    /// Folds a gateway result into the session. Results for a superseded
    /// ticket are dropped without touching any state.
    pub fn apply_outcome(&mut self, ticket: SubmissionTicket, result: SubmissionResult) -> ApplyStatus {
        if self.in_flight.get(&ticket.step) != Some(&ticket.generation) {
            self.emit(
                self.audit_context()
                    .event("booking.submission_superseded", AuditCategory::Submission, AuditOutcome::Ignored)
                    .with_step(ticket.step)
                    .with_metadata("generation", ticket.generation.to_string()),
            );
            return ApplyStatus::Superseded;
        }
        self.in_flight.remove(&ticket.step);

        match result {
            Ok(outcome) => {
                self.values.merge_server_response(&outcome.data);
                if let Some(request_id) = outcome.request_id {
                    self.values.id = Some(request_id.clone());
                    self.request_id = Some(request_id);
                }
                self.errors.remove(&ticket.step);
                self.submitted.insert(ticket.step);
                self.emit(
                    self.audit_context()
                        .event("booking.step_submitted", AuditCategory::Submission, AuditOutcome::Success)
                        .with_step(ticket.step)
                        .with_metadata("status", outcome.status.to_string()),
                );
                ApplyStatus::Applied
            }
            Err(failure) => {
                let step = failure.error.step().unwrap_or(ticket.step);
                self.errors.insert(step, failure.error.to_string());
                self.submitted.remove(&step);
                self.emit(
                    self.audit_context()
                        .event("booking.step_failed", AuditCategory::Submission, AuditOutcome::Failed)
                        .with_step(step)
                        .with_metadata("error", failure.error.to_string()),
                );
                ApplyStatus::Failed
            }
        }
    }

    pub fn advance(&mut self) -> Result<BookingStep, BookingError> {
        self.transition(BookingEvent::AdvanceRequested)
    }

    pub fn retreat(&mut self) -> BookingStep {
        self.transition(BookingEvent::RetreatRequested).unwrap_or(self.step)
    }

    pub fn jump_to_step(&mut self, number: u8) -> Result<BookingStep, BookingError> {
        let target = BookingStep::from_number(number).ok_or(BookingError::InvalidStep(number))?;
        self.transition(BookingEvent::JumpRequested(target))
    }

    /// Back to an empty draft at step 1.
    pub fn reset(&mut self) {
        let _ = self.transition(BookingEvent::ResetRequested);
    }

    fn transition(&mut self, event: BookingEvent) -> Result<BookingStep, BookingError> {
        let context = FlowContext { current_step_submitted: self.submitted.contains(&self.step) };
        let audit = self.audit_context();

        let outcome = match self.engine.apply_with_audit(
            self.step,
            &event,
            &context,
            self.audit_sink.as_ref(),
            &audit,
        ) {
            Ok(outcome) => outcome,
            Err(error) => {
                let error = BookingError::from(error);
                if let Some(step) = error.step() {
                    self.errors.insert(step, error.to_string());
                }
                return Err(error);
            }
        };

        for action in &outcome.actions {
            match action {
                FlowAction::ClearStepSubmission => {
                    self.submitted.remove(&outcome.to);
                }
                FlowAction::RevalidateOnAdvance => {}
                FlowAction::DiscardSessionState => self.discard_state(),
            }
        }
        self.step = outcome.to;
        Ok(self.step)
    }

    fn discard_state(&mut self) {
        self.values = ServiceRequest::default();
        self.request_id = None;
        self.is_editing = false;
        self.errors.clear();
        self.submitted.clear();
        self.in_flight.clear();
    }

    fn audit_context(&self) -> AuditContext {
        AuditContext::new(self.request_id.clone(), self.correlation_id.clone(), SESSION_ACTOR)
    }

    fn emit(&self, event: AuditEvent) {
        self.audit_sink.emit(event);
    }
}
