use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use crate::flows::states::{BookingEvent, BookingStep, FlowAction, FlowContext, TransitionOutcome};

pub trait FlowDefinition {
    fn initial_step(&self) -> BookingStep;
    fn transition(
        &self,
        current: BookingStep,
        event: &BookingEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// Contact, locations, items, schedule.
#[derive(Clone, Debug, Default)]
pub struct FourStepBooking;

impl FlowDefinition for FourStepBooking {
    fn initial_step(&self) -> BookingStep {
        BookingStep::FIRST
    }

    fn transition(
        &self,
        current: BookingStep,
        event: &BookingEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_four_step(current, event, context)
    }
}

#[derive(Clone, Debug)]
pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_step(&self) -> BookingStep {
        self.flow.initial_step()
    }

    pub fn apply(
        &self,
        current: BookingStep,
        event: &BookingEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event, context)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: BookingStep,
        event: &BookingEvent,
        context: &FlowContext,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event, context);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    audit
                        .event("booking.transition_applied", AuditCategory::Flow, AuditOutcome::Success)
                        .with_step(outcome.to)
                        .with_metadata("from", outcome.from.number().to_string())
                        .with_metadata("to", outcome.to.number().to_string())
                        .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    audit
                        .event("booking.transition_rejected", AuditCategory::Flow, AuditOutcome::Rejected)
                        .with_step(current)
                        .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl Default for FlowEngine<FourStepBooking> {
    fn default() -> Self {
        Self::new(FourStepBooking)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("step {step} must be submitted successfully before advancing")]
    StepNotSubmitted { step: BookingStep },
}

fn transition_four_step(
    current: BookingStep,
    event: &BookingEvent,
    context: &FlowContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use FlowAction::{ClearStepSubmission, DiscardSessionState, RevalidateOnAdvance};

    let (to, actions) = match event {
        BookingEvent::AdvanceRequested => {
            if !context.current_step_submitted {
                return Err(FlowTransitionError::StepNotSubmitted { step: current });
            }
            let to = current.next();
            let actions = if to == current { Vec::new() } else { vec![ClearStepSubmission] };
            (to, actions)
        }
        BookingEvent::RetreatRequested => {
            let to = current.previous();
            let actions = if to == current { Vec::new() } else { vec![ClearStepSubmission] };
            (to, actions)
        }
        BookingEvent::JumpRequested(target) => {
            (*target, vec![ClearStepSubmission, RevalidateOnAdvance])
        }
        BookingEvent::ResetRequested => (BookingStep::FIRST, vec![DiscardSessionState]),
    };

    Ok(TransitionOutcome { from: current, to, event: event.clone(), actions })
}
