use thiserror::Error;

use crate::domain::bid::{BidId, BidStatus};
use crate::flows::{BookingStep, FlowTransitionError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Local validation failure raised before any network call.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("step {step} is missing required fields: {}", field_names(.fields))]
pub struct ValidationError {
    pub step: BookingStep,
    pub fields: Vec<FieldError>,
}

fn field_names(fields: &[FieldError]) -> String {
    fields.iter().map(|field| field.field.as_str()).collect::<Vec<_>>().join(", ")
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("step {step} requires a request id from an earlier step")]
    MissingPrerequisite { step: BookingStep },
    #[error("step {step} submission failed: {message}")]
    Remote { step: BookingStep, status: Option<u16>, message: String },
    #[error("{label} has no usable coordinates; set its address again before submitting")]
    StaleCoordinates { step: BookingStep, stop_index: usize, label: String },
    #[error(transparent)]
    Flow(#[from] FlowTransitionError),
    #[error("step number {0} is outside 1..=4")]
    InvalidStep(u8),
}

impl BookingError {
    /// The step whose error slot this failure belongs to.
    pub fn step(&self) -> Option<BookingStep> {
        match self {
            Self::Validation(error) => Some(error.step),
            Self::MissingPrerequisite { step }
            | Self::Remote { step, .. }
            | Self::StaleCoordinates { step, .. } => Some(*step),
            Self::Flow(FlowTransitionError::StepNotSubmitted { step }) => Some(*step),
            Self::InvalidStep(_) => None,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid bid transition from {from:?} to {to:?}")]
    InvalidBidTransition { from: BidStatus, to: BidStatus },
    #[error("bid {bid_id} is {} and can no longer be changed", .status.as_str())]
    BidNotMutable { bid_id: BidId, status: BidStatus },
    #[error("stop index {index} is out of range for {len} stops")]
    StopIndexOutOfRange { index: usize, len: usize },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::Internal { .. } => "internal",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let unassigned = || "unassigned".to_owned();
        match value {
            ApplicationError::Domain(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id: unassigned() }
            }
            ApplicationError::Booking(BookingError::Remote { status, message, .. })
                if status.map_or(true, |status| status >= 500) =>
            {
                Self::ServiceUnavailable { message, correlation_id: unassigned() }
            }
            ApplicationError::Booking(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id: unassigned() }
            }
            ApplicationError::Persistence(message) | ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id: unassigned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: unassigned() }
            }
        }
    }
}
