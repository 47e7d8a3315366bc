pub mod audit;
pub mod config;
pub mod coordinates;
pub mod domain;
pub mod drafts;
pub mod errors;
pub mod flows;
pub mod identity;
pub mod journey;
pub mod payload;
pub mod session;
pub mod submission;
pub mod validation;

pub use audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use coordinates::{normalize_coordinates, CoordinateShape, Coordinates};
pub use domain::bid::{Bid, BidEdit, BidId, BidStatus, Confirmation, JobId, NewBid, ProviderId};
pub use domain::draft::{Draft, DraftSource};
pub use domain::item::{CommonItem, ItemCategory, MovingItem};
pub use domain::request::{RequestId, RequestType, ServiceRequest};
pub use domain::stop::{JourneyStop, StopLocation, StopType};
pub use drafts::DraftBook;
pub use errors::{ApplicationError, BookingError, DomainError, InterfaceError, ValidationError};
pub use flows::{BookingStep, FlowEngine};
pub use identity::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use journey::{switch_request_type, Reprojection};
pub use payload::{format_payload, format_payload_with, CoordinatePolicy, FormatOptions, StepPayload};
pub use session::{ApplyStatus, BookingSession};
pub use submission::{
    DraftWrite, PreparedSubmission, SubmissionFailure, SubmissionOutcome, SubmissionResult,
    SubmissionTicket, SubmitOptions,
};
pub use validation::validate_step;
