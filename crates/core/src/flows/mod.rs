pub mod engine;
pub mod states;

pub use engine::{FlowDefinition, FlowEngine, FlowTransitionError, FourStepBooking};
pub use states::{BookingEvent, BookingStep, FlowAction, FlowContext, TransitionOutcome};
