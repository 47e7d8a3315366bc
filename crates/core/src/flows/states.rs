use std::fmt;

use serde::{Deserialize, Serialize};

/// One screen of the four-step booking flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    Contact,
    Locations,
    Items,
    Schedule,
}

impl BookingStep {
    pub const FIRST: Self = Self::Contact;
    pub const LAST: Self = Self::Schedule;
    pub const ALL: [Self; 4] = [Self::Contact, Self::Locations, Self::Items, Self::Schedule];

    pub fn number(self) -> u8 {
        match self {
            Self::Contact => 1,
            Self::Locations => 2,
            Self::Items => 3,
            Self::Schedule => 4,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Contact),
            2 => Some(Self::Locations),
            3 => Some(Self::Items),
            4 => Some(Self::Schedule),
            _ => None,
        }
    }

    /// Next step, clamped at the last one.
    pub fn next(self) -> Self {
        Self::from_number(self.number() + 1).unwrap_or(Self::LAST)
    }

    /// Previous step, clamped at the first one.
    pub fn previous(self) -> Self {
        Self::from_number(self.number().saturating_sub(1)).unwrap_or(Self::FIRST)
    }

    pub fn error_key(self) -> String {
        format!("step{}", self.number())
    }
}

impl fmt::Display for BookingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingEvent {
    AdvanceRequested,
    RetreatRequested,
    JumpRequested(BookingStep),
    ResetRequested,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlowContext {
    /// Whether the current step's latest remote submission succeeded.
    pub current_step_submitted: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAction {
    ClearStepSubmission,
    RevalidateOnAdvance,
    DiscardSessionState,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: BookingStep,
    pub to: BookingStep,
    pub event: BookingEvent,
    pub actions: Vec<FlowAction>,
}
