use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BidId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderId(pub String);

impl fmt::Display for BidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRef {
    pub id: ProviderId,
    #[serde(default)]
    pub name: Option<String>,
}

/// A provider's priced offer against a posted job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    #[serde(default)]
    pub job_id: Option<JobId>,
    pub provider: ProviderRef,
    pub amount: Decimal,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: BidStatus,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Bid {
    pub fn can_transition_to(&self, next: BidStatus) -> bool {
        matches!(
            (self.status, next),
            (BidStatus::Pending, BidStatus::Accepted) | (BidStatus::Pending, BidStatus::Rejected)
        )
    }

    /// Only pending bids may be edited or deleted from the client.
    pub fn ensure_mutable(&self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::BidNotMutable { bid_id: self.id.clone(), status: self.status });
        }
        Ok(())
    }
}

/// Amounts are carried at currency scale: two decimal places, half away from zero.
pub fn currency_scaled(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBid {
    pub job_id: JobId,
    pub provider_id: ProviderId,
    pub amount: Decimal,
    #[serde(default)]
    pub message: Option<String>,
}

impl NewBid {
    pub fn validate(&self) -> Result<Self, DomainError> {
        let amount = currency_scaled(self.amount);
        if amount <= Decimal::ZERO {
            return Err(DomainError::InvariantViolation("bid amount must be positive".to_string()));
        }
        Ok(Self { amount, ..self.clone() })
    }
}

/// Fields a provider may change on a pending bid.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BidEdit {
    pub fn validate(&self) -> Result<Self, DomainError> {
        if self.amount.is_none() && self.message.is_none() {
            return Err(DomainError::InvariantViolation(
                "bid edit must change the amount or the message".to_string(),
            ));
        }
        let amount = self.amount.map(currency_scaled);
        if amount.is_some_and(|amount| amount <= Decimal::ZERO) {
            return Err(DomainError::InvariantViolation("bid amount must be positive".to_string()));
        }
        Ok(Self { amount, message: self.message.clone() })
    }
}

/// Explicit user consent for an irreversible bid operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    NotConfirmed,
}

impl Confirmation {
    pub fn from_flag(confirmed: bool) -> Self {
        if confirmed {
            Self::Confirmed
        } else {
            Self::NotConfirmed
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }
}
