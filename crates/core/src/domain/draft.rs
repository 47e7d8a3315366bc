use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::request::{RequestId, ServiceRequest};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftSource {
    /// Cached in durable client storage.
    Local,
    /// Fetched from the drafts endpoint; read-only on the client.
    Api,
}

impl DraftSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Api => "api",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Self::Local),
            "api" => Some(Self::Api),
            _ => None,
        }
    }
}

/// A persisted snapshot of a partially completed booking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: RequestId,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub data: ServiceRequest,
    pub source: DraftSource,
}
