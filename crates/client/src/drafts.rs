use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use movemate_core::domain::draft::{Draft, DraftSource};
use movemate_core::domain::request::{request_id_from, RequestId, ServiceRequest};
use movemate_core::drafts::DraftBook;
use movemate_db::repositories::{DraftRepository, RepositoryError};

use crate::endpoints;
use crate::transport::{expect_success, ApiError, ApiRequest, ApiTransport};

#[derive(Debug, Error)]
pub enum DraftStoreError {
    #[error(transparent)]
    Storage(#[from] RepositoryError),
    #[error(transparent)]
    Remote(#[from] ApiError),
}

/// The draft collection plus its two backing sources: durable storage for
/// local drafts and the drafts endpoint for API drafts.
pub struct DraftStore<R, T> {
    book: DraftBook,
    repository: R,
    transport: T,
}

impl<R, T> DraftStore<R, T>
where
    R: DraftRepository,
    T: ApiTransport,
{
    /// Reads local drafts from storage.
    pub async fn open(repository: R, transport: T) -> Result<Self, RepositoryError> {
        let local = repository.load_local().await?;
        debug!(event_name = "drafts.loaded", count = local.len(), "local drafts loaded");
        Ok(Self { book: DraftBook::from_local(local), repository, transport })
    }

    pub fn book(&self) -> &DraftBook {
        &self.book
    }

    pub async fn upsert_local(
        &mut self,
        id: RequestId,
        data: ServiceRequest,
    ) -> Result<Draft, RepositoryError> {
        let mut candidate = self.book.clone();
        let draft = candidate.upsert_local(id, data, Utc::now()).clone();
        self.commit(candidate).await?;
        info!(event_name = "drafts.local.upserted", request_id = %draft.id, "local draft saved");
        Ok(draft)
    }

    /// Replaces the API namespace with the user's remote drafts.
    pub async fn fetch_remote(&mut self, user_id: &str) -> Result<Vec<Draft>, DraftStoreError> {
        let request = ApiRequest::get(endpoints::DRAFTS).with_query("user_id", user_id);
        let body = expect_success(&self.transport, request).await?;

        let now = Utc::now();
        let entries = match &body {
            Value::Array(entries) => entries.as_slice(),
            other => other.get("results").and_then(Value::as_array).map_or(&[][..], Vec::as_slice),
        };
        let drafts: Vec<Draft> = entries.iter().filter_map(|entry| remote_draft(entry, now)).collect();
        if drafts.len() != entries.len() {
            warn!(
                event_name = "drafts.remote.skipped",
                skipped = entries.len() - drafts.len(),
                "remote drafts without a usable id were skipped"
            );
        }

        self.book.replace_remote(drafts);
        info!(event_name = "drafts.remote.fetched", user_id, count = self.book.api().count(), "remote drafts refreshed");
        Ok(self.book.api().cloned().collect())
    }

    pub async fn remove(
        &mut self,
        id: &RequestId,
        source: DraftSource,
    ) -> Result<Option<Draft>, RepositoryError> {
        if source == DraftSource::Api {
            return Ok(self.book.remove(id, source));
        }
        let mut candidate = self.book.clone();
        let removed = candidate.remove(id, source);
        if removed.is_some() {
            self.commit(candidate).await?;
        }
        Ok(removed)
    }

    pub async fn clear_local_only(&mut self) -> Result<usize, RepositoryError> {
        let mut candidate = self.book.clone();
        let removed = candidate.clear_local_only();
        self.commit(candidate).await?;
        info!(event_name = "drafts.local.cleared", removed, "local drafts cleared");
        Ok(removed)
    }

    /// Local mutations are staged on a copy and only replace the in-memory
    /// book once storage accepted them.
    async fn commit(&mut self, candidate: DraftBook) -> Result<(), RepositoryError> {
        let local: Vec<Draft> = candidate.local().cloned().collect();
        self.repository.save_local(&local).await?;
        self.book = candidate;
        Ok(())
    }
}

/// Accepts either a stored draft (`{id, data, createdAt, lastModified}`) or a
/// bare request object from the drafts endpoint.
fn remote_draft(entry: &Value, now: DateTime<Utc>) -> Option<Draft> {
    let id = request_id_from(entry)?;
    let data_value = entry.get("data").filter(|data| data.is_object()).unwrap_or(entry);
    let mut raw = data_value.clone();
    if let Some(fields) = raw.as_object_mut() {
        fields.remove("id");
    }
    let mut data: ServiceRequest = match serde_json::from_value(raw) {
        Ok(data) => data,
        Err(error) => {
            warn!(event_name = "drafts.remote.decode_failed", request_id = %id, error = %error, "remote draft skipped");
            return None;
        }
    };
    data.id = Some(id.clone());

    let timestamp = |keys: [&str; 2]| {
        keys.iter()
            .find_map(|key| entry.get(*key).and_then(Value::as_str))
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc))
    };
    let created_at = timestamp(["createdAt", "created_at"]).unwrap_or(now);
    let last_modified = timestamp(["lastModified", "updated_at"]).unwrap_or(created_at);

    Some(Draft { id, created_at, last_modified, data, source: DraftSource::Api })
}
