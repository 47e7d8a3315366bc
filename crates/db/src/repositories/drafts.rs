use movemate_core::domain::draft::{Draft, DraftSource};

use super::{DraftRepository, KeyValueStore, RepositoryError};

/// Storage key holding the JSON array of local drafts.
pub const DRAFTS_KEY: &str = "draftRequests";

/// Local drafts serialized as one JSON array under [`DRAFTS_KEY`].
pub struct LocalDraftRepository<S> {
    store: S,
}

impl<S> LocalDraftRepository<S>
where
    S: KeyValueStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait::async_trait]
impl<S> DraftRepository for LocalDraftRepository<S>
where
    S: KeyValueStore,
{
    async fn load_local(&self) -> Result<Vec<Draft>, RepositoryError> {
        let Some(raw) = self.store.get(DRAFTS_KEY).await? else {
            return Ok(Vec::new());
        };

        let drafts: Vec<Draft> = serde_json::from_str(&raw)
            .map_err(|error| RepositoryError::Decode(format!("{DRAFTS_KEY}: {error}")))?;
        let total = drafts.len();
        let local: Vec<Draft> =
            drafts.into_iter().filter(|draft| draft.source == DraftSource::Local).collect();
        if local.len() != total {
            tracing::warn!(
                event_name = "drafts.storage.foreign_source_skipped",
                skipped = total - local.len(),
                "stored draft list contained non-local drafts"
            );
        }
        Ok(local)
    }

    async fn save_local(&self, drafts: &[Draft]) -> Result<(), RepositoryError> {
        let local: Vec<&Draft> =
            drafts.iter().filter(|draft| draft.source == DraftSource::Local).collect();
        let raw = serde_json::to_string(&local)
            .map_err(|error| RepositoryError::Decode(format!("{DRAFTS_KEY}: {error}")))?;
        self.store.put(DRAFTS_KEY, &raw).await?;
        tracing::debug!(
            event_name = "drafts.storage.saved",
            count = local.len(),
            "local drafts persisted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use movemate_core::domain::draft::{Draft, DraftSource};
    use movemate_core::domain::request::{RequestId, RequestType, ServiceRequest};

    use super::{LocalDraftRepository, DRAFTS_KEY};
    use crate::migrations::run_pending;
    use crate::repositories::{
        DraftRepository, InMemoryKeyValueStore, KeyValueStore, RepositoryError, SqlKeyValueStore,
    };
    use crate::connect_with_settings;

    fn draft(id: &str, source: DraftSource) -> Draft {
        Draft {
            id: RequestId(id.to_string()),
            created_at: Utc::now(),
            last_modified: Utc::now(),
            data: ServiceRequest { request_type: RequestType::Journey, ..ServiceRequest::default() },
            source,
        }
    }

    #[tokio::test]
    async fn only_local_drafts_are_persisted() {
        let repository = LocalDraftRepository::new(InMemoryKeyValueStore::default());
        repository
            .save_local(&[draft("R1", DraftSource::Local), draft("R2", DraftSource::Api)])
            .await
            .expect("save");

        let loaded = repository.load_local().await.expect("load");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, RequestId("R1".to_string()));
        assert_eq!(loaded[0].data.request_type, RequestType::Journey);

        let raw = repository.store().get(DRAFTS_KEY).await.expect("get").expect("stored");
        assert!(raw.contains("\"lastModified\""));
    }

    #[tokio::test]
    async fn corrupt_storage_is_a_decode_error() {
        let store = InMemoryKeyValueStore::default();
        store.put(DRAFTS_KEY, "{not json").await.expect("put");
        let repository = LocalDraftRepository::new(store);

        assert!(matches!(repository.load_local().await, Err(RepositoryError::Decode(_))));
    }

    #[tokio::test]
    async fn sqlite_backed_drafts_survive_a_new_repository() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrations");
        let store = Arc::new(SqlKeyValueStore::new(pool));

        LocalDraftRepository::new(Arc::clone(&store))
            .save_local(&[draft("R9", DraftSource::Local)])
            .await
            .expect("save");

        let reopened = LocalDraftRepository::new(store).load_local().await.expect("load");
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened[0].id, RequestId("R9".to_string()));
    }
}
