use async_trait::async_trait;
use thiserror::Error;

use movemate_core::domain::draft::Draft;

pub mod drafts;
pub mod kv;
pub mod memory;

pub use drafts::{LocalDraftRepository, DRAFTS_KEY};
pub use kv::SqlKeyValueStore;
pub use memory::InMemoryKeyValueStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Durable client storage: string values under string keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError>;
    async fn put(&self, key: &str, value: &str) -> Result<(), RepositoryError>;
    async fn delete(&self, key: &str) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait DraftRepository: Send + Sync {
    async fn load_local(&self) -> Result<Vec<Draft>, RepositoryError>;
    /// Replaces the whole stored local set.
    async fn save_local(&self, drafts: &[Draft]) -> Result<(), RepositoryError>;
}

#[async_trait]
impl<S> KeyValueStore for std::sync::Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        (**self).put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool, RepositoryError> {
        (**self).delete(key).await
    }
}

#[async_trait]
impl<R> DraftRepository for std::sync::Arc<R>
where
    R: DraftRepository + ?Sized,
{
    async fn load_local(&self) -> Result<Vec<Draft>, RepositoryError> {
        (**self).load_local().await
    }

    async fn save_local(&self, drafts: &[Draft]) -> Result<(), RepositoryError> {
        (**self).save_local(drafts).await
    }
}
