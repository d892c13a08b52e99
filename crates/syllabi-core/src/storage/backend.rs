use crate::error::Result;

use super::StorageKey;

/// Key/value persistence port. Values are opaque JSON documents; the typed
/// layer on top lives in [`SessionStore`](crate::store::SessionStore).
pub trait StorageBackend: Send + Sync {
    fn get(
        &self,
        key: &StorageKey,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    /// Insert or replace the value under `key`.
    fn set(
        &self,
        key: &StorageKey,
        value: String,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Remove the value under `key`. Removing an absent key is not an error.
    fn remove(&self, key: &StorageKey) -> impl std::future::Future<Output = Result<()>> + Send;
}
