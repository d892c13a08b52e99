//! Typed persistence over the key/value [`StorageBackend`] port.
//!
//! Layout:
//! - `{Global, Identities}`: every registered identity, as one JSON list
//! - `{Global, ActiveSession}`: the logged-in session, absent when logged out
//! - `{Identity(email), History}`: that identity's saved curricula, most recent first

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::model::{CurriculumArtifact, Identity, Session};
use crate::storage::{ResourceKind, Storage, StorageBackend, StorageKey};

pub struct SessionStore<S = Storage> {
    backend: S,
}

impl<S: StorageBackend> SessionStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub async fn identities(&self) -> Result<Vec<Identity>> {
        Ok(self
            .read(&StorageKey::global(ResourceKind::Identities))
            .await?
            .unwrap_or_default())
    }

    pub async fn save_identities(&self, identities: &[Identity]) -> Result<()> {
        self.write(&StorageKey::global(ResourceKind::Identities), &identities)
            .await
    }

    pub async fn active_session(&self) -> Result<Option<Session>> {
        self.read(&StorageKey::global(ResourceKind::ActiveSession))
            .await
    }

    pub async fn set_active_session(&self, session: &Session) -> Result<()> {
        self.write(&StorageKey::global(ResourceKind::ActiveSession), session)
            .await
    }

    pub async fn clear_active_session(&self) -> Result<()> {
        self.backend
            .remove(&StorageKey::global(ResourceKind::ActiveSession))
            .await
    }

    pub async fn history(&self, email: &str) -> Result<Vec<CurriculumArtifact>> {
        Ok(self
            .read(&StorageKey::identity(email, ResourceKind::History))
            .await?
            .unwrap_or_default())
    }

    pub async fn save_history(&self, email: &str, entries: &[CurriculumArtifact]) -> Result<()> {
        self.write(&StorageKey::identity(email, ResourceKind::History), &entries)
            .await
    }

    async fn read<T: DeserializeOwned>(&self, key: &StorageKey) -> Result<Option<T>> {
        match self.backend.get(key).await? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)?;
                tracing::debug!(key = %key, bytes = raw.len(), "store read");
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &StorageKey, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        tracing::debug!(key = %key, bytes = raw.len(), "store write");
        self.backend.set(key, raw).await
    }
}
