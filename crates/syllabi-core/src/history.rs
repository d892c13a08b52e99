//! Bounded, deduplicated, most-recent-first list of saved curricula for the
//! active identity.
//!
//! The list is cached in memory and written through to the store. Writers
//! are serialised by an async gate so saves land in issue order; readers see
//! either the old list or the new one, never a partial update.

use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::error::{Result, SyllabiError};
use crate::model::CurriculumArtifact;
use crate::storage::{Storage, StorageBackend};
use crate::store::SessionStore;

pub const DEFAULT_MAX_ENTRIES: usize = 20;

#[derive(Debug, Default)]
struct Loaded {
    owner: Option<String>,
    entries: Vec<CurriculumArtifact>,
    /// Bumped whenever the owner changes (load or clear). A write that
    /// started under an older generation must not repopulate the cache.
    generation: u64,
}

pub struct HistoryManager<S = Storage> {
    store: Arc<SessionStore<S>>,
    max_entries: usize,
    state: RwLock<Loaded>,
    write_gate: tokio::sync::Mutex<()>,
}

impl<S: StorageBackend> HistoryManager<S> {
    pub fn new(store: Arc<SessionStore<S>>, max_entries: usize) -> Self {
        Self {
            store,
            max_entries: max_entries.max(1),
            state: RwLock::new(Loaded::default()),
            write_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Replace the cache with `email`'s persisted list.
    pub async fn load(&self, email: &str) -> Result<Vec<CurriculumArtifact>> {
        let _gate = self.write_gate.lock().await;
        let mut entries = self.store.history(email).await?;
        entries.truncate(self.max_entries);
        tracing::debug!(email, count = entries.len(), "history loaded");
        let mut state = self.write_state()?;
        *state = Loaded {
            owner: Some(email.to_string()),
            entries: entries.clone(),
            generation: state.generation + 1,
        };
        Ok(entries)
    }

    /// Put `artifact` at the head of the list, replacing any entry with the
    /// same id, and persist. Returns the new list.
    pub async fn save(&self, artifact: &CurriculumArtifact) -> Result<Vec<CurriculumArtifact>> {
        let _gate = self.write_gate.lock().await;
        let (owner, current, generation) = self.snapshot()?;
        let owner = owner.ok_or(SyllabiError::NotAuthenticated)?;

        let mut next = Vec::with_capacity(current.len() + 1);
        next.push(artifact.clone());
        next.extend(current.into_iter().filter(|a| a.id != artifact.id));
        next.truncate(self.max_entries);

        self.store.save_history(&owner, &next).await?;
        tracing::debug!(id = %artifact.id, count = next.len(), "history saved");
        self.replace_entries(generation, next.clone())?;
        Ok(next)
    }

    /// Remove the entry with `id`. An absent id is a no-op that returns the
    /// unchanged list without writing.
    pub async fn delete(&self, id: Uuid) -> Result<Vec<CurriculumArtifact>> {
        let _gate = self.write_gate.lock().await;
        let (owner, current, generation) = self.snapshot()?;
        let owner = owner.ok_or(SyllabiError::NotAuthenticated)?;

        if !current.iter().any(|a| a.id == id) {
            return Ok(current);
        }
        let next: Vec<_> = current.into_iter().filter(|a| a.id != id).collect();

        self.store.save_history(&owner, &next).await?;
        tracing::debug!(%id, count = next.len(), "history entry deleted");
        self.replace_entries(generation, next.clone())?;
        Ok(next)
    }

    pub fn list(&self) -> Vec<CurriculumArtifact> {
        self.state
            .read()
            .map(|s| s.entries.clone())
            .unwrap_or_default()
    }

    pub fn get(&self, id: Uuid) -> Option<CurriculumArtifact> {
        self.state
            .read()
            .ok()
            .and_then(|s| s.entries.iter().find(|a| a.id == id).cloned())
    }

    pub fn owner(&self) -> Option<String> {
        self.state.read().ok().and_then(|s| s.owner.clone())
    }

    /// Drop the cached list (logout). The persisted list is untouched, and
    /// writes still in flight no longer reach the cache.
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.write() {
            *state = Loaded {
                generation: state.generation + 1,
                ..Loaded::default()
            };
        }
    }

    fn snapshot(&self) -> Result<(Option<String>, Vec<CurriculumArtifact>, u64)> {
        let state = self
            .state
            .read()
            .map_err(|e| SyllabiError::Storage(format!("history lock poisoned: {e}")))?;
        Ok((state.owner.clone(), state.entries.clone(), state.generation))
    }

    fn replace_entries(&self, generation: u64, entries: Vec<CurriculumArtifact>) -> Result<()> {
        let mut state = self.write_state()?;
        if state.generation != generation {
            tracing::debug!("history owner changed during write, cache left alone");
            return Err(SyllabiError::NotAuthenticated);
        }
        state.entries = entries;
        Ok(())
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, Loaded>> {
        self.state
            .write()
            .map_err(|e| SyllabiError::Storage(format!("history lock poisoned: {e}")))
    }
}
