//! Lifecycle of the single current curriculum: create, edit, regenerate, select.
//!
//! Only the generator call suspends for long. Around it:
//! - at most one create/regenerate is outstanding; a second one is rejected with `Busy`
//! - nothing is mutated while the call is pending
//! - the result is committed after the call resolves, under a commit gate that
//!   also orders edits and selections, and only after history persisted it

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::error::{Result, SyllabiError};
use crate::generation::{CurriculumGenerator, GenerationRequest};
use crate::history::HistoryManager;
use crate::model::*;
use crate::storage::{Storage, StorageBackend};

/// Single-slot token held for the duration of one generation call.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SyllabiError::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CurriculumSession<G, S = Storage> {
    generator: G,
    history: Arc<HistoryManager<S>>,
    current: Mutex<Option<CurriculumArtifact>>,
    in_flight: AtomicBool,
    commit_gate: tokio::sync::Mutex<()>,
    /// Bumped by [`clear`](Self::clear); results of calls started before a
    /// clear are discarded.
    epoch: AtomicU64,
}

impl<G: CurriculumGenerator, S: StorageBackend> CurriculumSession<G, S> {
    pub fn new(generator: G, history: Arc<HistoryManager<S>>) -> Self {
        Self {
            generator,
            history,
            current: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            commit_gate: tokio::sync::Mutex::new(()),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn current(&self) -> Option<CurriculumArtifact> {
        self.current.lock().ok().and_then(|c| c.clone())
    }

    /// The request that reproduces the current artifact's structure.
    pub fn current_request(&self) -> Option<CurriculumRequest> {
        self.current().map(|a| a.originating_request())
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Generate a brand-new artifact and make it current.
    pub async fn create(&self, request: CurriculumRequest) -> Result<CurriculumArtifact> {
        validate_request(&request)?;
        let _token = InFlight::acquire(&self.in_flight)?;
        let epoch = self.epoch.load(Ordering::Acquire);

        tracing::info!(course = %request.course_name, mode = %request.mode, "generating curriculum");
        let content = self
            .generator
            .generate(&GenerationRequest::initial(request.clone()))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "curriculum generation failed");
                SyllabiError::GenerationFailed(e)
            })?;

        let _gate = self.commit_gate.lock().await;
        self.check_epoch(epoch)?;
        let artifact = CurriculumArtifact::new(request, content);
        self.history.save(&artifact).await?;
        self.commit_current(epoch, artifact.clone())?;
        tracing::info!(id = %artifact.id, modules = artifact.content.modules.len(), "curriculum created");
        Ok(artifact)
    }

    /// Regenerate the current artifact's content from free-text feedback.
    /// Id and structural fields are preserved.
    pub async fn regenerate(&self, feedback: &str) -> Result<CurriculumArtifact> {
        let feedback = feedback.trim();
        if feedback.is_empty() {
            return Err(SyllabiError::InvalidInput("feedback cannot be empty".into()));
        }
        let prior = self.current().ok_or(SyllabiError::NoActiveArtifact)?;
        let _token = InFlight::acquire(&self.in_flight)?;
        let epoch = self.epoch.load(Ordering::Acquire);

        tracing::info!(id = %prior.id, "regenerating curriculum");
        let request =
            GenerationRequest::refinement(prior.originating_request(), feedback.to_string(), prior.clone());
        let content = self.generator.generate(&request).await.map_err(|e| {
            tracing::warn!(id = %prior.id, error = %e, "curriculum regeneration failed");
            SyllabiError::RegenerationFailed(e)
        })?;

        let _gate = self.commit_gate.lock().await;
        self.check_epoch(epoch)?;
        // Edits made to the same artifact while the call was pending are kept.
        let still_current = self.current().filter(|c| c.id == prior.id);
        let mut next = still_current.clone().unwrap_or(prior);
        next.content = content;
        next.touch();

        self.history.save(&next).await?;
        if still_current.is_some() {
            self.commit_current(epoch, next.clone())?;
        }
        tracing::info!(id = %next.id, "curriculum regenerated");
        Ok(next)
    }

    /// Apply an in-place edit to the current artifact and persist it.
    pub async fn edit_field(&self, edit: &FieldEdit) -> Result<CurriculumArtifact> {
        let _gate = self.commit_gate.lock().await;
        let epoch = self.epoch.load(Ordering::Acquire);
        let mut next = self.current().ok_or(SyllabiError::NoActiveArtifact)?;
        edit.apply(&mut next)?;
        next.touch();

        self.history.save(&next).await?;
        self.commit_current(epoch, next.clone())?;
        tracing::debug!(id = %next.id, "curriculum edited");
        Ok(next)
    }

    /// Make a history entry the current artifact.
    pub async fn select(&self, id: Uuid) -> Result<CurriculumArtifact> {
        let _gate = self.commit_gate.lock().await;
        let epoch = self.epoch.load(Ordering::Acquire);
        let artifact = self
            .history
            .get(id)
            .ok_or_else(|| SyllabiError::NotFound(format!("curriculum {id}")))?;
        self.commit_current(epoch, artifact.clone())?;
        tracing::debug!(%id, "curriculum selected");
        Ok(artifact)
    }

    /// Forget the current artifact if it is `id` (after it was deleted from history).
    pub fn forget(&self, id: Uuid) {
        if let Ok(mut current) = self.current.lock() {
            if current.as_ref().is_some_and(|c| c.id == id) {
                *current = None;
            }
        }
    }

    /// Drop the current artifact and discard any pending result (logout).
    pub fn clear(&self) {
        let current = self.current.lock();
        self.epoch.fetch_add(1, Ordering::AcqRel);
        if let Ok(mut current) = current {
            *current = None;
        }
    }

    fn check_epoch(&self, started: u64) -> Result<()> {
        if self.epoch.load(Ordering::Acquire) != started {
            tracing::debug!("session ended during generation, discarding result");
            return Err(SyllabiError::NotAuthenticated);
        }
        Ok(())
    }

    /// Make `artifact` current unless the session was cleared since `started`.
    /// Checked under the same lock `clear` takes.
    fn commit_current(&self, started: u64, artifact: CurriculumArtifact) -> Result<()> {
        let mut current = self
            .current
            .lock()
            .map_err(|e| SyllabiError::Storage(format!("session lock poisoned: {e}")))?;
        if self.epoch.load(Ordering::Acquire) != started {
            tracing::debug!("session ended before commit, discarding result");
            return Err(SyllabiError::NotAuthenticated);
        }
        *current = Some(artifact);
        Ok(())
    }
}
