use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::error::{Result, SyllabiError};
use crate::generation::CurriculumGenerator;
use crate::history::HistoryManager;
use crate::identity::IdentityManager;
use crate::model::*;
use crate::session::CurriculumSession;
use crate::storage::{Storage, StorageBackend};
use crate::store::SessionStore;

/// Everything one profile needs: identities, the active session, its history,
/// and the current curriculum. Curriculum and history operations require a
/// logged-in identity.
pub struct Workbench<G, S = Storage> {
    identities: IdentityManager<S>,
    history: Arc<HistoryManager<S>>,
    curriculum: CurriculumSession<G, S>,
    session: RwLock<Option<Session>>,
}

impl<G: CurriculumGenerator, S: StorageBackend> Workbench<G, S> {
    pub fn new(backend: S, generator: G, max_history: usize) -> Self {
        let store = Arc::new(SessionStore::new(backend));
        let history = Arc::new(HistoryManager::new(Arc::clone(&store), max_history));
        Self {
            identities: IdentityManager::new(store),
            curriculum: CurriculumSession::new(generator, Arc::clone(&history)),
            history,
            session: RwLock::new(None),
        }
    }

    /// Re-establish a persisted session (process restart). Returns it if one existed.
    pub async fn restore(&self) -> Result<Option<Session>> {
        let Some(session) = self.identities.active().await? else {
            return Ok(None);
        };
        self.begin(session.clone()).await?;
        tracing::info!(email = session.email(), "session restored");
        Ok(Some(session))
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        let session = self.identities.register(name, email, password).await?;
        self.begin(session.clone()).await?;
        Ok(session)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.identities.login(email, password).await?;
        self.begin(session.clone()).await?;
        Ok(session)
    }

    /// End the session: clears the cached history and the current artifact.
    pub async fn logout(&self) -> Result<()> {
        self.curriculum.clear();
        self.history.clear();
        self.set_session(None);
        self.identities.logout().await
    }

    pub fn session(&self) -> Option<Session> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    pub fn generator(&self) -> &G {
        self.curriculum.generator()
    }

    pub fn is_generating(&self) -> bool {
        self.curriculum.is_generating()
    }

    // -- curriculum --

    pub async fn create(&self, request: CurriculumRequest) -> Result<CurriculumArtifact> {
        self.require_session()?;
        self.curriculum.create(request).await
    }

    pub async fn regenerate(&self, feedback: &str) -> Result<CurriculumArtifact> {
        self.require_session()?;
        self.curriculum.regenerate(feedback).await
    }

    pub async fn edit_field(&self, edit: &FieldEdit) -> Result<CurriculumArtifact> {
        self.require_session()?;
        self.curriculum.edit_field(edit).await
    }

    pub async fn select(&self, id: Uuid) -> Result<CurriculumArtifact> {
        self.require_session()?;
        self.curriculum.select(id).await
    }

    pub fn current(&self) -> Result<Option<CurriculumArtifact>> {
        self.require_session()?;
        Ok(self.curriculum.current())
    }

    /// The current artifact, or `NoActiveArtifact`.
    pub fn require_current(&self) -> Result<CurriculumArtifact> {
        self.current()?.ok_or(SyllabiError::NoActiveArtifact)
    }

    // -- history --

    pub fn history(&self) -> Result<Vec<CurriculumArtifact>> {
        self.require_session()?;
        Ok(self.history.list())
    }

    pub fn history_entry(&self, id: Uuid) -> Result<CurriculumArtifact> {
        self.require_session()?;
        self.history
            .get(id)
            .ok_or_else(|| SyllabiError::NotFound(format!("curriculum {id}")))
    }

    /// Delete a history entry. The current artifact is dropped if it was the one deleted.
    pub async fn delete(&self, id: Uuid) -> Result<Vec<CurriculumArtifact>> {
        self.require_session()?;
        let list = self.history.delete(id).await?;
        self.curriculum.forget(id);
        Ok(list)
    }

    async fn begin(&self, session: Session) -> Result<()> {
        self.curriculum.clear();
        self.history.load(session.email()).await?;
        self.set_session(Some(session));
        Ok(())
    }

    fn set_session(&self, session: Option<Session>) {
        if let Ok(mut slot) = self.session.write() {
            *slot = session;
        }
    }

    fn require_session(&self) -> Result<Session> {
        self.session().ok_or(SyllabiError::NotAuthenticated)
    }
}
