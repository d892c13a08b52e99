use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::{Result, SyllabiError};
use crate::model::{Identity, Session};
use crate::storage::{Storage, StorageBackend};
use crate::store::SessionStore;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Characters that satisfy the symbol rule.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*";

static SYMBOL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[!@#$%^&*]").unwrap());

/// Check the password policy. The error names the first rule that fails.
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(SyllabiError::WeakPassword(format!(
            "must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(SyllabiError::WeakPassword(
            "must contain an uppercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(SyllabiError::WeakPassword("must contain a digit".into()));
    }
    if !SYMBOL_RE.is_match(password) {
        return Err(SyllabiError::WeakPassword(format!(
            "must contain one of {PASSWORD_SYMBOLS}"
        )));
    }
    Ok(())
}

/// Registration, authentication, and the active session of this profile.
pub struct IdentityManager<S = Storage> {
    store: Arc<SessionStore<S>>,
    /// Held across read, duplicate check and write of the identities list.
    register_gate: tokio::sync::Mutex<()>,
}

impl<S: StorageBackend> IdentityManager<S> {
    pub fn new(store: Arc<SessionStore<S>>) -> Self {
        Self {
            store,
            register_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Register a new identity and log it in.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(SyllabiError::InvalidInput("name cannot be empty".into()));
        }
        if email.is_empty() {
            return Err(SyllabiError::InvalidInput("email cannot be empty".into()));
        }
        validate_password(password)?;

        {
            let _gate = self.register_gate.lock().await;
            let mut identities = self.store.identities().await?;
            if identities.iter().any(|i| i.email == email) {
                return Err(SyllabiError::DuplicateIdentity);
            }
            identities.push(Identity::new(name.to_string(), email.to_string(), password)?);
            self.store.save_identities(&identities).await?;
        }
        tracing::info!(email, "identity registered");

        self.login(email, password).await
    }

    /// Authenticate and persist the active session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim();
        let identities = self.store.identities().await?;
        let identity = identities
            .iter()
            .find(|i| i.email == email)
            .filter(|i| i.credential.verify(password))
            .ok_or(SyllabiError::InvalidCredentials)?;

        let session = Session::new(identity.profile());
        self.store.set_active_session(&session).await?;
        tracing::info!(email, "logged in");
        Ok(session)
    }

    /// End the active session. Durable history is untouched.
    pub async fn logout(&self) -> Result<()> {
        self.store.clear_active_session().await?;
        tracing::info!("logged out");
        Ok(())
    }

    /// The persisted active session, if any.
    pub async fn active(&self) -> Result<Option<Session>> {
        self.store.active_session().await
    }
}
