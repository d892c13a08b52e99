mod backend;
mod memory;
mod sqlite;

pub use backend::StorageBackend;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::config::SyllabiConfig;
use crate::error::{Result, SyllabiError};

/// Who a stored resource belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Profile-wide data (registered identities, the active session).
    Global,
    /// Data owned by one identity, keyed by email.
    Identity(String),
}

/// What a stored resource is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Identities,
    ActiveSession,
    History,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identities => "identities",
            Self::ActiveSession => "active_session",
            Self::History => "history",
        }
    }
}

/// Compound storage key. Backends resolve both parts separately so no email
/// can ever collide with another key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    pub scope: Scope,
    pub kind: ResourceKind,
}

impl StorageKey {
    pub fn global(kind: ResourceKind) -> Self {
        Self {
            scope: Scope::Global,
            kind,
        }
    }

    pub fn identity(email: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            scope: Scope::Identity(email.into()),
            kind,
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.scope {
            Scope::Global => write!(f, "global/{}", self.kind.as_str()),
            Scope::Identity(email) => write!(f, "{email}/{}", self.kind.as_str()),
        }
    }
}

/// Enum wrapper for storage backends. Dispatches to the concrete implementation.
/// Using an enum instead of `Box<dyn StorageBackend>` because the trait uses RPITIT.
pub enum Storage {
    Sqlite(SqliteStorage),
    Memory(MemoryStorage),
}

impl StorageBackend for Storage {
    async fn get(&self, key: &StorageKey) -> Result<Option<String>> {
        match self {
            Storage::Sqlite(s) => s.get(key).await,
            Storage::Memory(s) => s.get(key).await,
        }
    }

    async fn set(&self, key: &StorageKey, value: String) -> Result<()> {
        match self {
            Storage::Sqlite(s) => s.set(key, value).await,
            Storage::Memory(s) => s.set(key, value).await,
        }
    }

    async fn remove(&self, key: &StorageKey) -> Result<()> {
        match self {
            Storage::Sqlite(s) => s.remove(key).await,
            Storage::Memory(s) => s.remove(key).await,
        }
    }
}

impl Storage {
    /// Human-readable location, for status output.
    pub fn describe(&self) -> String {
        match self {
            Storage::Sqlite(s) => format!("sqlite ({})", s.path().display()),
            Storage::Memory(_) => "memory".to_string(),
        }
    }
}

/// Create a storage backend from the given configuration.
pub fn create_backend(config: &SyllabiConfig) -> Result<Storage> {
    match config.storage.backend.as_str() {
        "sqlite" => {
            let path = match &config.storage.path {
                Some(p) => std::path::PathBuf::from(p),
                None => default_sqlite_path()?,
            };
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        SyllabiError::Storage(format!(
                            "failed to create database directory {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
            }
            let storage = SqliteStorage::open(&path)?;
            Ok(Storage::Sqlite(storage))
        }
        "memory" => Ok(Storage::Memory(MemoryStorage::new())),
        other => Err(SyllabiError::Config(format!(
            "unknown storage backend: {other}"
        ))),
    }
}

/// Default SQLite path: `~/.config/syllabi/syllabi.db`
fn default_sqlite_path() -> Result<std::path::PathBuf> {
    crate::config::config_dir()
        .map(|p| p.join("syllabi.db"))
        .ok_or_else(|| SyllabiError::Config("cannot determine config directory".to_string()))
}
