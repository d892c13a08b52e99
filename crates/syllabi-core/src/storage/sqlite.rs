use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, SyllabiError};

use super::{Scope, StorageBackend, StorageKey};

/// SQLite-backed key/value storage for a Syllabi profile.
///
/// Uses a single `Connection` behind `Arc<Mutex<>>` so it can be shared
/// across async tasks.  All blocking SQLite calls go through
/// [`with_conn`](Self::with_conn) which runs them on the Tokio blocking
/// thread-pool.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl SqliteStorage {
    /// Open (or create) a file-backed SQLite database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)
            .map_err(|e| SyllabiError::Storage(format!("failed to open SQLite database: {e}")))?;

        Self::configure_and_init(conn, path)
    }

    /// Open an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            SyllabiError::Storage(format!("failed to open in-memory SQLite database: {e}"))
        })?;

        Self::configure_and_init(conn, PathBuf::from(":memory:"))
    }

    /// Return the path this database was opened with (`:memory:` for in-memory).
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── helpers ────────────────────────────────────────────────────────

    fn configure_and_init(conn: Connection, path: PathBuf) -> Result<Self> {
        // WAL mode for better concurrent-read performance.
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(|e| SyllabiError::Storage(format!("failed to set WAL mode: {e}")))?;

        let storage = Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        };

        storage.create_tables()?;
        Ok(storage)
    }

    /// Create the key/value table (idempotent).
    ///
    /// `scope` is the empty string for profile-wide rows and the owner's
    /// email otherwise; emails are never empty.
    fn create_tables(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SyllabiError::Storage(format!("failed to acquire database lock: {e}")))?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv (
                scope TEXT NOT NULL,
                kind TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (scope, kind)
            );
            ",
        )
        .map_err(|e| SyllabiError::Storage(format!("failed to create tables: {e}")))?;

        Ok(())
    }

    /// Run a blocking closure against the SQLite connection on the Tokio
    /// blocking thread-pool.
    pub(crate) async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|e| {
                SyllabiError::Storage(format!("failed to acquire database lock: {e}"))
            })?;
            f(&conn)
        })
        .await
        .map_err(|e| SyllabiError::Storage(format!("task join error: {e}")))?
    }
}

fn key_columns(key: &StorageKey) -> (String, &'static str) {
    let scope = match &key.scope {
        Scope::Global => String::new(),
        Scope::Identity(email) => email.clone(),
    };
    (scope, key.kind.as_str())
}

fn sql_err(context: &'static str) -> impl Fn(rusqlite::Error) -> SyllabiError {
    move |e| SyllabiError::Storage(format!("{context}: {e}"))
}

impl StorageBackend for SqliteStorage {
    async fn get(&self, key: &StorageKey) -> Result<Option<String>> {
        let (scope, kind) = key_columns(key);
        tracing::debug!(key = %key, "sqlite get");
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT value FROM kv WHERE scope = ?1 AND kind = ?2",
                params![scope, kind],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(sql_err("failed to read value"))
        })
        .await
    }

    async fn set(&self, key: &StorageKey, value: String) -> Result<()> {
        let (scope, kind) = key_columns(key);
        tracing::debug!(key = %key, bytes = value.len(), "sqlite set");
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO kv (scope, kind, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(scope, kind) DO UPDATE SET value = excluded.value,
                                                       updated_at = excluded.updated_at",
                params![scope, kind, value, chrono::Utc::now().to_rfc3339()],
            )
            .map_err(sql_err("failed to write value"))?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, key: &StorageKey) -> Result<()> {
        let (scope, kind) = key_columns(key);
        tracing::debug!(key = %key, "sqlite remove");
        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM kv WHERE scope = ?1 AND kind = ?2",
                params![scope, kind],
            )
            .map_err(sql_err("failed to remove value"))?;
            Ok(())
        })
        .await
    }
}
