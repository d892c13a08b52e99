use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{Result, SyllabiError};

use super::{StorageBackend, StorageKey};

/// Volatile storage for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<StorageKey, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<StorageKey, String>>> {
        self.entries
            .lock()
            .map_err(|e| SyllabiError::Storage(format!("memory storage lock poisoned: {e}")))
    }
}

impl StorageBackend for MemoryStorage {
    async fn get(&self, key: &StorageKey) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &StorageKey, value: String) -> Result<()> {
        self.lock()?.insert(key.clone(), value);
        Ok(())
    }

    async fn remove(&self, key: &StorageKey) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
