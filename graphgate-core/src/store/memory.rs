//! Process-local session backend.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{SessionStore, StoreError, TOKEN_KEY};

/// One user's session held in memory.
///
/// Backs the reference server's cookie sessions and the tests. Concurrent
/// writes from requests of the same user are last-write-wins; nothing
/// survives a restart.
#[derive(Default)]
pub struct MemorySession {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing values, e.g. a session restored by the host.
    pub fn with_data(values: HashMap<String, String>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    /// Drop every value.
    pub fn clear(&self) {
        self.values.write().clear();
    }
}

impl std::fmt::Debug for MemorySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values = self.values.read();
        f.debug_struct("MemorySession")
            .field("keys", &values.len())
            .field("has_token", &values.contains_key(TOKEN_KEY))
            .finish()
    }
}

#[async_trait]
impl SessionStore for MemorySession {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.write().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.write().remove(key);
        Ok(())
    }

    async fn has(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.values.read().contains_key(key))
    }
}
