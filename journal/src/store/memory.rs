use std::collections::HashMap;
use std::sync::Mutex;

use super::KvStore;
use super::check_key;
use crate::error::JournalError;
use crate::error::Result;

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        check_key(key)?;
        let values = self
            .values
            .lock()
            .map_err(|_| JournalError::StorageUnavailable("memory store poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        check_key(key)?;
        let mut values = self
            .values
            .lock()
            .map_err(|_| JournalError::StorageUnavailable("memory store poisoned".to_string()))?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}
