//! Libraries held as JSON strings in process memory.

use super::{BoxFuture, Storage, StorageError, StorageResult, decode, encode};
use crate::store::AnnotationLibrary;
use std::collections::HashMap;
use std::sync::RwLock;

/// Nothing survives the process. Libraries are kept JSON-encoded, the same
/// as on disk.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("annotation map poisoned: {e}"))
}

impl Storage for MemoryStorage {
    fn save(&self, key: &str, library: &AnnotationLibrary) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let json = encode(library);
        Box::pin(async move {
            let json = json?;
            self.entries.write().map_err(poisoned)?.insert(key, json);
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<AnnotationLibrary>> {
        let key = key.to_string();
        Box::pin(async move {
            let entries = self.entries.read().map_err(poisoned)?;
            let json = entries.get(&key).ok_or_else(|| StorageError::NotFound(key.clone()))?;
            decode(&key, json)
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            self.entries.write().map_err(poisoned)?.remove(&key);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let entries = self.entries.read().map_err(poisoned)?;
            Ok(entries.keys().cloned().collect())
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.entries.read().map_err(poisoned)?.contains_key(&key)) })
    }
}
