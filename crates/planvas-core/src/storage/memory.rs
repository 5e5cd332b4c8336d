//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult, decode};
use crate::document::SceneDocument;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// In-memory storage for tests and ephemeral sessions.
///
/// Documents are kept as serialized JSON so loads behave like a real backend.
#[derive(Default)]
pub struct MemoryStorage {
    documents: RwLock<BTreeMap<String, String>>,
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {e}"))
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, document: &SceneDocument) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let json = document.to_json();
        Box::pin(async move {
            let json = json?;
            let mut docs = self.documents.write().map_err(lock_error)?;
            log::info!("Saved document {id} ({} bytes) to memory", json.len());
            docs.insert(id, json);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<SceneDocument>> {
        let id = id.to_string();
        Box::pin(async move {
            let docs = self.documents.read().map_err(lock_error)?;
            let json = docs.get(&id).ok_or_else(|| StorageError::NotFound(id.clone()))?;
            decode(&id, json)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut docs = self.documents.write().map_err(lock_error)?;
            docs.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let docs = self.documents.read().map_err(lock_error)?;
            Ok(docs.keys().cloned().collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let docs = self.documents.read().map_err(lock_error)?;
            Ok(docs.contains_key(&id))
        })
    }
}
