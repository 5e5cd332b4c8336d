//! Storage abstraction for persisting scene documents.
//!
//! Backends store documents as JSON and run them through
//! [`document::deserialize`](crate::document::deserialize) on load, so a
//! loaded document is always repaired and consistent.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::config::EngineConfig;
use crate::document::{self, ImportOptions, SceneDocument};
use crate::error::SceneError;
use crate::scene::Scene;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<SceneError> for StorageError {
    fn from(err: SceneError) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future returned by storage backends.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A place scene documents can be saved to and loaded from, keyed by id.
pub trait Storage: Send + Sync {
    /// Save a document, replacing any previous one with the same id.
    fn save(&self, id: &str, document: &SceneDocument) -> BoxFuture<'_, StorageResult<()>>;

    /// Load and validate a document.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<SceneDocument>>;

    /// Delete a document. Deleting a missing id is not an error.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all document ids, sorted.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a document exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Parse stored JSON for `id` into a validated document.
fn decode(id: &str, json: &str) -> StorageResult<SceneDocument> {
    document::deserialize(json, &ImportOptions::default())
        .map_err(|e| StorageError::Serialization(format!("Failed to parse {id}: {e}")))
}

/// Save the current contents of `scene` under `id`.
pub async fn save_scene(storage: &dyn Storage, id: &str, scene: &Scene) -> StorageResult<()> {
    storage.save(id, &scene.serialize()).await
}

/// Load the document `id` into a fresh scene.
pub async fn load_scene(
    storage: &dyn Storage,
    id: &str,
    config: EngineConfig,
) -> StorageResult<Scene> {
    let document = storage.load(id).await?;
    Ok(Scene::from_document(document, config)?)
}

#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}
