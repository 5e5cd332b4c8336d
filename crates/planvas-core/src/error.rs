//! Error types for fatal scene conditions.
//!
//! Normal UI-driven misuse (stale ids, undersized geometry, unknown layers on
//! import) never produces an error; those cases degrade to a safe state. Only
//! documents that cannot be trusted at all are reported here.

use crate::element::ElementId;
use thiserror::Error;

/// Fatal scene errors.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Failed to parse scene document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Duplicate element id in document: {0}")]
    DuplicateElementId(ElementId),
    #[error("Invalid scene document: {0}")]
    InvalidDocument(String),
}

/// Result type for fallible scene operations.
pub type Result<T> = std::result::Result<T, SceneError>;
