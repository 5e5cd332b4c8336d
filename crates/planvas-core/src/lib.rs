//! Planvas Core Library
//!
//! Scene state and spatial interaction for the Planvas whiteboard: the
//! element model, layers, viewport math, hit testing, move/resize gestures,
//! frames, undo history, document import/export and the collaboration
//! presence overlay. Rendering and transport live elsewhere.

pub mod collaboration;
pub mod color;
pub mod config;
pub mod document;
pub mod element;
pub mod error;
pub mod frame;
pub mod history;
pub mod layer;
pub mod manipulation;
pub mod scene;
pub mod spatial;
pub mod storage;
pub mod text;
pub mod viewport;

pub use collaboration::{
    CollaborationOverlay, ElementLock, Notification, RemoteEvent, RemoteEventKind,
};
pub use color::SerializableColor;
pub use config::{EngineConfig, ToolDefaults, ToolKind, ToolSettings};
pub use document::{ImportOptions, SceneDocument};
pub use element::{Element, ElementId, ElementKind, ShapeKind, Style};
pub use error::{Result, SceneError};
pub use history::{History, Snapshot};
pub use hit_test::ResizeHandle;
pub use layer::{Layer, LayerId};
pub use manipulation::{Gesture, GestureKind, Interaction, InteractionState};
pub use scene::{ElementPatch, Scene};
pub use spatial::SpatialIndex;
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use text::TextPayload;
pub use viewport::Viewport;
