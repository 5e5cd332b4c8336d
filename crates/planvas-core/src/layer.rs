//! Layers: ordered, independently visible/lockable element groupings.

use crate::element::ElementId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for layers.
pub type LayerId = Uuid;

/// A named layer and its member elements (back to front).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub name: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    /// Member ids; kept consistent with each element's `layer_id` by the scene.
    #[serde(default)]
    pub(crate) elements: Vec<ElementId>,
}

fn default_true() -> bool {
    true
}

impl Layer {
    /// Create an empty, visible, unlocked layer.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    pub(crate) fn with_id(id: LayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            locked: false,
            elements: Vec::new(),
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Member element ids.
    pub fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains(&id)
    }

    pub(crate) fn add_member(&mut self, id: ElementId) {
        if !self.elements.contains(&id) {
            self.elements.push(id);
        }
    }

    pub(crate) fn remove_member(&mut self, id: ElementId) {
        self.elements.retain(|&member| member != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership() {
        let mut layer = Layer::new("Background");
        let id = Uuid::new_v4();
        layer.add_member(id);
        layer.add_member(id);
        assert_eq!(layer.elements(), &[id]);
        layer.remove_member(id);
        assert!(!layer.contains(id));
    }

    #[test]
    fn test_defaults_on_deserialize() {
        let json = format!(r#"{{"id": "{}", "name": "L"}}"#, Uuid::new_v4());
        let layer: Layer = serde_json::from_str(&json).unwrap();
        assert!(layer.visible);
        assert!(!layer.locked);
        assert!(layer.elements().is_empty());
    }
}
