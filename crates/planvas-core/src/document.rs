//! Serialized scene documents and import validation.
//!
//! A [`SceneDocument`] is the persisted form of a scene. [`deserialize`]
//! parses one and repairs it so every invariant holds before it reaches a
//! [`Scene`](crate::scene::Scene): each element references an existing layer,
//! layer member lists agree with element `layer_id`s, and no relation points
//! at a missing element.

use crate::element::{Element, ElementId};
use crate::error::{Result, SceneError};
use crate::layer::{Layer, LayerId};
use crate::viewport::Viewport;
use kurbo::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Name of the layer created when a document carries none.
pub const DEFAULT_LAYER_NAME: &str = "Layer 1";

/// Persisted scene contents.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Elements back to front.
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Layers in display order.
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub viewport: Viewport,
}

impl SceneDocument {
    /// Serialize the document to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document without any repair. Prefer [`deserialize`].
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Look up an element by id.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|el| el.id() == id)
    }

    /// Look up a layer by id.
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id() == id)
    }
}

/// Options applied while importing a document.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImportOptions {
    /// Give every element a fresh id, rewriting references to match.
    pub generate_new_ids: bool,
    /// Canvas-space offset added to every element position.
    pub offset: Vec2,
}

impl ImportOptions {
    /// Options for pasting a copy: new ids, shifted by `offset`.
    pub fn paste(offset: Vec2) -> Self {
        Self {
            generate_new_ids: true,
            offset,
        }
    }
}

/// Parse `json` and repair it into a consistent document.
pub fn deserialize(json: &str, options: &ImportOptions) -> Result<SceneDocument> {
    let document = SceneDocument::from_json(json)?;
    normalize(document, options)
}

/// Repair a parsed document in place and apply the import options.
///
/// Duplicate element ids are fatal unless fresh ids are being generated.
pub fn normalize(mut document: SceneDocument, options: &ImportOptions) -> Result<SceneDocument> {
    check_element_ids(&document, options.generate_new_ids)?;
    dedupe_layers(&mut document);

    if document.layers.is_empty() {
        log::warn!("Document has no layers; creating \"{DEFAULT_LAYER_NAME}\"");
        document.layers.push(Layer::new(DEFAULT_LAYER_NAME));
    }
    let fallback = document.layers[0].id();
    let known_layers: HashSet<LayerId> = document.layers.iter().map(Layer::id).collect();

    for element in &mut document.elements {
        if !element.size.width.is_finite() || !element.size.height.is_finite() {
            return Err(SceneError::InvalidDocument(format!(
                "element {} has a non-finite size",
                element.id()
            )));
        }
        if !known_layers.contains(&element.layer_id) {
            log::warn!(
                "Element {} references unknown layer {}; moving it to layer {}",
                element.id(),
                element.layer_id,
                fallback
            );
            element.layer_id = fallback;
        }
    }

    if options.generate_new_ids {
        regenerate_ids(&mut document.elements);
    }
    drop_dangling_references(&mut document.elements);
    rebuild_memberships(&mut document);

    if options.offset != Vec2::ZERO {
        for element in &mut document.elements {
            element.translate(options.offset);
        }
    }

    Ok(document)
}

fn check_element_ids(document: &SceneDocument, allow_duplicates: bool) -> Result<()> {
    if allow_duplicates {
        return Ok(());
    }
    let mut seen = HashSet::with_capacity(document.elements.len());
    for element in &document.elements {
        if !seen.insert(element.id()) {
            return Err(SceneError::DuplicateElementId(element.id()));
        }
    }
    Ok(())
}

fn dedupe_layers(document: &mut SceneDocument) {
    let mut seen = HashSet::new();
    document.layers.retain(|layer| {
        let first = seen.insert(layer.id());
        if !first {
            log::warn!("Dropping duplicate layer {}", layer.id());
        }
        first
    });
}

fn regenerate_ids(elements: &mut [Element]) {
    let mut mapping: HashMap<ElementId, ElementId> = HashMap::with_capacity(elements.len());
    for element in elements.iter_mut() {
        let old = element.id();
        let new = element.regenerate_id();
        // Duplicates map through their first occurrence.
        mapping.entry(old).or_insert(new);
    }
    for element in elements.iter_mut() {
        element.remap_references(&|id| mapping.get(&id).copied());
    }
}

fn drop_dangling_references(elements: &mut [Element]) {
    let existing: HashSet<ElementId> = elements.iter().map(Element::id).collect();
    for element in elements.iter_mut() {
        let own = element.id();
        let before = element.children().len();
        element.remap_references(&|id| (id != own && existing.contains(&id)).then_some(id));
        let dropped = before - element.children().len();
        if dropped > 0 {
            log::warn!("Frame {own} listed {dropped} missing children; dropped");
        }
    }
}

/// Make every layer's member list mirror the elements that point at it.
fn rebuild_memberships(document: &mut SceneDocument) {
    let mut members: HashMap<LayerId, Vec<ElementId>> = HashMap::new();
    for element in &document.elements {
        members.entry(element.layer_id).or_default().push(element.id());
    }
    for layer in &mut document.layers {
        layer.elements = members.remove(&layer.id()).unwrap_or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;
    use kurbo::{Point, Size};
    use uuid::Uuid;

    fn doc_with_frame() -> (SceneDocument, ElementId, ElementId) {
        let mut layer = Layer::new("Main");
        let mut frame = Element::frame(Point::ZERO, Size::new(300.0, 300.0), layer.id());
        let child = Element::rectangle(Point::new(10.0, 10.0), Size::new(50.0, 50.0), layer.id());
        let child_id = child.id();
        frame.children_mut().unwrap().push(child_id);
        let frame_id = frame.id();
        layer.add_member(frame_id);
        layer.add_member(child_id);
        let document = SceneDocument {
            elements: vec![frame, child],
            layers: vec![layer],
            viewport: Viewport::default(),
        };
        (document, frame_id, child_id)
    }

    #[test]
    fn test_round_trip() {
        let (document, _, _) = doc_with_frame();
        let json = document.to_json().unwrap();
        let back = deserialize(&json, &ImportOptions::default()).unwrap();
        assert_eq!(back, document);
        assert_eq!(back.layers[0].elements().len(), 2);
    }

    #[test]
    fn test_unknown_layer_falls_back() {
        let layer = Layer::new("Only");
        let stray = Element::rectangle(Point::ZERO, Size::new(20.0, 20.0), Uuid::new_v4());
        let document = SceneDocument {
            elements: vec![stray],
            layers: vec![layer.clone()],
            viewport: Viewport::default(),
        };
        let repaired = normalize(document, &ImportOptions::default()).unwrap();
        assert_eq!(repaired.elements[0].layer_id, layer.id());
        assert_eq!(repaired.layers[0].elements(), &[repaired.elements[0].id()]);
    }

    #[test]
    fn test_missing_layers_creates_default() {
        let el = Element::rectangle(Point::ZERO, Size::new(20.0, 20.0), Uuid::new_v4());
        let document = SceneDocument {
            elements: vec![el],
            ..Default::default()
        };
        let repaired = normalize(document, &ImportOptions::default()).unwrap();
        assert_eq!(repaired.layers.len(), 1);
        assert_eq!(repaired.layers[0].name, DEFAULT_LAYER_NAME);
        assert_eq!(repaired.elements[0].layer_id, repaired.layers[0].id());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let (mut document, _, _) = doc_with_frame();
        let copy = document.elements[1].clone();
        document.elements.push(copy);
        let err = normalize(document, &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, SceneError::DuplicateElementId(_)));
    }

    #[test]
    fn test_regenerated_ids_keep_frame_relation() {
        let (document, frame_id, child_id) = doc_with_frame();
        let imported = normalize(document, &ImportOptions::paste(Vec2::new(5.0, 5.0))).unwrap();

        let frame = imported.elements.iter().find(|el| el.is_frame()).unwrap();
        let child = imported.elements.iter().find(|el| !el.is_frame()).unwrap();
        assert_ne!(frame.id(), frame_id);
        assert_ne!(child.id(), child_id);
        assert_eq!(frame.children(), &[child.id()]);
        assert_eq!(child.position, Point::new(15.0, 15.0));
        assert!(imported.layers[0].contains(child.id()));
    }

    #[test]
    fn test_dangling_children_dropped() {
        let (mut document, _, child_id) = doc_with_frame();
        document.elements.retain(|el| el.id() != child_id);
        let repaired = normalize(document, &ImportOptions::default()).unwrap();
        assert!(repaired.elements[0].children().is_empty());
    }

    #[test]
    fn test_parse_error() {
        let err = deserialize("{ not json", &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, SceneError::Parse(_)));
    }

    #[test]
    fn test_connector_to_missing_element_cleared() {
        let layer = Layer::new("L");
        let conn = Element::new(
            ElementKind::Connector {
                start: Some(Uuid::new_v4()),
                end: None,
            },
            Point::ZERO,
            Size::new(100.0, 10.0),
            layer.id(),
        );
        let document = SceneDocument {
            elements: vec![conn],
            layers: vec![layer],
            viewport: Viewport::default(),
        };
        let repaired = normalize(document, &ImportOptions::default()).unwrap();
        assert!(matches!(
            repaired.elements[0].kind,
            ElementKind::Connector { start: None, end: None }
        ));
    }
}
