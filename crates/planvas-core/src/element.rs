//! Scene elements.

use crate::layer::LayerId;
use crate::text::TextPayload;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Opaque style bag. The core copies and merges it but never reads it.
pub type Style = serde_json::Map<String, serde_json::Value>;

/// Basic geometric shape variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Ellipse,
    Diamond,
    Triangle,
}

/// Element type tag with the data specific to each variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Shape {
        shape: ShapeKind,
    },
    Text,
    StickyNote,
    /// Container whose children were fully inside it at the last sync.
    Frame {
        #[serde(default)]
        name: String,
        #[serde(default)]
        children: Vec<ElementId>,
    },
    /// Line between two points, optionally bound to elements at either end.
    Connector {
        #[serde(default)]
        start: Option<ElementId>,
        #[serde(default)]
        end: Option<ElementId>,
    },
    MindMapNode {
        #[serde(default)]
        parent: Option<ElementId>,
    },
    /// Host-defined interactive widget, identified by its widget type name.
    SmartWidget {
        widget: String,
    },
}

impl ElementKind {
    /// Convenience constructor for an empty frame.
    pub fn frame(name: impl Into<String>) -> Self {
        ElementKind::Frame {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Size given to new elements when no tool default applies.
    pub fn default_size(&self) -> Size {
        match self {
            ElementKind::Shape { .. } => Size::new(100.0, 100.0),
            ElementKind::Text => Size::new(200.0, 40.0),
            ElementKind::StickyNote => Size::new(200.0, 200.0),
            ElementKind::Frame { .. } => Size::new(800.0, 600.0),
            ElementKind::Connector { .. } => Size::new(150.0, 10.0),
            ElementKind::MindMapNode { .. } => Size::new(160.0, 60.0),
            ElementKind::SmartWidget { .. } => Size::new(320.0, 240.0),
        }
    }

    /// Whether resize handles apply to this kind.
    pub fn is_resizable(&self) -> bool {
        match self {
            ElementKind::Connector { .. } => false,
            ElementKind::Shape { .. }
            | ElementKind::Text
            | ElementKind::StickyNote
            | ElementKind::Frame { .. }
            | ElementKind::MindMapNode { .. }
            | ElementKind::SmartWidget { .. } => true,
        }
    }

    /// Whether new elements of this kind carry a text payload.
    pub fn has_text(&self) -> bool {
        match self {
            ElementKind::Text | ElementKind::StickyNote | ElementKind::MindMapNode { .. } => true,
            ElementKind::Shape { .. }
            | ElementKind::Frame { .. }
            | ElementKind::Connector { .. }
            | ElementKind::SmartWidget { .. } => false,
        }
    }

    /// Short stable name, used in logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::Shape { .. } => "shape",
            ElementKind::Text => "text",
            ElementKind::StickyNote => "sticky_note",
            ElementKind::Frame { .. } => "frame",
            ElementKind::Connector { .. } => "connector",
            ElementKind::MindMapNode { .. } => "mind_map_node",
            ElementKind::SmartWidget { .. } => "smart_widget",
        }
    }
}

/// A single positioned, sized visual unit on the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub(crate) id: ElementId,
    /// Type tag and variant data.
    pub kind: ElementKind,
    /// Top-left corner in canvas coordinates.
    pub position: Point,
    /// Width and height in canvas units.
    pub size: Size,
    /// Style properties, opaque to the core.
    #[serde(default)]
    pub style: Style,
    /// Owning layer.
    pub layer_id: LayerId,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    /// Optional text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextPayload>,
}

fn default_true() -> bool {
    true
}

impl Element {
    /// Create an element with a fresh id.
    pub fn new(kind: ElementKind, position: Point, size: Size, layer_id: LayerId) -> Self {
        let text = kind.has_text().then(TextPayload::default);
        Self {
            id: Uuid::new_v4(),
            kind,
            position,
            size,
            style: Style::new(),
            layer_id,
            visible: true,
            locked: false,
            text,
        }
    }

    /// Create a rectangle shape.
    pub fn rectangle(position: Point, size: Size, layer_id: LayerId) -> Self {
        Self::new(
            ElementKind::Shape {
                shape: ShapeKind::Rectangle,
            },
            position,
            size,
            layer_id,
        )
    }

    /// Create an empty frame.
    pub fn frame(position: Point, size: Size, layer_id: LayerId) -> Self {
        Self::new(ElementKind::frame(""), position, size, layer_id)
    }

    /// Create a text element.
    pub fn text(position: Point, text: TextPayload, layer_id: LayerId) -> Self {
        let size = ElementKind::Text.default_size();
        let mut element = Self::new(ElementKind::Text, position, size, layer_id);
        element.text = Some(text);
        element
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_text(mut self, text: TextPayload) -> Self {
        self.text = Some(text);
        self
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Axis-aligned bounds in canvas coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Whether `other` lies fully inside this element's bounds.
    pub fn contains_rect(&self, other: Rect) -> bool {
        let b = self.bounds();
        other.x0 >= b.x0 && other.y0 >= b.y0 && other.x1 <= b.x1 && other.y1 <= b.y1
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    pub fn is_frame(&self) -> bool {
        matches!(self.kind, ElementKind::Frame { .. })
    }

    /// Frame children, empty for non-frames.
    pub fn children(&self) -> &[ElementId] {
        match &self.kind {
            ElementKind::Frame { children, .. } => children,
            _ => &[],
        }
    }

    /// Mutable frame children, `None` for non-frames.
    pub fn children_mut(&mut self) -> Option<&mut Vec<ElementId>> {
        match &mut self.kind {
            ElementKind::Frame { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Rewrite every element id reference through `map`, dropping unmapped ones.
    pub(crate) fn remap_references(&mut self, map: &dyn Fn(ElementId) -> Option<ElementId>) {
        match &mut self.kind {
            ElementKind::Frame { children, .. } => {
                *children = children.iter().filter_map(|&child| map(child)).collect();
            }
            ElementKind::Connector { start, end } => {
                *start = start.and_then(map);
                *end = end.and_then(map);
            }
            ElementKind::MindMapNode { parent } => {
                *parent = parent.and_then(map);
            }
            ElementKind::Shape { .. }
            | ElementKind::Text
            | ElementKind::StickyNote
            | ElementKind::SmartWidget { .. } => {}
        }
    }

    /// Replace the id with a new unique one, returning it.
    pub(crate) fn regenerate_id(&mut self) -> ElementId {
        self.id = Uuid::new_v4();
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> LayerId {
        Uuid::new_v4()
    }

    #[test]
    fn test_element_creation() {
        let el = Element::rectangle(Point::new(10.0, 20.0), Size::new(100.0, 50.0), layer());
        assert!(el.visible);
        assert!(!el.locked);
        assert!(el.text.is_none());
        let b = el.bounds();
        assert!((b.x1 - 110.0).abs() < f64::EPSILON);
        assert!((b.y1 - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_text_kinds_get_payload() {
        let note = Element::new(
            ElementKind::StickyNote,
            Point::ZERO,
            Size::new(10.0, 10.0),
            layer(),
        );
        assert!(note.text.is_some());
        let shape = Element::rectangle(Point::ZERO, Size::new(10.0, 10.0), layer());
        assert!(shape.text.is_none());
    }

    #[test]
    fn test_contains_rect_is_inclusive() {
        let frame = Element::frame(Point::ZERO, Size::new(300.0, 300.0), layer());
        assert!(frame.contains_rect(Rect::new(0.0, 0.0, 300.0, 300.0)));
        assert!(frame.contains_rect(Rect::new(10.0, 10.0, 60.0, 60.0)));
        assert!(!frame.contains_rect(Rect::new(290.0, 290.0, 340.0, 340.0)));
    }

    #[test]
    fn test_children_only_on_frames() {
        let mut frame = Element::frame(Point::ZERO, Size::new(10.0, 10.0), layer());
        let mut rect = Element::rectangle(Point::ZERO, Size::new(10.0, 10.0), layer());
        let child = rect.id();
        frame.children_mut().unwrap().push(child);
        assert_eq!(frame.children(), &[child]);
        assert!(rect.children().is_empty());
        assert!(rect.children_mut().is_none());
    }

    #[test]
    fn test_remap_drops_unmapped_references() {
        let target = Uuid::new_v4();
        let kept = Uuid::new_v4();
        let mut conn = Element::new(
            ElementKind::Connector {
                start: Some(target),
                end: Some(kept),
            },
            Point::ZERO,
            Size::new(10.0, 10.0),
            layer(),
        );
        conn.remap_references(&|id| (id != target).then_some(id));
        match conn.kind {
            ElementKind::Connector { start, end } => {
                assert!(start.is_none());
                assert_eq!(end, Some(kept));
            }
            _ => panic!("Expected connector"),
        }
    }

    #[test]
    fn test_serde_tagged_kind() {
        let el = Element::frame(Point::new(1.0, 2.0), Size::new(3.0, 4.0), layer());
        let json = serde_json::to_value(&el).unwrap();
        assert_eq!(json["kind"]["type"], "frame");
        let back: Element = serde_json::from_value(json).unwrap();
        assert_eq!(back, el);
    }

    #[test]
    fn test_default_sizes_are_positive() {
        let kinds = [
            ElementKind::Shape { shape: ShapeKind::Ellipse },
            ElementKind::Text,
            ElementKind::StickyNote,
            ElementKind::frame("f"),
            ElementKind::Connector { start: None, end: None },
            ElementKind::MindMapNode { parent: None },
            ElementKind::SmartWidget { widget: "kanban".into() },
        ];
        for kind in kinds {
            let size = kind.default_size();
            assert!(size.width > 0.0 && size.height > 0.0, "{}", kind.type_name());
        }
    }
}
