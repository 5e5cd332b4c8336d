//! Engine configuration and per-tool default settings.

use crate::element::{ElementKind, ShapeKind, Style};
use crate::error::Result;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tunable engine constants.
///
/// Every field has a default so partial JSON configs are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of undo steps kept.
    pub history_cap: usize,
    /// Floor applied to every width/height.
    pub min_element_size: Size,
    /// Resize handle hit radius in screen pixels.
    pub handle_size_px: f64,
    /// Side length of a spatial index cell in canvas units.
    pub spatial_cell_size: f64,
    /// Remote locks older than this are dropped by `expire_locks`.
    pub lock_timeout_ms: u64,
    /// Maximum number of notifications kept for display.
    pub notification_cap: usize,
    /// How long a notification stays visible.
    pub notification_ttl_ms: u64,
    /// Name given to the layer created for a fresh scene.
    pub default_layer_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_cap: 20,
            min_element_size: Size::new(10.0, 10.0),
            handle_size_px: 8.0,
            spatial_cell_size: 256.0,
            lock_timeout_ms: 30_000,
            notification_cap: 5,
            notification_ttl_ms: 5_000,
            default_layer_name: "Layer 1".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load a config from JSON, filling omitted fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Clamp a size to the configured minimum.
    pub fn clamp_size(&self, size: Size) -> Size {
        Size::new(
            size.width.max(self.min_element_size.width),
            size.height.max(self.min_element_size.height),
        )
    }
}

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Rectangle,
    Ellipse,
    Diamond,
    Triangle,
    Text,
    Sticky,
    Frame,
    Connector,
    MindMap,
    Widget,
}

impl ToolKind {
    /// Key used to look the tool up in [`ToolSettings`].
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Pan => "pan",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Ellipse => "ellipse",
            ToolKind::Diamond => "diamond",
            ToolKind::Triangle => "triangle",
            ToolKind::Text => "text",
            ToolKind::Sticky => "sticky",
            ToolKind::Frame => "frame",
            ToolKind::Connector => "connector",
            ToolKind::MindMap => "mind_map",
            ToolKind::Widget => "widget",
        }
    }

    /// Shape variant drawn by this tool, if it is a basic shape tool.
    pub fn shape_kind(&self) -> Option<ShapeKind> {
        match self {
            ToolKind::Rectangle => Some(ShapeKind::Rectangle),
            ToolKind::Ellipse => Some(ShapeKind::Ellipse),
            ToolKind::Diamond => Some(ShapeKind::Diamond),
            ToolKind::Triangle => Some(ShapeKind::Triangle),
            _ => None,
        }
    }

    /// Whether the tool creates elements at all.
    pub fn creates_elements(&self) -> bool {
        !matches!(self, ToolKind::Select | ToolKind::Pan)
    }

    /// Kind of element this tool places, `None` for navigation tools.
    pub fn element_kind(&self) -> Option<ElementKind> {
        let kind = match self {
            ToolKind::Select | ToolKind::Pan => return None,
            ToolKind::Rectangle | ToolKind::Ellipse | ToolKind::Diamond | ToolKind::Triangle => {
                ElementKind::Shape {
                    shape: self.shape_kind()?,
                }
            }
            ToolKind::Text => ElementKind::Text,
            ToolKind::Sticky => ElementKind::StickyNote,
            ToolKind::Frame => ElementKind::frame(""),
            ToolKind::Connector => ElementKind::Connector { start: None, end: None },
            ToolKind::MindMap => ElementKind::MindMapNode { parent: None },
            ToolKind::Widget => ElementKind::SmartWidget {
                widget: "widget".to_string(),
            },
        };
        Some(kind)
    }

    /// Tool whose settings apply to elements of `kind`.
    pub fn for_element(kind: &ElementKind) -> Self {
        match kind {
            ElementKind::Shape { shape } => match shape {
                ShapeKind::Rectangle => ToolKind::Rectangle,
                ShapeKind::Ellipse => ToolKind::Ellipse,
                ShapeKind::Diamond => ToolKind::Diamond,
                ShapeKind::Triangle => ToolKind::Triangle,
            },
            ElementKind::Text => ToolKind::Text,
            ElementKind::StickyNote => ToolKind::Sticky,
            ElementKind::Frame { .. } => ToolKind::Frame,
            ElementKind::Connector { .. } => ToolKind::Connector,
            ElementKind::MindMapNode { .. } => ToolKind::MindMap,
            ElementKind::SmartWidget { .. } => ToolKind::Widget,
        }
    }
}

/// Defaults applied to elements created with a tool.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolDefaults {
    /// Initial size; falls back to the element kind's default.
    pub size: Option<Size>,
    /// Initial style keys.
    pub style: Style,
    /// Font size for text-bearing elements.
    pub font_size: Option<f64>,
    /// Font family for text-bearing elements.
    pub font_family: Option<String>,
}

/// Keyed configuration bag of per-tool defaults.
///
/// The engine only performs plain lookups here; it never interprets values
/// beyond copying them onto new elements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolSettings {
    tools: HashMap<String, ToolDefaults>,
}

impl ToolSettings {
    /// Create an empty settings bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings a fresh scene starts with.
    pub fn builtin() -> Self {
        let mut settings = Self::new();
        settings.entry(ToolKind::Text).font_size = Some(20.0);
        settings
            .entry(ToolKind::Sticky)
            .style
            .insert("fill".to_string(), "#fff59d".into());
        let frame = settings.entry(ToolKind::Frame);
        frame.style.insert("stroke".to_string(), "#9e9e9e".into());
        frame.style.insert("fill".to_string(), "transparent".into());
        settings
    }

    /// Look up defaults for a tool name.
    pub fn get(&self, tool: &str) -> Option<&ToolDefaults> {
        self.tools.get(tool)
    }

    /// Look up defaults for a tool.
    pub fn for_tool(&self, tool: ToolKind) -> Option<&ToolDefaults> {
        self.get(tool.name())
    }

    /// Replace the defaults for a tool name.
    pub fn set(&mut self, tool: impl Into<String>, defaults: ToolDefaults) {
        self.tools.insert(tool.into(), defaults);
    }

    /// Mutable access to a tool's defaults, creating an empty entry if needed.
    pub fn entry(&mut self, tool: ToolKind) -> &mut ToolDefaults {
        self.tools.entry(tool.name().to_string()).or_default()
    }

    /// Load settings from JSON (`{"rectangle": {"size": ...}, ...}`).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
