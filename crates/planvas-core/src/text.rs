//! Text payloads and approximate text metrics.
//!
//! The core has no font rasterizer; widths are estimated from character counts
//! and a per-family width factor. Renderers that know real glyph metrics can
//! overwrite element sizes afterwards.

use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Inner padding between an element's bounds and its text.
pub const TEXT_PADDING: f64 = 8.0;

/// Text content attached to an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPayload {
    /// The text content; `\n` separates paragraphs.
    pub content: String,
    /// Font size in canvas units.
    pub font_size: f64,
    /// Font family name, passed through to the renderer.
    pub font_family: String,
    /// Line height as a multiple of the font size.
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    /// Whether the owning element grows and shrinks to fit its content.
    #[serde(default)]
    pub auto_size: bool,
}

fn default_line_height() -> f64 {
    TextPayload::DEFAULT_LINE_HEIGHT
}

impl Default for TextPayload {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl TextPayload {
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;
    pub const DEFAULT_LINE_HEIGHT: f64 = 1.25;
    pub const DEFAULT_FONT_FAMILY: &'static str = "sans-serif";

    /// Create a payload with default font settings.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: Self::DEFAULT_FONT_FAMILY.to_string(),
            line_height: Self::DEFAULT_LINE_HEIGHT,
            auto_size: false,
        }
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    pub fn with_auto_size(mut self, auto_size: bool) -> Self {
        self.auto_size = auto_size;
        self
    }

    /// Approximate advance width of one character.
    pub fn char_width(&self) -> f64 {
        let family = self.font_family.to_ascii_lowercase();
        // Empirical averages for common family classes.
        let factor = if family.contains("mono") {
            0.60
        } else if family.contains("serif") && !family.contains("sans") {
            0.55
        } else {
            0.52
        };
        self.font_size * factor
    }

    /// Height of a single line.
    pub fn line_advance(&self) -> f64 {
        self.font_size * self.line_height
    }
}

/// Result of laying out a text payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    /// Visual lines after wrapping.
    pub lines: Vec<String>,
    /// Size of the element needed to show every line, padding included.
    pub size: Size,
}

/// Lay out `text`, wrapping at `max_width` (element width, padding included).
///
/// Without a width every paragraph stays on one line.
pub fn layout(text: &TextPayload, max_width: Option<f64>) -> TextLayout {
    let char_width = text.char_width().max(f64::EPSILON);
    let max_chars =
        max_width.map(|w| (((w - 2.0 * TEXT_PADDING) / char_width).floor() as usize).max(1));

    let mut lines = Vec::new();
    for paragraph in text.content.split('\n') {
        match max_chars {
            Some(limit) => wrap_paragraph(paragraph, limit, &mut lines),
            None => lines.push(paragraph.to_string()),
        }
    }

    let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let line_count = lines.len().max(1);
    let size = Size::new(
        widest as f64 * char_width + 2.0 * TEXT_PADDING,
        line_count as f64 * text.line_advance() + 2.0 * TEXT_PADDING,
    );
    TextLayout { lines, size }
}

/// Greedy word wrap; words longer than a line are split by character.
fn wrap_paragraph(paragraph: &str, limit: usize, out: &mut Vec<String>) {
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in paragraph.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > limit {
            if current_len > 0 {
                out.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(limit);
            out.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > limit && current_len > 0 {
            out.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current_len += word.len();
        current.extend(word);
    }

    out.push(current);
}

/// Size a text-bearing element should take after its text or width changed.
///
/// Auto-sized text shrinks to its natural single-line-per-paragraph box;
/// fixed-width text keeps its width and grows in height to fit the wrap.
pub fn fit_size(text: &TextPayload, current: Size, min: Size) -> Size {
    if text.auto_size {
        let natural = layout(text, None).size;
        return Size::new(natural.width.max(min.width), natural.height.max(min.height));
    }
    let wrapped = layout(text, Some(current.width)).size;
    Size::new(current.width.max(min.width), current.height.max(wrapped.height).max(min.height))
}

/// Minimum element height that still shows every wrapped line at `width`.
pub fn min_height_for_width(text: &TextPayload, width: f64) -> f64 {
    layout(text, Some(width)).size.height
}
