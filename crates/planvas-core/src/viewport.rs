//! Viewport zoom/pan and screen⇄canvas coordinate transforms.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Map a screen point into canvas space.
///
/// `zoom` must be positive; this is not checked.
pub fn screen_to_canvas(point: Point, zoom: f64, pan: Vec2) -> Point {
    Point::new((point.x - pan.x) / zoom, (point.y - pan.y) / zoom)
}

/// Map a canvas point into screen space.
pub fn canvas_to_screen(point: Point, zoom: f64, pan: Vec2) -> Point {
    Point::new(point.x * zoom + pan.x, point.y * zoom + pan.y)
}

/// Current view onto the infinite canvas.
///
/// The store never clamps these values; zoom limits are host policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Scale factor (canvas units to screen pixels).
    pub zoom: f64,
    /// Screen-space offset of the canvas origin.
    pub pan: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
        }
    }
}

impl Viewport {
    /// Create a viewport with the given zoom and pan.
    pub fn new(zoom: f64, pan: Vec2) -> Self {
        Self { zoom, pan }
    }

    /// Transform from canvas to screen coordinates, for renderers.
    pub fn affine(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }

    /// Transform from screen to canvas coordinates.
    pub fn inverse_affine(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.pan)
    }

    pub fn screen_to_canvas(&self, point: Point) -> Point {
        screen_to_canvas(point, self.zoom, self.pan)
    }

    pub fn canvas_to_screen(&self, point: Point) -> Point {
        canvas_to_screen(point, self.zoom, self.pan)
    }

    /// Convert a screen-space distance to canvas units.
    pub fn screen_len_to_canvas(&self, len: f64) -> f64 {
        len / self.zoom
    }

    /// Pan by a delta in screen pixels.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Multiply zoom by `factor`, keeping `screen_point` fixed on screen.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let anchor = self.screen_to_canvas(screen_point);
        self.zoom *= factor;
        let moved = self.canvas_to_screen(anchor);
        self.pan += Vec2::new(screen_point.x - moved.x, screen_point.y - moved.y);
    }

    /// Canvas-space rectangle visible in a screen of the given size.
    pub fn visible_canvas_rect(&self, screen_size: Size) -> Rect {
        let top_left = self.screen_to_canvas(Point::ZERO);
        let bottom_right =
            self.screen_to_canvas(Point::new(screen_size.width, screen_size.height));
        Rect::from_points(top_left, bottom_right)
    }

    /// Centre `bounds` in a screen of `screen_size`, leaving `padding` pixels.
    pub fn fit_to_bounds(&mut self, bounds: Rect, screen_size: Size, padding: f64) {
        if bounds.is_zero_area() {
            *self = Self::default();
            return;
        }

        let available = Size::new(
            (screen_size.width - padding * 2.0).max(1.0),
            (screen_size.height - padding * 2.0).max(1.0),
        );
        self.zoom = (available.width / bounds.width()).min(available.height / bounds.height());

        let center = bounds.center();
        self.pan = Vec2::new(
            screen_size.width / 2.0 - center.x * self.zoom,
            screen_size.height / 2.0 - center.y * self.zoom,
        );
    }
}
