//! Drag and resize gestures.
//!
//! A gesture goes `Idle -> Active -> Idle`, ending in either a commit (one
//! undo step for the whole drag) or a cancel (original geometry restored,
//! history untouched). Intermediate pointer updates mutate element geometry
//! directly; the spatial index only catches up at commit.

use crate::element::{Element, ElementId, ElementKind};
use crate::hit_test::ResizeHandle;
use crate::history::Snapshot;
use crate::scene::Scene;
use crate::text;
use kurbo::{Point, Size, Vec2};

/// New origin and size after dragging `handle` by `delta`.
///
/// Edge handles change one axis, corners both. Dragging a top or left handle
/// keeps the opposite edge fixed, so the origin shifts by however much the
/// size changed. Sizes never drop below `min_size`.
pub fn resize_geometry(
    handle: ResizeHandle,
    origin: Point,
    size: Size,
    delta: Vec2,
    min_size: Size,
) -> (Point, Size) {
    let mut width = size.width;
    let mut height = size.height;

    if handle.moves_left() {
        width = size.width - delta.x;
    } else if handle.moves_right() {
        width = size.width + delta.x;
    }
    if handle.moves_top() {
        height = size.height - delta.y;
    } else if handle.moves_bottom() {
        height = size.height + delta.y;
    }

    let width = width.max(min_size.width);
    let height = height.max(min_size.height);

    let mut position = origin;
    if handle.moves_left() {
        position.x += size.width - width;
    }
    if handle.moves_top() {
        position.y += size.height - height;
    }
    (position, Size::new(width, height))
}

/// What the active gesture does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    /// Translate every captured element.
    Move,
    /// Resize the target through one handle.
    Resize(ResizeHandle),
}

#[derive(Debug, Clone, PartialEq)]
struct OriginalGeometry {
    id: ElementId,
    position: Point,
    size: Size,
    /// Frame children at capture time.
    children: Option<Vec<ElementId>>,
}

impl OriginalGeometry {
    fn capture(element: &Element) -> Self {
        Self {
            id: element.id(),
            position: element.position,
            size: element.size,
            children: element.is_frame().then(|| element.children().to_vec()),
        }
    }
}

/// An in-flight gesture.
#[derive(Debug, Clone)]
pub struct Gesture {
    kind: GestureKind,
    target: ElementId,
    /// Pointer position at begin, screen space.
    start: Point,
    /// Latest pointer position, screen space.
    current: Point,
    originals: Vec<OriginalGeometry>,
    /// State before the gesture, recorded on commit.
    before: Snapshot,
}

impl Gesture {
    pub fn kind(&self) -> GestureKind {
        self.kind
    }

    /// Element under the pointer when the gesture began.
    pub fn target(&self) -> ElementId {
        self.target
    }

    /// Every element the gesture moves or resizes.
    pub fn element_ids(&self) -> Vec<ElementId> {
        self.originals.iter().map(|o| o.id).collect()
    }

    /// Pointer travel in canvas units at the given zoom.
    pub fn delta(&self, zoom: f64) -> Vec2 {
        (self.current - self.start) / zoom
    }
}

/// Gesture state.
#[derive(Debug, Clone, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Active(Gesture),
}

/// Drives move and resize gestures against a [`Scene`].
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    state: InteractionState,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, InteractionState::Active(_))
    }

    /// The active gesture, if any.
    pub fn gesture(&self) -> Option<&Gesture> {
        match &self.state {
            InteractionState::Active(gesture) => Some(gesture),
            InteractionState::Idle => None,
        }
    }

    /// Start a gesture at a screen point.
    ///
    /// Resize handles of selected elements take priority; otherwise the
    /// topmost element under the pointer is selected (if it was not already)
    /// and the selection is moved. Returns false when nothing was hit, so
    /// the host can start a marquee selection instead.
    pub fn begin(&mut self, scene: &mut Scene, screen_point: Point) -> bool {
        if self.is_active() {
            log::debug!("begin: gesture already active");
            return false;
        }

        let selected = scene.selected_ids();
        for &id in selected.iter().rev() {
            if let Some(handle) = scene.hit_test_resize_handle(id, screen_point) {
                return self.begin_resize(scene, id, handle, screen_point);
            }
        }

        let Some(hit) = scene.find_element_at_point(screen_point) else {
            return false;
        };
        if !scene.is_selected(hit) {
            scene.select(hit);
        }
        let ids = scene.selected_ids();
        self.begin_move(scene, hit, &ids, screen_point)
    }

    /// Start resizing `id` through `handle`.
    pub fn begin_resize(
        &mut self,
        scene: &mut Scene,
        id: ElementId,
        handle: ResizeHandle,
        screen_point: Point,
    ) -> bool {
        if self.is_active() {
            return false;
        }
        let Some(element) = scene.get_element(id) else {
            log::debug!("begin_resize: unknown element {id}");
            return false;
        };
        if !scene.is_hittable(element) || !element.kind.is_resizable() {
            return false;
        }

        let originals = vec![OriginalGeometry::capture(element)];
        self.state = InteractionState::Active(Gesture {
            kind: GestureKind::Resize(handle),
            target: id,
            start: screen_point,
            current: screen_point,
            originals,
            before: scene.snapshot(),
        });
        true
    }

    /// Start moving `ids` (plus `target`), carrying along the contents of
    /// any frame among them.
    pub fn begin_move(
        &mut self,
        scene: &mut Scene,
        target: ElementId,
        ids: &[ElementId],
        screen_point: Point,
    ) -> bool {
        if self.is_active() {
            return false;
        }
        if !scene.get_element(target).is_some_and(|el| scene.is_hittable(el)) {
            log::debug!("begin_move: target {target} is missing or locked");
            return false;
        }

        let before = scene.snapshot();
        let mut moving: Vec<ElementId> = ids
            .iter()
            .copied()
            .filter(|&id| scene.get_element(id).is_some_and(|el| scene.is_hittable(el)))
            .collect();
        if !moving.contains(&target) {
            moving.push(target);
        }

        let mut originals: Vec<OriginalGeometry> = moving
            .iter()
            .filter_map(|&id| scene.get_element(id).map(OriginalGeometry::capture))
            .collect();

        let frames: Vec<ElementId> = originals
            .iter()
            .filter(|o| o.children.is_some())
            .map(|o| o.id)
            .collect();
        for frame in frames {
            scene.assign_elements_to_frame(frame);
            let children = scene
                .get_element(frame)
                .map(|el| el.children().to_vec())
                .unwrap_or_default();
            for child in children {
                if originals.iter().any(|o| o.id == child) {
                    continue;
                }
                if let Some(element) = scene.get_element(child) {
                    originals.push(OriginalGeometry::capture(element));
                }
            }
        }

        self.state = InteractionState::Active(Gesture {
            kind: GestureKind::Move,
            target,
            start: screen_point,
            current: screen_point,
            originals,
            before,
        });
        true
    }

    /// Apply the pointer's current position. Returns false when idle.
    pub fn update(&mut self, scene: &mut Scene, screen_point: Point) -> bool {
        let InteractionState::Active(gesture) = &mut self.state else {
            return false;
        };
        gesture.current = screen_point;
        let delta = gesture.delta(scene.viewport().zoom);

        match gesture.kind {
            GestureKind::Move => {
                for original in &gesture.originals {
                    if let Some(element) = scene.element_mut(original.id) {
                        element.position = original.position + delta;
                    }
                }
            }
            GestureKind::Resize(handle) => {
                let Some(original) = gesture.originals.first() else {
                    return false;
                };
                let (position, size) = resized(scene, original, handle, delta);
                if let Some(element) = scene.element_mut(original.id) {
                    element.position = position;
                    element.size = size;
                }
            }
        }
        true
    }

    /// Finish the gesture as one undo step. Returns false when idle.
    pub fn commit(&mut self, scene: &mut Scene) -> bool {
        let InteractionState::Active(gesture) = std::mem::take(&mut self.state) else {
            return false;
        };
        let resized_frame = matches!(gesture.kind, GestureKind::Resize(_))
            && scene.get_element(gesture.target).is_some_and(Element::is_frame);
        if resized_frame {
            scene.assign_elements_to_frame(gesture.target);
        }
        log::debug!(
            "Committed {:?} gesture on {} elements",
            gesture.kind,
            gesture.originals.len()
        );
        scene.record_history(gesture.before);
        true
    }

    /// Abort the gesture, restoring captured geometry. Returns false when idle.
    pub fn cancel(&mut self, scene: &mut Scene) -> bool {
        let InteractionState::Active(gesture) = std::mem::take(&mut self.state) else {
            return false;
        };
        for original in gesture.originals {
            if let Some(element) = scene.element_mut(original.id) {
                element.position = original.position;
                element.size = original.size;
                if let (Some(children), Some(current)) =
                    (original.children, element.children_mut())
                {
                    *current = children;
                }
            }
        }
        scene.sync_index();
        true
    }
}

/// Resize geometry for `original`, keeping text elements tall enough for
/// their wrapped content.
fn resized(
    scene: &Scene,
    original: &OriginalGeometry,
    handle: ResizeHandle,
    delta: Vec2,
) -> (Point, Size) {
    let min = scene.config().min_element_size;
    let (position, size) = resize_geometry(handle, original.position, original.size, delta, min);

    let text = scene
        .get_element(original.id)
        .filter(|el| matches!(el.kind, ElementKind::Text))
        .and_then(|el| el.text.as_ref());
    match text {
        Some(text) => {
            let text_min = text::min_height_for_width(text, size.width);
            if text_min > size.height {
                let min = Size::new(min.width, min.height.max(text_min));
                resize_geometry(handle, original.position, original.size, delta, min)
            } else {
                (position, size)
            }
        }
        None => (position, size),
    }
}
