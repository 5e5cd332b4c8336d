//! Frames: containers that group the elements lying fully inside them.
//!
//! Membership is derived geometry, synced only by the operations here (and by
//! gesture commits on a frame). Moving a child on its own leaves the frame's
//! `children` list untouched until the next sync.

use crate::element::{Element, ElementId};
use crate::scene::Scene;
use kurbo::{Rect, Vec2};

impl Scene {
    /// Ids of every other element fully inside `frame`, back to front.
    fn elements_inside(&self, frame: &Element) -> Vec<ElementId> {
        let candidates = self.candidates_in(frame.bounds());
        self.resolve_ordered(candidates)
            .into_iter()
            .filter(|el| el.id() != frame.id() && frame.contains_rect(el.bounds()))
            .map(Element::id)
            .collect()
    }

    fn frame_bounds(&self, frame_id: ElementId) -> Option<Rect> {
        match self.get_element(frame_id) {
            Some(el) if el.is_frame() => Some(el.bounds()),
            Some(_) => {
                log::debug!("{frame_id} is not a frame");
                None
            }
            None => {
                log::debug!("Unknown frame {frame_id}");
                None
            }
        }
    }

    /// Recompute a frame's children from the elements currently inside it.
    /// Returns false if `frame_id` is not a frame.
    pub fn assign_elements_to_frame(&mut self, frame_id: ElementId) -> bool {
        if self.frame_bounds(frame_id).is_none() {
            return false;
        }
        let inside = self
            .get_element(frame_id)
            .map(|frame| self.elements_inside(frame))
            .unwrap_or_default();
        if let Some(children) = self.element_mut(frame_id).and_then(Element::children_mut) {
            *children = inside;
        }
        true
    }

    /// Move a frame together with everything inside it, as one undoable step.
    pub fn move_frame(&mut self, frame_id: ElementId, delta: Vec2) -> bool {
        if self.frame_bounds(frame_id).is_none() {
            return false;
        }
        let before = self.snapshot();
        self.assign_elements_to_frame(frame_id);

        let mut moving = vec![frame_id];
        if let Some(frame) = self.get_element(frame_id) {
            moving.extend_from_slice(frame.children());
        }
        for id in moving {
            if let Some(element) = self.element_mut(id) {
                element.translate(delta);
            }
        }
        self.record_history(before);
        true
    }

    /// Set a frame's bounds (clamped to the minimum size) and re-sync its
    /// children, as one undoable step. Children are neither moved nor resized.
    pub fn resize_frame(&mut self, frame_id: ElementId, new_bounds: Rect) -> bool {
        if self.frame_bounds(frame_id).is_none() {
            return false;
        }
        let before = self.snapshot();
        let new_bounds = new_bounds.abs();
        let size = self.config.clamp_size(new_bounds.size());
        if let Some(frame) = self.element_mut(frame_id) {
            frame.position = new_bounds.origin();
            frame.size = size;
        }
        self.sync_index();
        self.assign_elements_to_frame(frame_id);
        self.record_history(before);
        true
    }

    /// Empty a frame's children without deleting anything.
    pub fn ungroup_frame(&mut self, frame_id: ElementId) -> bool {
        if self.frame_bounds(frame_id).is_none() {
            return false;
        }
        if let Some(children) = self.element_mut(frame_id).and_then(Element::children_mut) {
            children.clear();
        }
        true
    }

    /// First frame (back to front) listing `element_id` as a child.
    pub fn frame_of(&self, element_id: ElementId) -> Option<ElementId> {
        self.frames()
            .find(|frame| frame.children().contains(&element_id))
            .map(Element::id)
    }

    /// All frames, back to front.
    pub fn frames(&self) -> impl Iterator<Item = &Element> {
        self.elements().iter().filter(|el| el.is_frame())
    }
}
