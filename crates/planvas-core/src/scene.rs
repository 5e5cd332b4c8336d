//! Scene store and runtime state.
//!
//! [`Scene`] is the single owner of all mutable scene state: the document
//! (elements, layers, viewport), selection, active tool and layer, tool
//! settings, the spatial index and undo history. Every mutation goes through
//! it so the cross-references between those pieces stay consistent.

use crate::config::{EngineConfig, ToolKind, ToolSettings};
use crate::document::{self, ImportOptions, SceneDocument};
use crate::element::{Element, ElementId, ElementKind, Style};
use crate::error::Result;
use crate::history::{History, Snapshot};
use crate::layer::{Layer, LayerId};
use crate::spatial::SpatialIndex;
use crate::text::{self, TextPayload};
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Size, Vec2};
use std::collections::{HashMap, HashSet};

/// Partial update for a single element. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub position: Option<Point>,
    /// New size, clamped to the configured minimum.
    pub size: Option<Size>,
    /// Keys merged into the existing style; a `null` value removes the key.
    pub style: Option<Style>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub text: Option<TextPayload>,
    /// Target layer; ignored if the layer does not exist.
    pub layer_id: Option<LayerId>,
}

impl ElementPatch {
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }

    pub fn with_text(mut self, text: TextPayload) -> Self {
        self.text = Some(text);
        self
    }

    pub fn with_layer(mut self, layer_id: LayerId) -> Self {
        self.layer_id = Some(layer_id);
        self
    }
}

fn merge_style(target: &mut Style, patch: Style) {
    for (key, value) in patch {
        if value.is_null() {
            target.remove(&key);
        } else {
            target.insert(key, value);
        }
    }
}

/// Runtime scene state (document plus everything that is not persisted).
#[derive(Debug, Clone)]
pub struct Scene {
    pub(crate) document: SceneDocument,
    pub(crate) selection: HashSet<ElementId>,
    active_layer: LayerId,
    tool: ToolKind,
    tool_settings: ToolSettings,
    pub(crate) config: EngineConfig,
    pub(crate) index: SpatialIndex,
    /// Elements whose geometry changed since the index was last synced.
    pub(crate) stale: HashSet<ElementId>,
    /// Element id to position in `document.elements`.
    order: HashMap<ElementId, usize>,
    history: History,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene with one layer and the default config.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an empty scene with one layer.
    pub fn with_config(config: EngineConfig) -> Self {
        let layer = Layer::new(config.default_layer_name.clone());
        let active_layer = layer.id();
        Self {
            document: SceneDocument {
                elements: Vec::new(),
                layers: vec![layer],
                viewport: Viewport::default(),
            },
            selection: HashSet::new(),
            active_layer,
            tool: ToolKind::default(),
            tool_settings: ToolSettings::builtin(),
            index: SpatialIndex::new(config.spatial_cell_size),
            stale: HashSet::new(),
            order: HashMap::new(),
            history: History::new(config.history_cap),
            config,
        }
    }

    /// Create a scene from an existing document, repairing it first.
    pub fn from_document(document: SceneDocument, config: EngineConfig) -> Result<Self> {
        let mut scene = Self::with_config(config);
        scene.replace_document(document)?;
        Ok(scene)
    }

    // --- Read Access ---

    pub fn document(&self) -> &SceneDocument {
        &self.document
    }

    /// Elements back to front.
    pub fn elements(&self) -> &[Element] {
        &self.document.elements
    }

    pub fn layers(&self) -> &[Layer] {
        &self.document.layers
    }

    pub fn viewport(&self) -> &Viewport {
        &self.document.viewport
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// The spatial index as of the last sync.
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.document.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.elements.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.order.contains_key(&id)
    }

    /// Get an element by id.
    pub fn get_element(&self, id: ElementId) -> Option<&Element> {
        self.order.get(&id).and_then(|&idx| self.document.elements.get(idx))
    }

    /// Z-order position of an element (0 = bottom).
    pub fn element_index(&self, id: ElementId) -> Option<usize> {
        self.order.get(&id).copied()
    }

    /// Get a layer by id.
    pub fn get_layer(&self, id: LayerId) -> Option<&Layer> {
        self.document.layers.iter().find(|layer| layer.id() == id)
    }

    pub fn active_layer(&self) -> LayerId {
        self.active_layer
    }

    pub fn selection(&self) -> &HashSet<ElementId> {
        &self.selection
    }

    /// Selected ids back to front.
    pub fn selected_ids(&self) -> Vec<ElementId> {
        self.document
            .elements
            .iter()
            .map(Element::id)
            .filter(|id| self.selection.contains(id))
            .collect()
    }

    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selection.contains(&id)
    }

    /// Locked directly or through its layer.
    pub fn is_effectively_locked(&self, element: &Element) -> bool {
        element.locked || self.get_layer(element.layer_id).is_some_and(|layer| layer.locked)
    }

    /// Visible directly and through its layer.
    pub fn is_effectively_visible(&self, element: &Element) -> bool {
        element.visible && self.get_layer(element.layer_id).is_some_and(|layer| layer.visible)
    }

    /// Whether interaction queries may return this element.
    pub fn is_hittable(&self, element: &Element) -> bool {
        self.is_effectively_visible(element) && !self.is_effectively_locked(element)
    }

    /// Union of all element bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.document
            .elements
            .iter()
            .map(Element::bounds)
            .reduce(|acc, bounds| acc.union(bounds))
    }

    // --- Internal Bookkeeping ---

    fn reindex_order(&mut self) {
        self.order = self
            .document
            .elements
            .iter()
            .enumerate()
            .map(|(idx, el)| (el.id(), idx))
            .collect();
    }

    /// Mutable element access; marks the element stale in the index.
    pub(crate) fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        let idx = *self.order.get(&id)?;
        self.stale.insert(id);
        self.document.elements.get_mut(idx)
    }

    fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.document.layers.iter_mut().find(|layer| layer.id() == id)
    }

    fn relink_layer(&mut self, id: ElementId, from: LayerId, to: LayerId) {
        if let Some(layer) = self.layer_mut(from) {
            layer.remove_member(id);
        }
        if let Some(layer) = self.layer_mut(to) {
            layer.add_member(id);
        }
    }

    fn ensure_active_layer(&mut self) {
        if self.get_layer(self.active_layer).is_none() {
            if let Some(first) = self.document.layers.first() {
                self.active_layer = first.id();
            }
        }
    }

    fn prune_selection(&mut self) {
        let order = &self.order;
        self.selection.retain(|id| order.contains_key(id));
    }

    /// Push pending geometry changes into the spatial index.
    pub fn sync_index(&mut self) {
        for id in self.stale.drain() {
            match self.order.get(&id).and_then(|&idx| self.document.elements.get(idx)) {
                Some(element) => self.index.update(id, element.bounds()),
                None => self.index.remove(id),
            }
        }
    }

    /// Rebuild the spatial index from scratch.
    pub fn rebuild_index(&mut self) {
        self.stale.clear();
        self.index
            .rebuild(self.document.elements.iter().map(|el| (el.id(), el.bounds())));
        log::debug!("Rebuilt spatial index with {} elements", self.index.len());
    }

    /// Ids that may contain `point`: index hits plus everything stale.
    pub(crate) fn candidates_at(&self, point: Point) -> Vec<ElementId> {
        let mut ids = self.index.query_point(point);
        ids.extend(self.stale.iter().copied());
        ids
    }

    /// Ids that may overlap `rect`: index hits plus everything stale.
    pub(crate) fn candidates_in(&self, rect: Rect) -> Vec<ElementId> {
        let mut ids = self.index.query_rect(rect);
        ids.extend(self.stale.iter().copied());
        ids
    }

    /// Resolve ids to live elements, deduplicated, back to front.
    pub(crate) fn resolve_ordered(&self, ids: Vec<ElementId>) -> Vec<&Element> {
        let mut positions: Vec<usize> = ids
            .iter()
            .filter_map(|id| self.order.get(id).copied())
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions
            .into_iter()
            .filter_map(|idx| self.document.elements.get(idx))
            .collect()
    }

    // --- Element Operations ---

    /// Add an element on top of the z-order.
    ///
    /// Unknown layers fall back to the active layer. Returns `None` if an
    /// element with the same id already exists.
    pub fn add_element(&mut self, mut element: Element) -> Option<ElementId> {
        let id = element.id();
        if self.order.contains_key(&id) {
            log::debug!("add_element: id {id} already present, ignoring");
            return None;
        }
        if self.get_layer(element.layer_id).is_none() {
            element.layer_id = self.active_layer;
        }
        element.size = self.config.clamp_size(element.size);

        let layer_id = element.layer_id;
        let bounds = element.bounds();
        self.order.insert(id, self.document.elements.len());
        self.document.elements.push(element);
        if let Some(layer) = self.layer_mut(layer_id) {
            layer.add_member(id);
        }
        self.index.insert(id, bounds);
        Some(id)
    }

    /// Create an element of `kind` at `position` using the tool defaults.
    pub fn create_element(&mut self, kind: ElementKind, position: Point) -> Option<ElementId> {
        let defaults = self
            .tool_settings
            .for_tool(ToolKind::for_element(&kind))
            .cloned()
            .unwrap_or_default();
        let size = defaults.size.unwrap_or_else(|| kind.default_size());

        let mut element =
            Element::new(kind, position, size, self.active_layer).with_style(defaults.style);
        if let Some(text) = element.text.as_mut() {
            if let Some(font_size) = defaults.font_size {
                text.font_size = font_size;
            }
            if let Some(font_family) = defaults.font_family {
                text.font_family = font_family;
            }
        }
        self.add_element(element)
    }

    /// Create an element with the active tool, if it places elements.
    pub fn create_with_active_tool(&mut self, position: Point) -> Option<ElementId> {
        let kind = self.tool.element_kind()?;
        self.create_element(kind, position)
    }

    /// Apply a patch to an element. Returns false if the id is unknown.
    pub fn update_element(&mut self, id: ElementId, patch: ElementPatch) -> bool {
        let min = self.config.min_element_size;
        let target_layer = match patch.layer_id {
            Some(layer) if self.get_layer(layer).is_none() => {
                log::debug!("update_element: unknown layer {layer}, keeping current layer");
                None
            }
            other => other,
        };

        let Some(element) = self.element_mut(id) else {
            log::debug!("update_element: unknown element {id}");
            return false;
        };

        let refit = patch.text.is_some() || patch.size.is_some();
        if let Some(position) = patch.position {
            element.position = position;
        }
        if let Some(size) = patch.size {
            element.size = Size::new(size.width.max(min.width), size.height.max(min.height));
        }
        if let Some(style) = patch.style {
            merge_style(&mut element.style, style);
        }
        if let Some(visible) = patch.visible {
            element.visible = visible;
        }
        if let Some(locked) = patch.locked {
            element.locked = locked;
        }
        if let Some(text) = patch.text {
            element.text = Some(text);
        }
        if refit && matches!(element.kind, ElementKind::Text) {
            if let Some(text) = &element.text {
                element.size = text::fit_size(text, element.size, min);
            }
        }

        let old_layer = element.layer_id;
        if let Some(new_layer) = target_layer.filter(|layer| *layer != old_layer) {
            element.layer_id = new_layer;
            self.relink_layer(id, old_layer, new_layer);
        }
        self.sync_index();
        true
    }

    /// Delete one element. Returns false if it did not exist.
    pub fn delete_element(&mut self, id: ElementId) -> bool {
        self.delete_elements(&[id]) == 1
    }

    /// Delete elements, removing them from the selection, their layers and
    /// every relation that referenced them. Returns how many were deleted.
    pub fn delete_elements(&mut self, ids: &[ElementId]) -> usize {
        let doomed: HashSet<ElementId> = ids
            .iter()
            .copied()
            .filter(|id| self.contains(*id))
            .collect();
        if doomed.is_empty() {
            log::debug!("delete_elements: nothing to delete");
            return 0;
        }

        self.document.elements.retain(|el| !doomed.contains(&el.id()));
        for element in &mut self.document.elements {
            element.remap_references(&|id| (!doomed.contains(&id)).then_some(id));
        }
        for layer in &mut self.document.layers {
            layer.elements.retain(|id| !doomed.contains(id));
        }
        for &id in &doomed {
            self.selection.remove(&id);
            self.stale.remove(&id);
            self.index.remove(id);
        }
        self.reindex_order();
        doomed.len()
    }

    /// Delete every selected element.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.selected_ids();
        self.delete_elements(&ids)
    }

    /// Select elements. With `multi_select` each id toggles; otherwise the
    /// selection is replaced. Unknown ids are ignored.
    pub fn select_elements(&mut self, ids: &[ElementId], multi_select: bool) {
        if !multi_select {
            self.selection.clear();
        }
        for &id in ids {
            if !self.contains(id) {
                log::debug!("select_elements: unknown element {id}");
                continue;
            }
            if multi_select && self.selection.contains(&id) {
                self.selection.remove(&id);
            } else {
                self.selection.insert(id);
            }
        }
    }

    /// Select a single element (clears previous selection).
    pub fn select(&mut self, id: ElementId) {
        self.select_elements(&[id], false);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Select every visible, unlocked element.
    pub fn select_all(&mut self) {
        let ids: HashSet<ElementId> = self
            .document
            .elements
            .iter()
            .filter(|el| self.is_hittable(el))
            .map(Element::id)
            .collect();
        self.selection = ids;
    }

    /// Translate elements by `delta`. Locked elements are skipped.
    pub fn move_elements(&mut self, ids: &[ElementId], delta: Vec2) -> usize {
        let mut moved = 0;
        for &id in ids {
            if !self.is_movable(id) {
                continue;
            }
            if let Some(element) = self.element_mut(id) {
                element.translate(delta);
                moved += 1;
            }
        }
        self.sync_index();
        moved
    }

    /// Grow (or shrink) elements by `delta`, clamped to the minimum size.
    pub fn resize_elements(&mut self, ids: &[ElementId], delta: Vec2) -> usize {
        let min = self.config.min_element_size;
        let mut resized = 0;
        for &id in ids {
            if !self.is_movable(id) {
                continue;
            }
            if let Some(element) = self.element_mut(id) {
                element.size = Size::new(
                    (element.size.width + delta.x).max(min.width),
                    (element.size.height + delta.y).max(min.height),
                );
                resized += 1;
            }
        }
        self.sync_index();
        resized
    }

    fn is_movable(&self, id: ElementId) -> bool {
        match self.get_element(id) {
            Some(element) => !self.is_effectively_locked(element),
            None => {
                log::debug!("Unknown element {id}");
                false
            }
        }
    }

    // --- Z-order ---

    /// Bring an element to the front (topmost).
    pub fn bring_to_front(&mut self, id: ElementId) -> bool {
        let Some(idx) = self.element_index(id) else {
            return false;
        };
        let element = self.document.elements.remove(idx);
        self.document.elements.push(element);
        self.reindex_order();
        true
    }

    /// Send an element to the back (bottommost).
    pub fn send_to_back(&mut self, id: ElementId) -> bool {
        let Some(idx) = self.element_index(id) else {
            return false;
        };
        let element = self.document.elements.remove(idx);
        self.document.elements.insert(0, element);
        self.reindex_order();
        true
    }

    /// Move an element one step towards the front.
    /// Returns false if it is already at the front.
    pub fn bring_forward(&mut self, id: ElementId) -> bool {
        match self.element_index(id) {
            Some(idx) if idx + 1 < self.document.elements.len() => {
                self.document.elements.swap(idx, idx + 1);
                self.reindex_order();
                true
            }
            _ => false,
        }
    }

    /// Move an element one step towards the back.
    /// Returns false if it is already at the back.
    pub fn send_backward(&mut self, id: ElementId) -> bool {
        match self.element_index(id) {
            Some(idx) if idx > 0 => {
                self.document.elements.swap(idx, idx - 1);
                self.reindex_order();
                true
            }
            _ => false,
        }
    }

    // --- Layers ---

    /// Append a new layer on top.
    pub fn add_layer(&mut self, name: impl Into<String>) -> LayerId {
        let layer = Layer::new(name);
        let id = layer.id();
        self.document.layers.push(layer);
        id
    }

    /// Delete a layer and all of its elements. The last layer cannot be deleted.
    pub fn delete_layer(&mut self, id: LayerId) -> bool {
        if self.get_layer(id).is_none() {
            log::debug!("delete_layer: unknown layer {id}");
            return false;
        }
        if self.document.layers.len() <= 1 {
            log::debug!("delete_layer: refusing to delete the last layer");
            return false;
        }

        let members: Vec<ElementId> = self
            .document
            .elements
            .iter()
            .filter(|el| el.layer_id == id)
            .map(Element::id)
            .collect();
        self.delete_elements(&members);
        self.document.layers.retain(|layer| layer.id() != id);
        self.ensure_active_layer();
        true
    }

    pub fn rename_layer(&mut self, id: LayerId, name: impl Into<String>) -> bool {
        match self.layer_mut(id) {
            Some(layer) => {
                layer.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Show or hide a layer. Hiding deselects its elements.
    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> bool {
        let Some(layer) = self.layer_mut(id) else {
            return false;
        };
        layer.visible = visible;
        if !visible {
            self.deselect_layer(id);
        }
        true
    }

    /// Lock or unlock a layer. Locking deselects its elements.
    pub fn set_layer_locked(&mut self, id: LayerId, locked: bool) -> bool {
        let Some(layer) = self.layer_mut(id) else {
            return false;
        };
        layer.locked = locked;
        if locked {
            self.deselect_layer(id);
        }
        true
    }

    fn deselect_layer(&mut self, id: LayerId) {
        let members: Vec<ElementId> = self
            .document
            .elements
            .iter()
            .filter(|el| el.layer_id == id)
            .map(Element::id)
            .collect();
        for member in members {
            self.selection.remove(&member);
        }
    }

    /// Layer that new elements are created on.
    pub fn set_active_layer(&mut self, id: LayerId) -> bool {
        if self.get_layer(id).is_none() {
            log::debug!("set_active_layer: unknown layer {id}");
            return false;
        }
        self.active_layer = id;
        true
    }

    /// Move elements to another layer. Returns how many changed layer.
    pub fn move_elements_to_layer(&mut self, ids: &[ElementId], layer: LayerId) -> usize {
        if self.get_layer(layer).is_none() {
            log::debug!("move_elements_to_layer: unknown layer {layer}");
            return 0;
        }
        let mut moved = 0;
        for &id in ids {
            let Some(old) = self.get_element(id).map(|el| el.layer_id) else {
                continue;
            };
            if old == layer {
                continue;
            }
            if let Some(element) = self.element_mut(id) {
                element.layer_id = layer;
            }
            self.relink_layer(id, old, layer);
            moved += 1;
        }
        moved
    }

    // --- Viewport ---

    pub fn set_zoom(&mut self, zoom: f64) {
        self.document.viewport.zoom = zoom;
    }

    pub fn set_pan(&mut self, pan: Vec2) {
        self.document.viewport.pan = pan;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.document.viewport = viewport;
    }

    /// Pan by a screen-space delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.document.viewport.pan_by(delta);
    }

    /// Zoom by `factor` around a screen point.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        self.document.viewport.zoom_at(screen_point, factor);
    }

    /// Fit the view to show all elements.
    pub fn fit_to_content(&mut self, screen_size: Size) {
        if let Some(bounds) = self.bounds() {
            self.document.viewport.fit_to_bounds(bounds, screen_size, 50.0);
        }
    }

    // --- Tools ---

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
    }

    pub fn tool_settings(&self) -> &ToolSettings {
        &self.tool_settings
    }

    pub fn tool_settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.tool_settings
    }

    // --- History ---

    /// Copy of the undoable state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            elements: self.document.elements.clone(),
            layers: self.document.layers.clone(),
        }
    }

    /// Record the current state as a committed step.
    ///
    /// Call before a mutation so that `undo` reverts it.
    pub fn push_history(&mut self) {
        let snapshot = self.snapshot();
        self.record_history(snapshot);
    }

    /// Record an earlier captured state as a committed step.
    pub(crate) fn record_history(&mut self, snapshot: Snapshot) {
        self.history.record(snapshot);
        self.sync_index();
    }

    /// Undo the last committed step.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    /// Redo the last undone step.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            return false;
        }
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.document.elements = snapshot.elements;
        self.document.layers = snapshot.layers;
        self.after_replace();
    }

    fn after_replace(&mut self) {
        self.ensure_active_layer();
        self.reindex_order();
        self.prune_selection();
        self.rebuild_index();
    }

    // --- Serialization ---

    /// Snapshot of the persisted scene contents.
    pub fn serialize(&self) -> SceneDocument {
        self.document.clone()
    }

    /// Serialize the scene document to JSON.
    pub fn to_json(&self) -> Result<String> {
        self.document.to_json()
    }

    /// Replace the whole document, e.g. with a remote full-state update.
    ///
    /// The document is repaired first; history is kept, selection pruned and
    /// the index rebuilt.
    pub fn replace_document(&mut self, document: SceneDocument) -> Result<()> {
        let document = document::normalize(document, &ImportOptions::default())?;
        log::info!(
            "Replacing scene: {} elements in {} layers",
            document.elements.len(),
            document.layers.len()
        );
        self.document = document;
        self.after_replace();
        Ok(())
    }

    /// Merge a document into the scene as one undoable step and select the
    /// pasted elements. Layers unknown to the scene are added; elements whose
    /// ids already exist are skipped.
    pub fn paste_document(&mut self, document: SceneDocument) -> Vec<ElementId> {
        let before = self.snapshot();

        for layer in &document.layers {
            if self.get_layer(layer.id()).is_none() {
                let mut layer = layer.clone();
                layer.elements.clear();
                self.document.layers.push(layer);
            }
        }
        let pasted: Vec<ElementId> = document
            .elements
            .into_iter()
            .filter_map(|element| self.add_element(element))
            .collect();

        if pasted.is_empty() {
            log::debug!("paste_document: nothing pasted");
            return pasted;
        }
        log::info!("Pasted {} elements", pasted.len());
        self.record_history(before);
        self.selection = pasted.iter().copied().collect();
        pasted
    }

    /// Copy the selected elements (and the layers they sit on) into a new
    /// document, e.g. for the clipboard.
    pub fn export_selection(&self) -> SceneDocument {
        let elements: Vec<Element> = self
            .document
            .elements
            .iter()
            .filter(|el| self.selection.contains(&el.id()))
            .cloned()
            .collect();
        let layers = self
            .document
            .layers
            .iter()
            .filter(|layer| elements.iter().any(|el| el.layer_id == layer.id()))
            .map(|layer| {
                let mut layer = layer.clone();
                layer
                    .elements
                    .retain(|id| elements.iter().any(|el| el.id() == *id));
                layer
            })
            .collect();
        SceneDocument {
            elements,
            layers,
            viewport: Viewport::default(),
        }
    }
}
