//! Snapshot-based undo/redo.
//!
//! Every entry is a full deep copy of the element collection (plus the layer
//! list, so layer membership survives undo). Cost per step is O(element
//! count), bounded by the cap.

use crate::element::Element;
use crate::layer::Layer;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default maximum number of undo steps.
pub const DEFAULT_HISTORY_CAP: usize = 20;

/// A full copy of the undoable scene state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub elements: Vec<Element>,
    pub layers: Vec<Layer>,
}

/// Linear undo/redo stacks.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Snapshot>,
    future: Vec<Snapshot>,
    cap: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

impl History {
    pub fn new(cap: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(cap.min(64)),
            future: Vec::new(),
            cap,
        }
    }

    /// Record a committed step; clears redo and evicts the oldest beyond the cap.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.past.push_back(snapshot);
        self.future.clear();
        while self.past.len() > self.cap {
            self.past.pop_front();
        }
    }

    /// Step back. `current` goes onto the redo stack; returns the state to restore.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    /// Step forward. `current` goes onto the undo stack; returns the state to restore.
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.future.pop()?;
        self.past.push_back(current);
        while self.past.len() > self.cap {
            self.past.pop_front();
        }
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Change the cap, evicting the oldest entries if needed.
    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap;
        while self.past.len() > self.cap {
            self.past.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}
