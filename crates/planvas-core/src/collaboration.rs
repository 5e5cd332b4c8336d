//! Presence overlay for collaborative editing.
//!
//! Remote users announce which element they are editing; the overlay keeps
//! an advisory lock per element and a short list of notifications for
//! display. Nothing here blocks local edits. Racing events resolve by last
//! writer wins. Times are milliseconds supplied by the caller.

use crate::color::SerializableColor;
use crate::config::EngineConfig;
use crate::element::ElementId;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Event-specific part of a [`RemoteEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemoteEventKind {
    /// The user started editing the element.
    EditStart,
    /// The user finished editing the element.
    EditEnd,
    /// Free-form message about the element.
    Notification { message: String },
}

/// Presence event received from the collaboration transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEvent {
    pub element_id: ElementId,
    pub user_id: String,
    /// CSS-style hex color of the user.
    pub user_color: String,
    #[serde(flatten)]
    pub kind: RemoteEventKind,
    /// Milliseconds since the epoch, as stamped by the sender.
    pub timestamp: u64,
}

impl RemoteEvent {
    /// Decode an event from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode the event as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn color(&self) -> SerializableColor {
        SerializableColor::from_hex(&self.user_color).unwrap_or_else(|| {
            log::debug!("Unparseable user color {:?}", self.user_color);
            SerializableColor::black()
        })
    }
}

/// Advisory lock held by a remote user.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementLock {
    pub locked_by: String,
    pub color: SerializableColor,
    /// When the lock was taken, in milliseconds.
    pub acquired_at: u64,
}

/// A message shown to the local user for a short while.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Monotonic id, unique within the overlay.
    pub id: u64,
    pub element_id: ElementId,
    pub user_id: String,
    pub color: SerializableColor,
    pub message: String,
    pub created_at: u64,
}

/// Remote locks and notifications.
#[derive(Debug, Clone)]
pub struct CollaborationOverlay {
    locks: HashMap<ElementId, ElementLock>,
    /// Newest first by `created_at`.
    notifications: VecDeque<Notification>,
    next_notification_id: u64,
    lock_timeout_ms: u64,
    notification_cap: usize,
    notification_ttl_ms: u64,
}

impl Default for CollaborationOverlay {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl CollaborationOverlay {
    /// Create an empty overlay using the timing limits from `config`.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            locks: HashMap::new(),
            notifications: VecDeque::new(),
            next_notification_id: 0,
            lock_timeout_ms: config.lock_timeout_ms,
            notification_cap: config.notification_cap,
            notification_ttl_ms: config.notification_ttl_ms,
        }
    }

    /// Apply a remote event.
    pub fn handle_event(&mut self, event: &RemoteEvent) {
        match &event.kind {
            RemoteEventKind::EditStart => {
                self.add_lock(event.element_id, &event.user_id, event.color(), event.timestamp);
                let message = format!("{} is editing", event.user_id);
                self.push_notification(event, message);
            }
            RemoteEventKind::EditEnd => {
                // A stale edit-end must not release someone else's newer lock.
                let held_by_sender = self
                    .locks
                    .get(&event.element_id)
                    .is_some_and(|lock| lock.locked_by == event.user_id);
                if held_by_sender {
                    self.remove_lock(event.element_id);
                }
            }
            RemoteEventKind::Notification { message } => {
                self.push_notification(event, message.clone());
            }
        }
    }

    // --- Locks ---

    /// Lock an element for `user_id`, replacing any existing lock.
    pub fn add_lock(
        &mut self,
        element_id: ElementId,
        user_id: &str,
        color: SerializableColor,
        now: u64,
    ) {
        if let Some(previous) = self.locks.get(&element_id) {
            if previous.locked_by != user_id {
                log::debug!(
                    "Lock on {element_id} moves from {} to {user_id}",
                    previous.locked_by
                );
            }
        }
        self.locks.insert(
            element_id,
            ElementLock {
                locked_by: user_id.to_string(),
                color,
                acquired_at: now,
            },
        );
    }

    /// Release the lock on an element. Returns false if it was not locked.
    pub fn remove_lock(&mut self, element_id: ElementId) -> bool {
        self.locks.remove(&element_id).is_some()
    }

    /// Current lock on an element.
    pub fn lock_for(&self, element_id: ElementId) -> Option<&ElementLock> {
        self.locks.get(&element_id)
    }

    /// Whether someone other than `local_user` holds the element.
    pub fn is_locked_by_other(&self, element_id: ElementId, local_user: &str) -> bool {
        self.locks
            .get(&element_id)
            .is_some_and(|lock| lock.locked_by != local_user)
    }

    pub fn locks(&self) -> impl Iterator<Item = (&ElementId, &ElementLock)> {
        self.locks.iter()
    }

    /// Drop locks older than the timeout. Returns how many were dropped.
    pub fn expire_locks(&mut self, now: u64) -> usize {
        let timeout = self.lock_timeout_ms;
        let before = self.locks.len();
        self.locks
            .retain(|_, lock| now.saturating_sub(lock.acquired_at) < timeout);
        before - self.locks.len()
    }

    /// Drop locks on elements for which `exists` returns false.
    pub fn retain_elements(&mut self, exists: impl Fn(ElementId) -> bool) {
        self.locks.retain(|&id, _| exists(id));
    }

    // --- Notifications ---

    fn push_notification(&mut self, event: &RemoteEvent, message: String) {
        let notification = Notification {
            id: self.next_notification_id,
            element_id: event.element_id,
            user_id: event.user_id.clone(),
            color: event.color(),
            message,
            created_at: event.timestamp,
        };
        self.next_notification_id += 1;
        // Newest first by timestamp; ties go to the later arrival.
        let at = self
            .notifications
            .iter()
            .position(|n| n.created_at <= notification.created_at)
            .unwrap_or(self.notifications.len());
        self.notifications.insert(at, notification);
        self.notifications.truncate(self.notification_cap);
    }

    /// Unexpired notifications, newest first.
    pub fn visible_notifications(&self, now: u64) -> Vec<&Notification> {
        self.notifications
            .iter()
            .filter(|n| !self.is_expired(n, now))
            .collect()
    }

    /// Remove expired notifications.
    pub fn prune(&mut self, now: u64) {
        let ttl = self.notification_ttl_ms;
        self.notifications
            .retain(|n| now.saturating_sub(n.created_at) < ttl);
    }

    /// Dismiss one notification by id.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        self.notifications.len() != before
    }

    fn is_expired(&self, notification: &Notification, now: u64) -> bool {
        now.saturating_sub(notification.created_at) >= self.notification_ttl_ms
    }

    pub fn clear(&mut self) {
        self.locks.clear();
        self.notifications.clear();
    }
}
