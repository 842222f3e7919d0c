//! Per-pointer gesture sessions.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::HashMap;

use tracing::debug;

use crate::consts::MAX_ACTIVE_POINTERS;

/// Bounded map of in-flight gestures keyed by pointer id.
#[derive(Debug)]
pub struct PointerSessions<T> {
    sessions: HashMap<i32, T>,
    capacity: usize,
}

impl<T> Default for PointerSessions<T> {
    fn default() -> Self {
        Self::with_capacity(MAX_ACTIVE_POINTERS)
    }
}

impl<T> PointerSessions<T> {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { sessions: HashMap::new(), capacity: capacity.max(1) }
    }

    /// Start (or restart) the session for `pointer_id`. Returns `false`
    /// when the map is full and the pointer is new; the event is ignored.
    pub fn begin(&mut self, pointer_id: i32, session: T) -> bool {
        if !self.sessions.contains_key(&pointer_id) && self.sessions.len() >= self.capacity {
            debug!(pointer_id, capacity = self.capacity, "too many active pointers; ignoring");
            return false;
        }
        self.sessions.insert(pointer_id, session);
        true
    }

    #[must_use]
    pub fn get(&self, pointer_id: i32) -> Option<&T> {
        self.sessions.get(&pointer_id)
    }

    pub fn get_mut(&mut self, pointer_id: i32) -> Option<&mut T> {
        self.sessions.get_mut(&pointer_id)
    }

    /// Finish the session for `pointer_id`, returning its state.
    pub fn end(&mut self, pointer_id: i32) -> Option<T> {
        self.sessions.remove(&pointer_id)
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
