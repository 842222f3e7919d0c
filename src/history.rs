//! Bounded undo/redo over scene snapshots.
//!
//! Every committed scene becomes the new present; the previous present is
//! pushed onto the undo stack unless a batch is open. A batch groups the
//! commits of one gesture (pointer down through up) into a single undo
//! entry, and is dropped entirely when the gesture left the content as it
//! found it. Both stacks hold at most `capacity` entries; the oldest are
//! evicted silently.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;

use crate::consts::DEFAULT_HISTORY_CAPACITY;
use crate::scene::Scene;

#[derive(Debug, Clone)]
pub struct History {
    present: Arc<Scene>,
    undo: VecDeque<Arc<Scene>>,
    redo: VecDeque<Arc<Scene>>,
    capacity: usize,
    batch_start: Option<Arc<Scene>>,
}

impl History {
    #[must_use]
    pub fn new(initial: Arc<Scene>, capacity: usize) -> Self {
        Self {
            present: initial,
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            capacity: capacity.max(1),
            batch_start: None,
        }
    }

    #[must_use]
    pub fn with_default_capacity(initial: Arc<Scene>) -> Self {
        Self::new(initial, DEFAULT_HISTORY_CAPACITY)
    }

    #[must_use]
    pub fn present(&self) -> &Arc<Scene> {
        &self.present
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.batch_start.is_some()
    }

    /// Make `scene` the present. Outside a batch this records an undo entry
    /// and clears the redo stack.
    pub fn commit(&mut self, scene: Scene) -> Arc<Scene> {
        let next = Arc::new(scene);
        if self.batch_start.is_none() {
            let previous = std::mem::replace(&mut self.present, Arc::clone(&next));
            self.record(previous);
        } else {
            self.present = Arc::clone(&next);
        }
        next
    }

    /// Open a batch at the current present. Nested calls are ignored.
    pub fn begin_batch(&mut self) {
        if self.batch_start.is_none() {
            self.batch_start = Some(Arc::clone(&self.present));
        }
    }

    /// Close the batch. Returns `true` when it produced an undo entry.
    pub fn end_batch(&mut self) -> bool {
        let Some(start) = self.batch_start.take() else {
            return false;
        };
        if self.present.same_content(&start) {
            return false;
        }
        self.record(start);
        true
    }

    /// Close the batch and return to the scene it started from.
    pub fn abort_batch(&mut self) -> Option<Arc<Scene>> {
        let start = self.batch_start.take()?;
        if self.present.same_content(&start) {
            return None;
        }
        debug!("batch aborted; restoring");
        self.present = self.restamped(&start);
        Some(Arc::clone(&self.present))
    }

    /// Step back one entry. An open batch is closed first.
    pub fn undo(&mut self) -> Option<Arc<Scene>> {
        self.end_batch();
        let previous = self.undo.pop_back()?;
        let restored = self.restamped(&previous);
        let current = std::mem::replace(&mut self.present, restored);
        push_bounded(&mut self.redo, current, self.capacity);
        debug!(undo = self.undo.len(), redo = self.redo.len(), "undo");
        Some(Arc::clone(&self.present))
    }

    /// Step forward one entry. An open batch is closed first.
    pub fn redo(&mut self) -> Option<Arc<Scene>> {
        if self.end_batch() {
            return None;
        }
        let next = self.redo.pop_back()?;
        let restored = self.restamped(&next);
        let current = std::mem::replace(&mut self.present, restored);
        push_bounded(&mut self.undo, current, self.capacity);
        debug!(undo = self.undo.len(), redo = self.redo.len(), "redo");
        Some(Arc::clone(&self.present))
    }

    /// Replace the whole history with a single present.
    pub fn reset(&mut self, scene: Arc<Scene>) {
        self.present = scene;
        self.undo.clear();
        self.redo.clear();
        self.batch_start = None;
    }

    fn record(&mut self, previous: Arc<Scene>) {
        push_bounded(&mut self.undo, previous, self.capacity);
        self.redo.clear();
    }

    /// A copy of `scene` stamped after the present, so restored snapshots
    /// still advance `last_updated_at`.
    fn restamped(&self, scene: &Scene) -> Arc<Scene> {
        let mut restored = scene.clone();
        restored.touch(self.present.last_updated_at.saturating_add(1));
        Arc::new(restored)
    }
}

fn push_bounded(stack: &mut VecDeque<Arc<Scene>>, scene: Arc<Scene>, capacity: usize) {
    stack.push_back(scene);
    while stack.len() > capacity {
        stack.pop_front();
    }
}
