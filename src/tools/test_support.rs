//! Shared fixtures for tool tests: a recording host and a pointer driver.

use std::sync::Arc;

use super::{ToolEvent, ToolEventData, ToolHost, ToolId, ToolRegistry};
use crate::engine::{PointerContext, PointerKind};
use crate::geometry::Point;
use crate::scene::{FieldSize, Orientation, Scene};

#[derive(Debug, Default)]
pub(crate) struct RecordingHost {
    pub commits: usize,
    pub events: Vec<ToolEvent>,
}

impl ToolHost for RecordingHost {
    fn commit(&mut self, scene: Scene) -> Arc<Scene> {
        self.commits += 1;
        Arc::new(scene)
    }

    fn emit(&mut self, event: ToolEvent) {
        self.events.push(event);
    }
}

/// Drives a registry with synthetic pointer events on pointer id 1.
pub(crate) struct Harness {
    pub registry: ToolRegistry,
    pub host: RecordingHost,
    pub field_per_px: f64,
    pub pointer_id: i32,
    clock: i64,
}

impl Harness {
    pub fn new(scene: Scene, tool: ToolId) -> Self {
        let mut registry = ToolRegistry::new(Arc::new(scene));
        registry.set_active_tool(tool);
        Self { registry, host: RecordingHost::default(), field_per_px: 0.1, pointer_id: 1, clock: 1_000 }
    }

    pub fn empty(tool: ToolId) -> Self {
        Self::new(Scene::new(FieldSize { width: 100.0, height: 50.0 }, Orientation::Landscape), tool)
    }

    pub fn scene(&self) -> &Scene {
        self.registry.scene()
    }

    pub fn send(&mut self, kind: PointerKind, x: f64, y: f64, buttons: u16) {
        self.clock += 16;
        let ctx = PointerContext {
            kind,
            pointer_id: self.pointer_id,
            point: Point::new(x, y),
            screen: Point::new(x / self.field_per_px, y / self.field_per_px),
            buttons,
            timestamp_ms: self.clock,
            field_per_px: self.field_per_px,
        };
        self.registry.handle_pointer(&ctx, &mut self.host);
    }

    pub fn down(&mut self, x: f64, y: f64) {
        self.send(PointerKind::Down, x, y, 1);
    }

    pub fn drag(&mut self, x: f64, y: f64) {
        self.send(PointerKind::Move, x, y, 1);
    }

    pub fn hover(&mut self, x: f64, y: f64) {
        self.send(PointerKind::Move, x, y, 0);
    }

    pub fn up(&mut self, x: f64, y: f64) {
        self.send(PointerKind::Up, x, y, 0);
    }

    pub fn cancel(&mut self, x: f64, y: f64) {
        self.send(PointerKind::Cancel, x, y, 0);
    }

    /// Drain emitted event payloads.
    pub fn take_events(&mut self) -> Vec<ToolEventData> {
        self.host.events.drain(..).map(|event| event.data).collect()
    }
}
