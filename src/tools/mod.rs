//! Tool registry: pointer-interaction state machines that edit the scene.
//!
//! Exactly one tool is active at a time. The registry routes each
//! [`PointerContext`] to it together with a [`ToolRuntime`], the narrow
//! view a tool gets of the outside world: read the current scene, commit a
//! mutated copy through [`ToolRuntime::update_scene`], read or change the
//! shared selection, and emit [`ToolEvent`]s for UI feedback.
//!
//! Every tool follows `idle → active (down) → updating (move with a button
//! held) → idle (up/cancel)`, tracking one session per pointer id so
//! simultaneous pointers never interfere.

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;

pub mod arrow;
pub mod cone;
pub mod creation;
pub mod eraser;
pub mod hit;
pub mod line;
pub mod pen;
pub mod select;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{Highlight, PointerContext};
use crate::scene::{DrawingKind, Scene, ShapeId, ShapeRef};

pub use arrow::ArrowTool;
pub use cone::ConeTool;
pub use eraser::EraserTool;
pub use hit::{HitAction, HitTarget};
pub use line::LineTool;
pub use pen::PenTool;
pub use select::SelectTool;

/// Errors returned by registry calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

// =============================================================
// Tool ids
// =============================================================

/// Built-in tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolId {
    #[default]
    Select,
    Line,
    Pen,
    Arrow,
    Cone,
    Eraser,
}

impl ToolId {
    pub const ALL: [ToolId; 6] = [
        ToolId::Select,
        ToolId::Line,
        ToolId::Pen,
        ToolId::Arrow,
        ToolId::Cone,
        ToolId::Eraser,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Line => "line",
            Self::Pen => "pen",
            Self::Arrow => "arrow",
            Self::Cone => "cone",
            Self::Eraser => "eraser",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolId {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

// =============================================================
// Settings
// =============================================================

/// Per-tool configuration. Fields a tool does not use are ignored; values
/// out of range are clamped by the tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    /// Stroke width in field units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Eraser radius, or the circle token radius for select, in field units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    /// Pen decimation threshold in field units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_distance: Option<f64>,
    /// Handle grab radius in CSS pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle_radius_px: Option<f64>,
}

impl ToolSettings {
    /// Overlay the fields set in `other` onto `self`.
    #[must_use]
    pub fn merged(mut self, other: &ToolSettings) -> Self {
        if other.stroke.is_some() {
            self.stroke.clone_from(&other.stroke);
        }
        if other.fill.is_some() {
            self.fill.clone_from(&other.fill);
        }
        self.width = other.width.or(self.width);
        self.radius = other.radius.or(self.radius);
        self.min_distance = other.min_distance.or(self.min_distance);
        self.handle_radius_px = other.handle_radius_px.or(self.handle_radius_px);
        self
    }
}

// =============================================================
// Events
// =============================================================

/// Feedback emitted by tools.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ToolEventData {
    HoverChanged { target: Option<HitTarget> },
    SelectionChanged { selection: Option<ShapeRef> },
    DragStarted { target: HitTarget },
    DragReleased { target: HitTarget, cancelled: bool },
    Deleted { shape: ShapeRef },
    ShapeStarted { id: ShapeId, kind: DrawingKind },
    ShapeCommitted { id: ShapeId, kind: DrawingKind },
    ShapeDiscarded { id: ShapeId, kind: DrawingKind },
    Erased { removed: Vec<ShapeId>, created: Vec<ShapeId> },
}

/// One tool event with the pointer context that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolEvent {
    pub tool_id: ToolId,
    pub context: PointerContext,
    pub data: ToolEventData,
}

// =============================================================
// Host / runtime
// =============================================================

/// Host side of the tool runtime.
pub trait ToolHost {
    /// Accept a mutated scene and return the snapshot now in effect.
    fn commit(&mut self, scene: Scene) -> Arc<Scene>;
    fn emit(&mut self, event: ToolEvent);
}

/// Narrow runtime handed to a tool for the duration of one event.
pub struct ToolRuntime<'a> {
    tool_id: ToolId,
    context: PointerContext,
    scene: &'a mut Arc<Scene>,
    selection: &'a mut Option<ShapeRef>,
    host: &'a mut dyn ToolHost,
}

impl<'a> ToolRuntime<'a> {
    pub fn new(
        tool_id: ToolId,
        context: PointerContext,
        scene: &'a mut Arc<Scene>,
        selection: &'a mut Option<ShapeRef>,
        host: &'a mut dyn ToolHost,
    ) -> Self {
        Self { tool_id, context, scene, selection, host }
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &**self.scene
    }

    /// Copy the scene, apply `mutate`, stamp it with the event time and
    /// commit it through the host.
    pub fn update_scene<F>(&mut self, mutate: F)
    where
        F: FnOnce(&mut Scene),
    {
        let mut next = (**self.scene).clone();
        mutate(&mut next);
        next.touch(self.context.timestamp_ms);
        *self.scene = self.host.commit(next);
    }

    pub fn emit(&mut self, data: ToolEventData) {
        self.host.emit(ToolEvent { tool_id: self.tool_id, context: self.context, data });
    }

    #[must_use]
    pub fn selection(&self) -> Option<ShapeRef> {
        *self.selection
    }

    /// Replace the selection, emitting `SelectionChanged` when it differs.
    pub fn set_selection(&mut self, selection: Option<ShapeRef>) {
        if *self.selection != selection {
            *self.selection = selection;
            self.emit(ToolEventData::SelectionChanged { selection });
        }
    }
}

/// A pointer-driven scene editor.
pub trait Tool {
    fn id(&self) -> ToolId;
    fn handle(&mut self, ctx: &PointerContext, rt: &mut ToolRuntime<'_>);
    fn configure(&mut self, settings: &ToolSettings);
    /// Effective configuration after clamping.
    fn settings(&self) -> ToolSettings;
    /// Drop all pointer sessions and transient state.
    fn reset(&mut self);
    /// Target under the pointer while idle, if the tool tracks hover.
    fn hover(&self) -> Option<HitTarget> {
        None
    }
}

// =============================================================
// Registry
// =============================================================

/// Owns the tools, the active tool id, the current scene snapshot and the
/// shared selection.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    active: ToolId,
    scene: Arc<Scene>,
    selection: Option<ShapeRef>,
}

impl ToolRegistry {
    /// A registry with the six built-in tools; `select` is active.
    #[must_use]
    pub fn new(scene: Arc<Scene>) -> Self {
        let tools: Vec<Box<dyn Tool>> = vec![
            Box::new(SelectTool::default()),
            Box::new(LineTool::default()),
            Box::new(PenTool::default()),
            Box::new(ArrowTool::default()),
            Box::new(ConeTool::default()),
            Box::new(EraserTool::default()),
        ];
        Self { tools, active: ToolId::Select, scene, selection: None }
    }

    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolId> {
        self.tools.iter().map(|tool| tool.id()).collect()
    }

    #[must_use]
    pub fn active_tool(&self) -> ToolId {
        self.active
    }

    /// Switch tools. In-flight sessions of the previous tool are dropped.
    pub fn set_active_tool(&mut self, id: ToolId) {
        if id == self.active {
            return;
        }
        if let Some(tool) = self.tool_mut(self.active) {
            tool.reset();
        }
        debug!(from = %self.active, to = %id, "tool switched");
        self.active = id;
    }

    /// Switch tools by name.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] for an unrecognized name.
    pub fn activate(&mut self, name: &str) -> Result<(), ToolError> {
        let id: ToolId = name.parse()?;
        self.set_active_tool(id);
        Ok(())
    }

    pub fn configure_tool(&mut self, id: ToolId, settings: &ToolSettings) {
        if let Some(tool) = self.tool_mut(id) {
            tool.configure(settings);
        }
    }

    /// Configure a tool by name.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] for an unrecognized name.
    pub fn configure_tool_named(&mut self, name: &str, settings: &ToolSettings) -> Result<(), ToolError> {
        let id: ToolId = name.parse()?;
        self.configure_tool(id, settings);
        Ok(())
    }

    #[must_use]
    pub fn tool_settings(&self, id: ToolId) -> Option<ToolSettings> {
        self.tools.iter().find(|tool| tool.id() == id).map(|tool| tool.settings())
    }

    #[must_use]
    pub fn scene(&self) -> &Arc<Scene> {
        &self.scene
    }

    /// Install a snapshot produced outside the tools (undo, load, spawn).
    /// A selection pointing at a shape that no longer exists is cleared.
    pub fn update_scene(&mut self, scene: Arc<Scene>) {
        if self.selection.is_some_and(|sel| !scene.contains(sel)) {
            self.selection = None;
        }
        self.scene = scene;
    }

    #[must_use]
    pub fn selection(&self) -> Option<ShapeRef> {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Option<ShapeRef>) {
        self.selection = selection.filter(|sel| self.scene.contains(*sel));
    }

    /// Selection and hover state for the overlay layer.
    #[must_use]
    pub fn highlight(&self) -> Highlight {
        let hover = self.tools.iter().find(|tool| tool.id() == self.active).and_then(|tool| tool.hover());
        Highlight {
            selected: self.selection,
            hovered: hover.map(|target| target.shape),
            hovered_handle: hover.and_then(|target| target.handle),
        }
    }

    /// Route one pointer event to the active tool.
    pub fn handle_pointer(&mut self, ctx: &PointerContext, host: &mut dyn ToolHost) {
        let active = self.active;
        let Some(tool) = self.tools.iter_mut().find(|tool| tool.id() == active) else {
            debug!(tool = %active, "no tool registered for active id");
            return;
        };
        let mut rt = ToolRuntime::new(active, *ctx, &mut self.scene, &mut self.selection, host);
        tool.handle(ctx, &mut rt);
    }

    fn tool_mut(&mut self, id: ToolId) -> Option<&mut (dyn Tool + 'static)> {
        self.tools.iter_mut().find(|tool| tool.id() == id).map(|tool| &mut **tool)
    }
}
