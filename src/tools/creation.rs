//! Shared state machine for the shape-creation tools (line, pen, arrow, cone).
//!
//! On `down` the tool either grabs a handle of the selected shape of its
//! own kind or starts a new shape at the pointer. Moves with a button held
//! extend the new shape or drag the grabbed handle. On `up` a degenerate
//! result is discarded (new shape) or reverted (edit). `cancel` always
//! leaves the scene as it was before `down`.

use tracing::debug;

use super::hit::{HitTarget, hit_handle};
use super::session::PointerSessions;
use super::{Tool, ToolEventData, ToolId, ToolRuntime, ToolSettings};
use crate::consts::{DEFAULT_STROKE_WIDTH, HANDLE_RADIUS_PX, MIN_STROKE_WIDTH};
use crate::engine::{PointerContext, PointerKind};
use crate::geometry::Point;
use crate::scene::{Drawing, DrawingKind, Handle, ShapeId, ShapeRef};

/// Kind-specific behavior plugged into [`CreationTool`].
pub trait ShapeSpec {
    const TOOL: ToolId;
    const KIND: DrawingKind;
    /// Handle that follows the pointer while a new shape is being drawn.
    const GROW_HANDLE: Handle;

    /// A fresh shape anchored at `at`.
    fn start(&self, at: Point, now_ms: i64) -> Drawing;

    /// Follow the pointer while creating.
    fn extend(&self, drawing: &mut Drawing, to: Point) {
        drawing.move_handle(Self::GROW_HANDLE, to);
    }

    fn is_degenerate(&self, drawing: &Drawing) -> bool;

    fn configure(&mut self, settings: &ToolSettings);

    fn settings(&self) -> ToolSettings;
}

#[derive(Debug, Clone)]
enum CreationSession {
    New { id: ShapeId },
    Edit { handle: Handle, origin: Point, start: Point, original: Drawing },
}

/// A creation tool for one drawing kind.
#[derive(Debug)]
pub struct CreationTool<K: ShapeSpec> {
    spec: K,
    sessions: PointerSessions<CreationSession>,
    handle_radius_px: f64,
}

impl<K: ShapeSpec + Default> Default for CreationTool<K> {
    fn default() -> Self {
        Self::new(K::default())
    }
}

impl<K: ShapeSpec> CreationTool<K> {
    #[must_use]
    pub fn new(spec: K) -> Self {
        Self { spec, sessions: PointerSessions::default(), handle_radius_px: HANDLE_RADIUS_PX }
    }

    #[must_use]
    pub fn spec(&self) -> &K {
        &self.spec
    }

    /// Handle of the selected same-kind drawing under the pointer.
    fn grab_handle(&self, ctx: &PointerContext, rt: &ToolRuntime<'_>) -> Option<(Drawing, Handle, Point)> {
        let Some(ShapeRef::Drawing(id)) = rt.selection() else {
            return None;
        };
        let drawing = rt.scene().drawing(id).filter(|d| d.kind() == K::KIND)?;
        let handle = hit_handle(drawing, ctx.point, self.handle_radius_px * ctx.field_per_px)?;
        let start = drawing.handles().into_iter().find(|(h, _)| *h == handle).map(|(_, at)| at)?;
        Some((drawing.clone(), handle, start))
    }

    fn on_down(&mut self, ctx: &PointerContext, rt: &mut ToolRuntime<'_>) {
        if let Some((original, handle, start)) = self.grab_handle(ctx, rt) {
            let id = original.id();
            let session = CreationSession::Edit { handle, origin: ctx.point, start, original };
            if self.sessions.begin(ctx.pointer_id, session) {
                rt.emit(ToolEventData::DragStarted { target: HitTarget::handle(id, handle) });
            }
            return;
        }

        let drawing = self.spec.start(ctx.point, ctx.timestamp_ms);
        let id = drawing.id();
        if !self.sessions.begin(ctx.pointer_id, CreationSession::New { id }) {
            return;
        }
        rt.update_scene(|scene| {
            scene.add_drawing(drawing);
        });
        rt.set_selection(Some(ShapeRef::Drawing(id)));
        debug!(tool = %K::TOOL, %id, "shape started");
        rt.emit(ToolEventData::ShapeStarted { id, kind: K::KIND });
    }

    fn on_move(&mut self, ctx: &PointerContext, rt: &mut ToolRuntime<'_>) {
        if !ctx.is_pressed() {
            return;
        }
        let Some(session) = self.sessions.get(ctx.pointer_id) else {
            return;
        };
        let spec = &self.spec;
        let now = ctx.timestamp_ms;
        match session {
            CreationSession::New { id } => {
                let id = *id;
                rt.update_scene(|scene| {
                    if let Some(drawing) = scene.drawing_mut(id) {
                        spec.extend(drawing, ctx.point);
                        drawing.meta_mut().updated_at = now;
                    }
                });
            }
            CreationSession::Edit { handle, origin, start, original } => {
                let to = start.offset(ctx.point.x - origin.x, ctx.point.y - origin.y);
                let (handle, id) = (*handle, original.id());
                rt.update_scene(|scene| {
                    if let Some(drawing) = scene.drawing_mut(id) {
                        drawing.move_handle(handle, to);
                        drawing.meta_mut().updated_at = now;
                    }
                });
            }
        }
    }

    fn on_up(&mut self, ctx: &PointerContext, rt: &mut ToolRuntime<'_>) {
        let Some(session) = self.sessions.end(ctx.pointer_id) else {
            return;
        };
        match session {
            CreationSession::New { id } => {
                let degenerate = rt.scene().drawing(id).is_none_or(|d| self.spec.is_degenerate(d));
                if degenerate {
                    self.discard(id, rt);
                } else {
                    debug!(tool = %K::TOOL, %id, "shape committed");
                    rt.emit(ToolEventData::ShapeCommitted { id, kind: K::KIND });
                }
            }
            CreationSession::Edit { handle, original, .. } => {
                let id = original.id();
                let degenerate = rt.scene().drawing(id).is_some_and(|d| self.spec.is_degenerate(d));
                if degenerate {
                    debug!(tool = %K::TOOL, %id, "edit collapsed shape; restoring");
                    restore(rt, original);
                }
                rt.emit(ToolEventData::DragReleased { target: HitTarget::handle(id, handle), cancelled: false });
            }
        }
    }

    fn on_cancel(&mut self, ctx: &PointerContext, rt: &mut ToolRuntime<'_>) {
        let Some(session) = self.sessions.end(ctx.pointer_id) else {
            return;
        };
        match session {
            CreationSession::New { id } => self.discard(id, rt),
            CreationSession::Edit { handle, original, .. } => {
                let id = original.id();
                restore(rt, original);
                rt.emit(ToolEventData::DragReleased { target: HitTarget::handle(id, handle), cancelled: true });
            }
        }
    }

    fn discard(&self, id: ShapeId, rt: &mut ToolRuntime<'_>) {
        rt.update_scene(|scene| {
            scene.remove_drawing(id);
        });
        if rt.selection() == Some(ShapeRef::Drawing(id)) {
            rt.set_selection(None);
        }
        debug!(tool = %K::TOOL, %id, "shape discarded");
        rt.emit(ToolEventData::ShapeDiscarded { id, kind: K::KIND });
    }
}

fn restore(rt: &mut ToolRuntime<'_>, original: Drawing) {
    rt.update_scene(|scene| {
        if let Some(slot) = scene.drawing_mut(original.id()) {
            *slot = original;
        }
    });
}

impl<K: ShapeSpec> Tool for CreationTool<K> {
    fn id(&self) -> ToolId {
        K::TOOL
    }

    fn handle(&mut self, ctx: &PointerContext, rt: &mut ToolRuntime<'_>) {
        match ctx.kind {
            PointerKind::Down => self.on_down(ctx, rt),
            PointerKind::Move => self.on_move(ctx, rt),
            PointerKind::Up => self.on_up(ctx, rt),
            PointerKind::Cancel => self.on_cancel(ctx, rt),
        }
    }

    fn configure(&mut self, settings: &ToolSettings) {
        if let Some(px) = settings.handle_radius_px {
            self.handle_radius_px = if px.is_finite() { px.max(1.0) } else { HANDLE_RADIUS_PX };
        }
        self.spec.configure(settings);
    }

    fn settings(&self) -> ToolSettings {
        ToolSettings { handle_radius_px: Some(self.handle_radius_px), ..self.spec.settings() }
    }

    fn reset(&mut self) {
        self.sessions.clear();
    }
}

/// Clamp a configured stroke width; non-finite input falls back to the default.
#[must_use]
pub fn clamp_stroke_width(width: f64) -> f64 {
    if width.is_finite() {
        width.max(MIN_STROKE_WIDTH)
    } else {
        DEFAULT_STROKE_WIDTH
    }
}
