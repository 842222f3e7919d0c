//! Select tool: hover feedback, selection, drag, handle edits and delete.
//!
//! Drags are computed from the value captured on `down` plus the pointer
//! offset, never incrementally, so a long drag cannot accumulate drift and
//! a cancel restores the captured value exactly.

#[cfg(test)]
#[path = "select_test.rs"]
mod select_test;

use tracing::debug;

use super::hit::{HitAction, HitTarget, hit_test};
use super::session::PointerSessions;
use super::{Tool, ToolEventData, ToolId, ToolRuntime, ToolSettings};
use crate::consts::{DEFAULT_TOKEN_RADIUS, HANDLE_RADIUS_PX, MIN_TOKEN_RADIUS};
use crate::engine::{PointerContext, PointerKind};
use crate::geometry::Point;
use crate::scene::{Drawing, Handle, Scene, ShapeRef, Token};

/// Shape value captured when a drag starts.
#[derive(Debug, Clone)]
enum Grabbed {
    Token(Token),
    Drawing(Drawing),
}

#[derive(Debug, Clone)]
struct DragSession {
    target: HitTarget,
    origin: Point,
    original: Grabbed,
    moved: bool,
}

#[derive(Debug)]
pub struct SelectTool {
    sessions: PointerSessions<DragSession>,
    hover: Option<HitTarget>,
    handle_radius_px: f64,
    token_radius: f64,
}

impl Default for SelectTool {
    fn default() -> Self {
        Self {
            sessions: PointerSessions::default(),
            hover: None,
            handle_radius_px: HANDLE_RADIUS_PX,
            token_radius: DEFAULT_TOKEN_RADIUS,
        }
    }
}

impl SelectTool {
    fn hit(&self, ctx: &PointerContext, rt: &ToolRuntime<'_>) -> Option<HitTarget> {
        hit_test(rt.scene(), rt.selection(), ctx.point, ctx.field_per_px, self.handle_radius_px, self.token_radius)
    }

    fn on_down(&mut self, ctx: &PointerContext, rt: &mut ToolRuntime<'_>) {
        let target = self.hit(ctx, rt);
        let Some(target) = target else {
            rt.set_selection(None);
            return;
        };

        if target.action == HitAction::Delete {
            rt.update_scene(|scene| {
                scene.remove(target.shape.id());
            });
            rt.emit(ToolEventData::Deleted { shape: target.shape });
            rt.set_selection(None);
            self.set_hover(None, rt);
            return;
        }

        let Some(original) = grab(rt.scene(), target.shape) else {
            return;
        };
        rt.set_selection(Some(target.shape));
        let session = DragSession { target, origin: ctx.point, original, moved: false };
        if self.sessions.begin(ctx.pointer_id, session) {
            debug!(shape = ?target.shape, action = ?target.action, "drag started");
            rt.emit(ToolEventData::DragStarted { target });
        }
    }

    fn on_move(&mut self, ctx: &PointerContext, rt: &mut ToolRuntime<'_>) {
        if self.sessions.get(ctx.pointer_id).is_none() {
            if !ctx.is_pressed() && self.sessions.is_empty() {
                let target = self.hit(ctx, rt);
                self.set_hover(target, rt);
            }
            return;
        }
        let Some(session) = self.sessions.get_mut(ctx.pointer_id) else {
            return;
        };
        if !ctx.is_pressed() {
            return;
        }

        let dx = ctx.point.x - session.origin.x;
        let dy = ctx.point.y - session.origin.y;
        let updated = dragged(&session.original, session.target, dx, dy);
        session.moved = true;
        rt.update_scene(|scene| put_back(scene, updated));
    }

    fn on_release(&mut self, ctx: &PointerContext, rt: &mut ToolRuntime<'_>, cancelled: bool) {
        let Some(session) = self.sessions.end(ctx.pointer_id) else {
            return;
        };
        if cancelled && session.moved {
            rt.update_scene(|scene| put_back(scene, session.original));
        }
        debug!(shape = ?session.target.shape, cancelled, "drag released");
        rt.emit(ToolEventData::DragReleased { target: session.target, cancelled });
    }

    fn set_hover(&mut self, target: Option<HitTarget>, rt: &mut ToolRuntime<'_>) {
        if self.hover != target {
            self.hover = target;
            rt.emit(ToolEventData::HoverChanged { target });
        }
    }
}

impl Tool for SelectTool {
    fn id(&self) -> ToolId {
        ToolId::Select
    }

    fn handle(&mut self, ctx: &PointerContext, rt: &mut ToolRuntime<'_>) {
        match ctx.kind {
            PointerKind::Down => self.on_down(ctx, rt),
            PointerKind::Move => self.on_move(ctx, rt),
            PointerKind::Up => self.on_release(ctx, rt, false),
            PointerKind::Cancel => self.on_release(ctx, rt, true),
        }
    }

    fn configure(&mut self, settings: &ToolSettings) {
        if let Some(px) = settings.handle_radius_px {
            self.handle_radius_px = if px.is_finite() { px.max(1.0) } else { HANDLE_RADIUS_PX };
        }
        if let Some(radius) = settings.radius {
            self.token_radius = if radius.is_finite() { radius.max(MIN_TOKEN_RADIUS) } else { DEFAULT_TOKEN_RADIUS };
        }
    }

    fn settings(&self) -> ToolSettings {
        ToolSettings {
            radius: Some(self.token_radius),
            handle_radius_px: Some(self.handle_radius_px),
            ..ToolSettings::default()
        }
    }

    fn reset(&mut self) {
        self.sessions.clear();
        self.hover = None;
    }

    fn hover(&self) -> Option<HitTarget> {
        self.hover
    }
}

fn grab(scene: &Scene, shape: ShapeRef) -> Option<Grabbed> {
    match shape {
        ShapeRef::Token(id) => scene.token(id).cloned().map(Grabbed::Token),
        ShapeRef::Drawing(id) => scene.drawing(id).cloned().map(Grabbed::Drawing),
    }
}

/// The grabbed value after dragging by `(dx, dy)`.
fn dragged(original: &Grabbed, target: HitTarget, dx: f64, dy: f64) -> Grabbed {
    match original {
        Grabbed::Token(token) => Grabbed::Token(Token { x: token.x + dx, y: token.y + dy, ..token.clone() }),
        Grabbed::Drawing(drawing) => {
            let mut next = drawing.clone();
            match target.handle {
                Some(handle) => move_handle_by(&mut next, drawing, handle, dx, dy),
                None => next.translate(dx, dy),
            }
            Grabbed::Drawing(next)
        }
    }
}

fn move_handle_by(next: &mut Drawing, original: &Drawing, handle: Handle, dx: f64, dy: f64) {
    let start = original.handles().into_iter().find(|(h, _)| *h == handle).map(|(_, at)| at);
    if let Some(at) = start {
        next.move_handle(handle, at.offset(dx, dy));
    }
}

/// Replace the shape with the same id, if it still exists.
fn put_back(scene: &mut Scene, value: Grabbed) {
    match value {
        Grabbed::Token(token) => {
            if let Some(slot) = scene.token_mut(token.id) {
                *slot = token;
            }
        }
        Grabbed::Drawing(drawing) => {
            if let Some(slot) = scene.drawing_mut(drawing.id()) {
                *slot = drawing;
            }
        }
    }
}
