//! Host glue: one render engine, the tool registry and undo history wired
//! together.
//!
//! Every raw pointer event goes through the engine (field conversion and
//! listeners), then to the active tool. Tool commits land in [`History`].
//! One batch spans from the first pointer going down until the last one is
//! released, so overlapping pointers share a single undo entry. When every
//! pointer in the batch was cancelled, the scene the batch started from is
//! restored; otherwise each tool reverts its own cancelled gesture. After each event
//! the resulting snapshot is pushed to the engine and the registry, the
//! overlay highlight is refreshed and a redraw is scheduled.

#[cfg(test)]
#[path = "board_test.rs"]
mod board_test;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::BoardConfig;
use crate::consts::MAX_ACTIVE_POINTERS;
use crate::engine::{EngineError, PointerContext, PointerKind, RawPointerEvent, RenderEngine, Viewport};
use crate::export::{ExportError, SceneExporter};
use crate::history::History;
use crate::render::{RenderStyle, install_default_layers};
use crate::scene::{Scene, SceneError, ShapeId, ShapeRef, Token};
use crate::surface::Surface;
use crate::tools::{ToolError, ToolEvent, ToolHost, ToolId, ToolRegistry, ToolSettings};

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Routes tool commits into the history and collects emitted events.
struct HistoryHost<'a> {
    history: &'a mut History,
    events: &'a mut Vec<ToolEvent>,
}

impl ToolHost for HistoryHost<'_> {
    fn commit(&mut self, scene: Scene) -> Arc<Scene> {
        self.history.commit(scene)
    }

    fn emit(&mut self, event: ToolEvent) {
        self.events.push(event);
    }
}

/// Pointers held down in the current history batch.
#[derive(Debug, Default)]
struct HeldPointers {
    ids: Vec<i32>,
    /// Some pointer in the batch ended with `up` rather than `cancel`.
    released: bool,
}

pub struct Board<S: Surface> {
    engine: RenderEngine<S>,
    registry: ToolRegistry,
    history: History,
    style: RenderStyle,
    events: Vec<ToolEvent>,
    held: HeldPointers,
}

impl<S: Surface> Board<S> {
    /// Build a board over `surface` showing `scene`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Scene`] when the scene has duplicate ids and
    /// [`BoardError::Engine`] when the viewport cannot fit the field.
    pub fn new(surface: S, viewport: Viewport, scene: Scene, config: &BoardConfig) -> Result<Self, BoardError> {
        scene.validate()?;
        let config = config.clone().normalized();

        let mut engine = RenderEngine::with_padding(surface, config.padding);
        engine.set_device_pixel_ratio(config.device_pixel_ratio)?;
        engine.resize(viewport.width, viewport.height)?;
        install_default_layers(&mut engine, &config.style);

        let scene = Arc::new(scene);
        engine.set_scene(Arc::clone(&scene))?;

        let mut registry = ToolRegistry::new(Arc::clone(&scene));
        for id in ToolId::ALL {
            registry.configure_tool(id, config.tools.get(id));
        }
        // Circle tokens are hit with the radius they are drawn at.
        let token_radius = ToolSettings { radius: Some(config.style.token_radius), ..ToolSettings::default() };
        registry.configure_tool(ToolId::Select, &token_radius);
        let history = History::new(scene, config.history_capacity);

        info!(
            width = viewport.width,
            height = viewport.height,
            capacity = config.history_capacity,
            "board ready"
        );
        Ok(Self { engine, registry, history, style: config.style, events: Vec::new(), held: HeldPointers::default() })
    }

    #[must_use]
    pub fn engine(&self) -> &RenderEngine<S> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut RenderEngine<S> {
        &mut self.engine
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    /// The current scene snapshot.
    #[must_use]
    pub fn scene(&self) -> &Arc<Scene> {
        self.history.present()
    }

    #[must_use]
    pub fn selection(&self) -> Option<ShapeRef> {
        self.registry.selection()
    }

    /// Drain tool events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<ToolEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Input ---

    /// Feed one host pointer event through engine, tools and history.
    pub fn pointer(&mut self, raw: RawPointerEvent) -> PointerContext {
        let ctx = self.engine.dispatch_pointer(raw);
        if ctx.kind == PointerKind::Down {
            self.press(ctx.pointer_id);
        }

        let mut host = HistoryHost { history: &mut self.history, events: &mut self.events };
        self.registry.handle_pointer(&ctx, &mut host);

        match ctx.kind {
            PointerKind::Up => self.release(ctx.pointer_id, false),
            PointerKind::Cancel => self.release(ctx.pointer_id, true),
            PointerKind::Down | PointerKind::Move => {}
        }
        self.sync();
        ctx
    }

    /// Track a pressed pointer; the first one opens the batch.
    fn press(&mut self, pointer_id: i32) {
        let held = &mut self.held;
        if held.ids.contains(&pointer_id) {
            return;
        }
        if held.ids.len() >= MAX_ACTIVE_POINTERS {
            debug!(pointer_id, "too many held pointers; not tracked");
            return;
        }
        if held.ids.is_empty() {
            self.history.begin_batch();
            held.released = false;
        }
        held.ids.push(pointer_id);
    }

    /// Drop a released pointer; the last one closes the batch.
    fn release(&mut self, pointer_id: i32, cancelled: bool) {
        let Some(pos) = self.held.ids.iter().position(|&id| id == pointer_id) else {
            return;
        };
        self.held.ids.swap_remove(pos);
        if !cancelled {
            self.held.released = true;
        }
        if !self.held.ids.is_empty() {
            return;
        }
        if self.held.released {
            if self.history.end_batch() {
                debug!(pointer_id, "gesture recorded");
            }
        } else if self.history.abort_batch().is_some() {
            debug!(pointer_id, "gesture cancelled; scene restored");
        }
    }

    /// Undo and redo close the open batch; pointers still held start a new one.
    fn reopen_batch(&mut self) {
        if !self.held.ids.is_empty() {
            self.history.begin_batch();
        }
    }

    // --- Tools ---

    pub fn set_tool(&mut self, id: ToolId) {
        self.registry.set_active_tool(id);
        self.sync();
    }

    /// Switch tools by name.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Tool`] for an unknown tool name.
    pub fn activate_tool(&mut self, name: &str) -> Result<(), BoardError> {
        self.registry.activate(name)?;
        self.sync();
        Ok(())
    }

    pub fn configure_tool(&mut self, id: ToolId, settings: &ToolSettings) {
        self.registry.configure_tool(id, settings);
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo().is_some();
        self.reopen_batch();
        if undone {
            self.sync();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo().is_some();
        self.reopen_batch();
        if redone {
            self.sync();
        }
        redone
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Scene edits outside the tools ---

    /// Place a token on the field as one undoable edit.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Scene`] when a token or drawing with the same
    /// id is already on the board.
    pub fn spawn_token(&mut self, token: Token, now_ms: i64) -> Result<ShapeId, BoardError> {
        if self.history.present().contains_id(token.id) {
            return Err(SceneError::DuplicateId(token.id).into());
        }
        let mut next = (**self.history.present()).clone();
        let id = next.add_token(token);
        next.touch(now_ms);
        self.history.commit(next);
        self.sync();
        Ok(id)
    }

    /// Remove a token or drawing as one undoable edit.
    pub fn delete_shape(&mut self, id: ShapeId, now_ms: i64) -> bool {
        let mut next = (**self.history.present()).clone();
        if !next.remove(id) {
            return false;
        }
        next.touch(now_ms);
        self.history.commit(next);
        self.sync();
        true
    }

    /// Replace the scene and drop all history.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Scene`] when the scene has duplicate ids.
    pub fn load_scene(&mut self, scene: Scene) -> Result<(), BoardError> {
        scene.validate()?;
        self.history.reset(Arc::new(scene));
        self.held = HeldPointers::default();
        self.registry.set_selection(None);
        self.sync();
        Ok(())
    }

    // --- Rendering ---

    /// Resize the viewport.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Engine`] when the new viewport cannot fit the field.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<(), BoardError> {
        self.engine.resize(width, height)?;
        Ok(())
    }

    /// Host animation-frame callback.
    pub fn on_animation_frame(&mut self, timestamp: f64) -> bool {
        self.engine.on_animation_frame(timestamp)
    }

    /// Hand a detached copy of the current scene to `exporter`.
    ///
    /// # Errors
    ///
    /// Propagates the exporter's [`ExportError`].
    pub fn export<E: SceneExporter>(&self, exporter: &E) -> Result<E::Output, ExportError> {
        exporter.export((**self.history.present()).clone(), &self.style)
    }

    /// Push the present snapshot to the registry and engine.
    fn sync(&mut self) {
        let present = Arc::clone(self.history.present());
        self.registry.update_scene(Arc::clone(&present));
        let changed = self.engine.scene().is_none_or(|shown| !Arc::ptr_eq(shown, &present));
        if changed {
            if let Err(err) = self.engine.set_scene(present) {
                warn!(%err, "scene refit failed; keeping previous transform");
            }
        }
        self.engine.set_highlight(self.registry.highlight());
        self.engine.schedule_draw();
    }
}
