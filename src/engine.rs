//! Render engine: owns the render surface and the field→surface transform,
//! converts pointer input into field space, and paints registered layer
//! renderers in a fixed layer order.
//!
//! Field space is the board's own coordinate system. The *view* transform
//! maps field space to CSS pixels of the viewport; the engine pre-multiplies
//! the device-pixel-ratio scale to obtain field→surface (physical pixels)
//! and keeps its inverse for pointer mapping. In [`TransformMode::Auto`] the
//! view is recomputed whenever the scene or viewport changes; in
//! [`TransformMode::Custom`] a caller-supplied view is kept verbatim.
//!
//! Redraws are coalesced: [`RenderEngine::schedule_draw`] raises a single
//! pending flag, and the host's next animation-frame callback runs one
//! [`RenderEngine::draw`] regardless of how many requests arrived.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::consts::{DEFAULT_PADDING_PX, MIN_DEVICE_PIXEL_RATIO};
use crate::geometry::Point;
use crate::scene::{FieldSize, Handle, Orientation, Scene, ShapeRef};
use crate::surface::{Surface, SurfaceError};
use crate::transform::{Matrix2D, Rotation, TransformError, compose};

/// Errors returned by engine configuration calls.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// A layer name did not match any known layer.
    #[error("unknown layer: {0}")]
    UnknownLayer(String),
    /// The requested or computed transform cannot be inverted.
    #[error(transparent)]
    Transform(#[from] TransformError),
}

// =============================================================
// Layers
// =============================================================

/// Named render slots, painted in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Background,
    Drawings,
    Tokens,
    Overlay,
}

impl Layer {
    /// Paint order, bottom first.
    pub const ALL: [Layer; 4] = [Layer::Background, Layer::Drawings, Layer::Tokens, Layer::Overlay];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Drawings => "drawings",
            Self::Tokens => "tokens",
            Self::Overlay => "overlay",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layer {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Layer::ALL
            .into_iter()
            .find(|layer| layer.as_str() == s)
            .ok_or_else(|| EngineError::UnknownLayer(s.to_string()))
    }
}

// =============================================================
// Viewport / transform mode
// =============================================================

/// Viewport size in CSS (device-independent) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// How the view transform is maintained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformMode {
    /// Recomputed to fit the field on every scene or viewport change.
    #[default]
    Auto,
    /// Caller-supplied; never recalculated by the engine.
    Custom,
}

/// Compute the view transform that fits `field` inside `viewport` with
/// `padding` CSS pixels on every side.
///
/// Portrait fields are first turned a quarter clockwise and shifted so all
/// field coordinates stay non-negative, then scaled and centered:
/// `translate(center) · scale · translate(height, 0) · rotate(cw)`.
#[must_use]
pub fn fit_transform(field: FieldSize, orientation: Orientation, viewport: Viewport, padding: f64) -> Matrix2D {
    let (eff_w, eff_h) = match orientation {
        Orientation::Landscape => (field.width, field.height),
        Orientation::Portrait => (field.height, field.width),
    };
    let padding = padding.max(0.0);
    let avail_w = (viewport.width - 2.0 * padding).max(0.0);
    let avail_h = (viewport.height - 2.0 * padding).max(0.0);
    let scale = (avail_w / eff_w).min(avail_h / eff_h);

    let tx = eff_w.mul_add(-scale, viewport.width) / 2.0;
    let ty = eff_h.mul_add(-scale, viewport.height) / 2.0;

    let orient = match orientation {
        Orientation::Landscape => Matrix2D::identity(),
        Orientation::Portrait => Matrix2D::translate(field.height, 0.0).multiply(Matrix2D::rotation90(Rotation::Cw)),
    };

    compose(&[Matrix2D::translate(tx, ty), Matrix2D::uniform_scale(scale), orient])
}

// =============================================================
// Pointer input
// =============================================================

/// Pointer event phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Cancel,
}

/// A pointer event as reported by the host, in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPointerEvent {
    pub kind: PointerKind,
    #[serde(default)]
    pub pointer_id: i32,
    pub client_x: f64,
    pub client_y: f64,
    /// Bitmask of held buttons (`0` = none).
    #[serde(default)]
    pub buttons: u16,
    /// Event time in milliseconds.
    #[serde(default)]
    pub timestamp: f64,
}

/// A pointer event after conversion into field space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerContext {
    pub kind: PointerKind,
    pub pointer_id: i32,
    /// Pointer position in field units.
    pub point: Point,
    /// Pointer position in CSS pixels relative to the surface origin.
    pub screen: Point,
    pub buttons: u16,
    pub timestamp_ms: i64,
    /// Field units covered by one CSS pixel at the current transform.
    pub field_per_px: f64,
}

impl PointerContext {
    /// Whether any button is held.
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.buttons != 0
    }

    /// Convert a screen-space distance (CSS pixels) to field units.
    #[must_use]
    pub fn px_to_field(&self, px: f64) -> f64 {
        px * self.field_per_px
    }
}

// =============================================================
// Renderers / listeners
// =============================================================

/// Selection and hover state painted by the overlay layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Highlight {
    pub selected: Option<ShapeRef>,
    pub hovered: Option<ShapeRef>,
    pub hovered_handle: Option<Handle>,
}

/// Everything a layer renderer may read while painting.
#[derive(Debug, Clone, Copy)]
pub struct LayerFrame<'a> {
    pub layer: Layer,
    pub scene: Option<&'a Scene>,
    pub field_to_surface: Matrix2D,
    pub field_per_px: f64,
    pub device_pixel_ratio: f64,
    pub highlight: &'a Highlight,
    pub timestamp: Option<f64>,
}

/// Layer paint callback. The surface transform is already field→surface.
pub type LayerRenderer = Box<dyn FnMut(&mut dyn Surface, &LayerFrame<'_>) -> Result<(), SurfaceError>>;

/// Pointer subscriber callback.
pub type PointerHandler = Box<dyn FnMut(&PointerContext)>;

/// Handle returned by [`RenderEngine::register_layer_renderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendererId(u64);

/// Handle returned by [`RenderEngine::on_pointer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct RendererEntry {
    id: RendererId,
    layer: Layer,
    render: LayerRenderer,
}

struct ListenerEntry {
    id: ListenerId,
    kind: PointerKind,
    handler: PointerHandler,
}

// =============================================================
// Engine
// =============================================================

/// Owns one render surface and the field↔surface mapping.
pub struct RenderEngine<S: Surface> {
    surface: S,
    viewport: Viewport,
    dpr: f64,
    padding: f64,
    client_origin: Point,
    scene: Option<Arc<Scene>>,
    mode: TransformMode,
    view: Matrix2D,
    field_to_surface: Matrix2D,
    surface_to_field: Matrix2D,
    renderers: Vec<RendererEntry>,
    listeners: Vec<ListenerEntry>,
    highlight: Highlight,
    draw_pending: bool,
    next_id: u64,
    frames_drawn: u64,
}

impl<S: Surface> RenderEngine<S> {
    /// Create an engine over `surface` with the default padding.
    #[must_use]
    pub fn new(surface: S) -> Self {
        Self::with_padding(surface, DEFAULT_PADDING_PX)
    }

    #[must_use]
    pub fn with_padding(surface: S, padding: f64) -> Self {
        Self {
            surface,
            viewport: Viewport::default(),
            dpr: 1.0,
            padding: sanitize_padding(padding),
            client_origin: Point::default(),
            scene: None,
            mode: TransformMode::Auto,
            view: Matrix2D::identity(),
            field_to_surface: Matrix2D::identity(),
            surface_to_field: Matrix2D::identity(),
            renderers: Vec::new(),
            listeners: Vec::new(),
            highlight: Highlight::default(),
            draw_pending: false,
            next_id: 1,
            frames_drawn: 0,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn device_pixel_ratio(&self) -> f64 {
        self.dpr
    }

    #[must_use]
    pub fn transform_mode(&self) -> TransformMode {
        self.mode
    }

    /// Field → CSS pixel transform.
    #[must_use]
    pub fn view_transform(&self) -> Matrix2D {
        self.view
    }

    /// Field → physical pixel transform (DPR applied).
    #[must_use]
    pub fn field_to_surface(&self) -> Matrix2D {
        self.field_to_surface
    }

    #[must_use]
    pub fn surface_to_field(&self) -> Matrix2D {
        self.surface_to_field
    }

    #[must_use]
    pub fn scene(&self) -> Option<&Arc<Scene>> {
        self.scene.as_ref()
    }

    #[must_use]
    pub fn highlight(&self) -> &Highlight {
        &self.highlight
    }

    /// Field units covered by one CSS pixel.
    #[must_use]
    pub fn field_per_px(&self) -> f64 {
        let scale = self.view.scale_factor();
        if scale > 0.0 { 1.0 / scale } else { 1.0 }
    }

    #[must_use]
    pub fn is_draw_pending(&self) -> bool {
        self.draw_pending
    }

    #[must_use]
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    // --- Viewport / transform ---

    /// Resize the viewport (CSS pixels). The backing store becomes
    /// `device_pixel_ratio × viewport`. In auto mode the fit transform is
    /// recomputed; a custom transform is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transform`] when the refit transform is
    /// singular (e.g. a viewport smaller than the padding). The previous
    /// transform stays in effect.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<(), EngineError> {
        self.viewport = Viewport { width: sanitize_extent(width), height: sanitize_extent(height) };
        self.resize_backing_store();
        self.schedule_draw();
        match self.mode {
            TransformMode::Auto => self.refit(),
            TransformMode::Custom => Ok(()),
        }
    }

    /// Update the device pixel ratio. Non-finite or tiny values fall back to a safe minimum.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transform`] if the resulting transform is singular.
    pub fn set_device_pixel_ratio(&mut self, dpr: f64) -> Result<(), EngineError> {
        let clamped = if dpr.is_finite() { dpr.max(MIN_DEVICE_PIXEL_RATIO) } else { 1.0 };
        if (clamped - dpr).abs() > f64::EPSILON {
            warn!(requested = dpr, clamped, "device pixel ratio out of range; clamped");
        }
        self.dpr = clamped;
        self.resize_backing_store();
        self.schedule_draw();
        match self.mode {
            TransformMode::Auto => self.refit(),
            TransformMode::Custom => self.apply_view(self.view),
        }
    }

    /// Offset of the surface's top-left corner in client coordinates.
    pub fn set_client_origin(&mut self, x: f64, y: f64) {
        self.client_origin = Point::new(x, y);
    }

    /// Install a new scene snapshot. Auto mode refits to its field.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transform`] if the refit transform is singular.
    pub fn set_scene(&mut self, scene: Arc<Scene>) -> Result<(), EngineError> {
        self.scene = Some(scene);
        self.schedule_draw();
        match self.mode {
            TransformMode::Auto => self.refit(),
            TransformMode::Custom => Ok(()),
        }
    }

    /// Switch to a caller-supplied field→CSS-pixel transform.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transform`] if `view` is not invertible; the
    /// engine keeps its previous transform and mode.
    pub fn set_transform(&mut self, view: Matrix2D) -> Result<(), EngineError> {
        self.apply_view(view)?;
        self.mode = TransformMode::Custom;
        self.schedule_draw();
        Ok(())
    }

    /// Return to auto mode and refit immediately.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transform`] if the fit transform is singular.
    pub fn auto_fit_scene(&mut self) -> Result<(), EngineError> {
        self.mode = TransformMode::Auto;
        self.schedule_draw();
        self.refit()
    }

    fn refit(&mut self) -> Result<(), EngineError> {
        let view = match &self.scene {
            Some(scene) => fit_transform(scene.field, scene.orientation, self.viewport, self.padding),
            None => Matrix2D::identity(),
        };
        self.apply_view(view)
    }

    fn apply_view(&mut self, view: Matrix2D) -> Result<(), EngineError> {
        let field_to_surface = Matrix2D::uniform_scale(self.dpr).multiply(view);
        let surface_to_field = field_to_surface.invert()?;
        self.view = view;
        self.field_to_surface = field_to_surface;
        self.surface_to_field = surface_to_field;
        Ok(())
    }

    fn resize_backing_store(&mut self) {
        let w = physical_extent(self.viewport.width, self.dpr);
        let h = physical_extent(self.viewport.height, self.dpr);
        self.surface.set_size(w, h);
    }

    // --- Coordinate conversion ---

    /// Convert client coordinates (CSS pixels) to field space.
    #[must_use]
    pub fn screen_to_field(&self, client_x: f64, client_y: f64) -> Point {
        let css = Point::new(client_x - self.client_origin.x, client_y - self.client_origin.y);
        let physical = Point::new(css.x * self.dpr, css.y * self.dpr);
        self.surface_to_field.apply(physical)
    }

    /// Convert a field point to client coordinates (CSS pixels).
    #[must_use]
    pub fn field_to_screen(&self, p: Point) -> Point {
        let physical = self.field_to_surface.apply(p);
        Point::new(
            physical.x / self.dpr + self.client_origin.x,
            physical.y / self.dpr + self.client_origin.y,
        )
    }

    // --- Registration ---

    /// Add a renderer to `layer`. Renderers on the same layer run in
    /// registration order.
    pub fn register_layer_renderer<F>(&mut self, layer: Layer, render: F) -> RendererId
    where
        F: FnMut(&mut dyn Surface, &LayerFrame<'_>) -> Result<(), SurfaceError> + 'static,
    {
        let id = RendererId(self.bump_id());
        self.renderers.push(RendererEntry { id, layer, render: Box::new(render) });
        self.schedule_draw();
        id
    }

    /// Same as [`Self::register_layer_renderer`], addressing the layer by name.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownLayer`] for an unrecognized name.
    pub fn register_layer_renderer_named<F>(&mut self, layer: &str, render: F) -> Result<RendererId, EngineError>
    where
        F: FnMut(&mut dyn Surface, &LayerFrame<'_>) -> Result<(), SurfaceError> + 'static,
    {
        let layer: Layer = layer.parse()?;
        Ok(self.register_layer_renderer(layer, render))
    }

    /// Dispose a renderer. Returns `false` if it was already gone.
    pub fn unregister_layer_renderer(&mut self, id: RendererId) -> bool {
        let before = self.renderers.len();
        self.renderers.retain(|entry| entry.id != id);
        let removed = self.renderers.len() != before;
        if removed {
            self.schedule_draw();
        }
        removed
    }

    /// Subscribe to one pointer phase.
    pub fn on_pointer<F>(&mut self, kind: PointerKind, handler: F) -> ListenerId
    where
        F: FnMut(&PointerContext) + 'static,
    {
        let id = ListenerId(self.bump_id());
        self.listeners.push(ListenerEntry { id, kind, handler: Box::new(handler) });
        id
    }

    /// Dispose a pointer subscription. Returns `false` if it was already gone.
    pub fn remove_pointer_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|entry| entry.id != id);
        self.listeners.len() != before
    }

    fn bump_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // --- Input ---

    /// Convert a raw event into field space and notify subscribers of its phase.
    pub fn dispatch_pointer(&mut self, raw: RawPointerEvent) -> PointerContext {
        let ctx = PointerContext {
            kind: raw.kind,
            pointer_id: raw.pointer_id,
            point: self.screen_to_field(raw.client_x, raw.client_y),
            screen: Point::new(raw.client_x - self.client_origin.x, raw.client_y - self.client_origin.y),
            buttons: raw.buttons,
            timestamp_ms: millis(raw.timestamp),
            field_per_px: self.field_per_px(),
        };
        for entry in self.listeners.iter_mut().filter(|entry| entry.kind == ctx.kind) {
            (entry.handler)(&ctx);
        }
        ctx
    }

    // --- Drawing ---

    /// Replace the highlight painted by the overlay layer.
    pub fn set_highlight(&mut self, highlight: Highlight) {
        if self.highlight != highlight {
            self.highlight = highlight;
            self.schedule_draw();
        }
    }

    /// Request a redraw on the next animation frame.
    ///
    /// Returns `true` when the caller must request a frame from the host,
    /// `false` when one is already pending.
    pub fn schedule_draw(&mut self) -> bool {
        if self.draw_pending {
            return false;
        }
        self.draw_pending = true;
        true
    }

    /// Animation-frame callback: runs the pending draw, if any.
    pub fn on_animation_frame(&mut self, timestamp: f64) -> bool {
        if !self.draw_pending {
            debug!("animation frame with no pending draw");
            return false;
        }
        self.draw(Some(timestamp));
        true
    }

    /// Synchronously repaint every layer.
    ///
    /// Each renderer runs between `save`/`restore` with the field→surface
    /// transform installed. A failing renderer is logged and skipped.
    pub fn draw(&mut self, timestamp: Option<f64>) {
        self.draw_pending = false;

        let scene = self.scene.clone();
        let field_to_surface = self.field_to_surface;
        let field_per_px = self.field_per_px();
        let surface: &mut dyn Surface = &mut self.surface;

        if let Err(err) = surface.set_transform(Matrix2D::identity()) {
            warn!(%err, "failed to reset surface transform");
        }
        surface.clear();

        for layer in Layer::ALL {
            let frame = LayerFrame {
                layer,
                scene: scene.as_deref(),
                field_to_surface,
                field_per_px,
                device_pixel_ratio: self.dpr,
                highlight: &self.highlight,
                timestamp,
            };
            for entry in self.renderers.iter_mut().filter(|entry| entry.layer == layer) {
                surface.save();
                let result = surface
                    .set_transform(field_to_surface)
                    .and_then(|()| (entry.render)(&mut *surface, &frame));
                if let Err(err) = result {
                    warn!(%layer, renderer = entry.id.0, %err, "layer renderer failed");
                }
                surface.restore();
            }
        }

        self.frames_drawn += 1;
    }
}

fn sanitize_padding(padding: f64) -> f64 {
    if padding.is_finite() && padding >= 0.0 {
        padding
    } else {
        warn!(padding, "invalid padding; using 0");
        0.0
    }
}

fn sanitize_extent(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn physical_extent(css: f64, dpr: f64) -> u32 {
    (css * dpr).round().clamp(0.0, f64::from(u32::MAX)) as u32
}

#[allow(clippy::cast_possible_truncation)]
fn millis(timestamp: f64) -> i64 {
    if timestamp.is_finite() { timestamp.round() as i64 } else { 0 }
}
