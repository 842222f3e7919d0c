//! Render surface abstraction.
//!
//! [`Surface`] is the subset of a 2D drawing context the engine and the
//! built-in layer renderers need. The browser build implements it over a
//! canvas context (see `web`); headless hosts and tests use
//! [`RecordingSurface`], which keeps an op log and emulates the context's
//! save/restore state stack.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use crate::geometry::Point;
use crate::transform::Matrix2D;

/// Errors reported by a surface backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurfaceError {
    /// The underlying context rejected a call.
    #[error("surface backend error: {0}")]
    Backend(String),
    /// An image drawing references a source the surface has not loaded.
    #[error("image not loaded: {0}")]
    MissingImage(String),
}

/// A 2D drawing target measured in physical pixels.
pub trait Surface {
    /// Resize the backing store, in physical pixels.
    fn set_size(&mut self, width_px: u32, height_px: u32);
    fn size(&self) -> (u32, u32);

    /// Clear the whole backing store, ignoring the current transform.
    fn clear(&mut self);
    fn save(&mut self);
    fn restore(&mut self);

    /// Replace the current transform.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Backend`] if the context rejects the matrix.
    fn set_transform(&mut self, m: Matrix2D) -> Result<(), SurfaceError>;

    fn set_fill_style(&mut self, color: &str);
    fn set_stroke_style(&mut self, color: &str);
    fn set_line_width(&mut self, width: f64);
    fn set_global_alpha(&mut self, alpha: f64);

    /// Dash pattern in current-transform units; empty for solid.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Backend`] if the context rejects the pattern.
    fn set_line_dash(&mut self, segments: &[f64]) -> Result<(), SurfaceError>;

    fn begin_path(&mut self);
    fn move_to(&mut self, p: Point);
    fn line_to(&mut self, p: Point);
    fn close_path(&mut self);

    /// Circular arc around `center`, angles in radians.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Backend`] for a negative radius or backend failure.
    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64) -> Result<(), SurfaceError>;

    fn fill(&mut self);
    fn stroke(&mut self);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Draw centered text.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Backend`] if the context fails to draw.
    fn fill_text(&mut self, text: &str, at: Point, font_px: f64) -> Result<(), SurfaceError>;

    /// Draw a bitmap identified by `src` into the given rect.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::MissingImage`] when `src` is unknown to the surface.
    fn draw_image(&mut self, src: &str, x: f64, y: f64, width: f64, height: f64) -> Result<(), SurfaceError>;
}

// =============================================================
// Recording surface
// =============================================================

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Resize { width: u32, height: u32 },
    Clear,
    Save,
    Restore,
    SetTransform(Matrix2D),
    FillStyle(String),
    StrokeStyle(String),
    LineWidth(f64),
    GlobalAlpha(f64),
    LineDash(Vec<f64>),
    BeginPath,
    MoveTo(Point),
    LineTo(Point),
    ClosePath,
    Arc { center: Point, radius: f64, start: f64, end: f64 },
    Fill,
    Stroke,
    FillRect { x: f64, y: f64, width: f64, height: f64 },
    StrokeRect { x: f64, y: f64, width: f64, height: f64 },
    FillText { text: String, at: Point, font_px: f64 },
    DrawImage { src: String, x: f64, y: f64, width: f64, height: f64 },
}

/// Mutable drawing state affected by save/restore.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawState {
    pub transform: Matrix2D,
    pub fill_style: String,
    pub stroke_style: String,
    pub line_width: f64,
    pub global_alpha: f64,
    pub line_dash: Vec<f64>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Matrix2D::identity(),
            fill_style: "#000".into(),
            stroke_style: "#000".into(),
            line_width: 1.0,
            global_alpha: 1.0,
            line_dash: Vec::new(),
        }
    }
}

/// Headless surface that records every call.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    ops: Vec<SurfaceOp>,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Drain the op log, keeping size and state.
    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }

    #[must_use]
    pub fn state(&self) -> &DrawState {
        &self.state
    }

    /// Number of unmatched `save` calls.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn record(&mut self, op: SurfaceOp) {
        self.ops.push(op);
    }
}

impl Surface for RecordingSurface {
    fn set_size(&mut self, width_px: u32, height_px: u32) {
        self.width = width_px;
        self.height = height_px;
        // Resizing a real canvas resets its context state.
        self.state = DrawState::default();
        self.stack.clear();
        self.record(SurfaceOp::Resize { width: width_px, height: height_px });
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.record(SurfaceOp::Clear);
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
        self.record(SurfaceOp::Save);
    }

    fn restore(&mut self) {
        if let Some(prev) = self.stack.pop() {
            self.state = prev;
        }
        self.record(SurfaceOp::Restore);
    }

    fn set_transform(&mut self, m: Matrix2D) -> Result<(), SurfaceError> {
        if !m.is_finite() {
            return Err(SurfaceError::Backend(format!("non-finite transform {m:?}")));
        }
        self.state.transform = m;
        self.record(SurfaceOp::SetTransform(m));
        Ok(())
    }

    fn set_fill_style(&mut self, color: &str) {
        self.state.fill_style = color.to_string();
        self.record(SurfaceOp::FillStyle(color.to_string()));
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.state.stroke_style = color.to_string();
        self.record(SurfaceOp::StrokeStyle(color.to_string()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
        self.record(SurfaceOp::LineWidth(width));
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.global_alpha = alpha;
        self.record(SurfaceOp::GlobalAlpha(alpha));
    }

    fn set_line_dash(&mut self, segments: &[f64]) -> Result<(), SurfaceError> {
        self.state.line_dash = segments.to_vec();
        self.record(SurfaceOp::LineDash(segments.to_vec()));
        Ok(())
    }

    fn begin_path(&mut self) {
        self.record(SurfaceOp::BeginPath);
    }

    fn move_to(&mut self, p: Point) {
        self.record(SurfaceOp::MoveTo(p));
    }

    fn line_to(&mut self, p: Point) {
        self.record(SurfaceOp::LineTo(p));
    }

    fn close_path(&mut self) {
        self.record(SurfaceOp::ClosePath);
    }

    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64) -> Result<(), SurfaceError> {
        if radius < 0.0 {
            return Err(SurfaceError::Backend(format!("negative arc radius {radius}")));
        }
        self.record(SurfaceOp::Arc { center, radius, start, end });
        Ok(())
    }

    fn fill(&mut self) {
        self.record(SurfaceOp::Fill);
    }

    fn stroke(&mut self) {
        self.record(SurfaceOp::Stroke);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.record(SurfaceOp::FillRect { x, y, width, height });
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.record(SurfaceOp::StrokeRect { x, y, width, height });
    }

    fn fill_text(&mut self, text: &str, at: Point, font_px: f64) -> Result<(), SurfaceError> {
        self.record(SurfaceOp::FillText { text: text.to_string(), at, font_px });
        Ok(())
    }

    fn draw_image(&mut self, src: &str, x: f64, y: f64, width: f64, height: f64) -> Result<(), SurfaceError> {
        self.record(SurfaceOp::DrawImage { src: src.to_string(), x, y, width, height });
        Ok(())
    }
}
