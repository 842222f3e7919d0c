//! Built-in layer renderers.
//!
//! [`install_default_layers`] registers one renderer per [`Layer`]: the
//! pitch background, drawings in paint order, tokens, and the selection
//! overlay. Renderers only read the [`LayerFrame`] they are handed; the
//! engine has already installed the field→surface transform, so all
//! coordinates here are field units. Screen-constant sizes (handles, dash
//! lengths, the delete icon) are converted with `frame.field_per_px`.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::collections::BTreeMap;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::consts::{
    ARROW_HEAD_ANGLE, ARROW_HEAD_SCALE, DEFAULT_TOKEN_RADIUS, DELETE_ICON_RADIUS_PX, HANDLE_RADIUS_PX,
    MIN_TOKEN_RADIUS, SELECTION_DASH_PX,
};
use crate::engine::{Layer, LayerFrame, RenderEngine, RendererId};
use crate::geometry::{Point, rotate_about};
use crate::scene::{Bounds, Drawing, Polyline, Scene, ShapeRef, Token, TokenShape};
use crate::surface::{Surface, SurfaceError};
use crate::tools::hit::delete_icon_center;

/// Colors and proportions used by the built-in renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderStyle {
    pub pitch_fill: String,
    pub pitch_line: String,
    /// Pitch marking width in field units.
    pub pitch_line_width: f64,
    /// Center circle radius as a fraction of the shorter field side.
    pub center_circle_ratio: f64,
    /// Team id → token color.
    pub team_colors: BTreeMap<String, String>,
    pub default_token_color: String,
    /// Circle token radius in field units; also the select tool's hit radius.
    pub token_radius: f64,
    pub token_outline: String,
    pub label_color: String,
    /// Fill opacity for cones.
    pub cone_alpha: f64,
    pub highlight_color: String,
    pub hover_color: String,
    pub delete_color: String,
}

impl Default for RenderStyle {
    fn default() -> Self {
        let team_colors = [("home", "#d32f2f"), ("away", "#1976d2"), ("neutral", "#fbc02d")]
            .into_iter()
            .map(|(team, color)| (team.to_string(), color.to_string()))
            .collect();
        Self {
            pitch_fill: "#2e7d32".into(),
            pitch_line: "#ffffff".into(),
            pitch_line_width: 0.3,
            center_circle_ratio: 0.15,
            team_colors,
            default_token_color: "#9e9e9e".into(),
            token_radius: DEFAULT_TOKEN_RADIUS,
            token_outline: "#ffffff".into(),
            label_color: "#ffffff".into(),
            cone_alpha: 0.35,
            highlight_color: "#1E90FF".into(),
            hover_color: "rgba(30, 144, 255, 0.6)".into(),
            delete_color: "#e53935".into(),
        }
    }
}

impl RenderStyle {
    /// Resolve a token's fill: explicit color, then team color, then default.
    #[must_use]
    pub fn token_color<'a>(&'a self, token: &'a Token) -> &'a str {
        token
            .color
            .as_deref()
            .or_else(|| self.team_colors.get(&token.team_id).map(String::as_str))
            .unwrap_or(self.default_token_color.as_str())
    }

    /// Clamp proportions into drawable ranges.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if !self.pitch_line_width.is_finite() || self.pitch_line_width < 0.0 {
            warn!(value = self.pitch_line_width, "invalid pitch line width; using default");
            self.pitch_line_width = defaults.pitch_line_width;
        }
        if !self.center_circle_ratio.is_finite() || self.center_circle_ratio < 0.0 {
            warn!(value = self.center_circle_ratio, "invalid center circle ratio; using default");
            self.center_circle_ratio = defaults.center_circle_ratio;
        }
        self.token_radius = if self.token_radius.is_finite() {
            self.token_radius.max(MIN_TOKEN_RADIUS)
        } else {
            warn!(value = self.token_radius, "invalid token radius; using default");
            DEFAULT_TOKEN_RADIUS
        };
        self.cone_alpha = if self.cone_alpha.is_finite() {
            self.cone_alpha.clamp(0.0, 1.0)
        } else {
            defaults.cone_alpha
        };
        self
    }
}

/// Register the background, drawings, tokens and overlay renderers.
pub fn install_default_layers<S: Surface>(engine: &mut RenderEngine<S>, style: &RenderStyle) -> [RendererId; 4] {
    let background = style.clone();
    let drawings = style.clone();
    let tokens = style.clone();
    let overlay = style.clone();
    [
        engine.register_layer_renderer(Layer::Background, move |s, frame| draw_background(s, frame, &background)),
        engine.register_layer_renderer(Layer::Drawings, move |s, frame| draw_drawings(s, frame, &drawings)),
        engine.register_layer_renderer(Layer::Tokens, move |s, frame| draw_tokens(s, frame, &tokens)),
        engine.register_layer_renderer(Layer::Overlay, move |s, frame| draw_overlay(s, frame, &overlay)),
    ]
}

// =============================================================
// Background
// =============================================================

/// Pitch fill, outline, halfway line and center circle.
///
/// # Errors
///
/// Returns `Err` if the surface rejects the center-circle arc.
pub fn draw_background(s: &mut dyn Surface, frame: &LayerFrame<'_>, style: &RenderStyle) -> Result<(), SurfaceError> {
    let Some(scene) = frame.scene else {
        return Ok(());
    };
    let (w, h) = (scene.field.width, scene.field.height);

    s.set_fill_style(&style.pitch_fill);
    s.fill_rect(0.0, 0.0, w, h);

    s.set_stroke_style(&style.pitch_line);
    s.set_line_width(style.pitch_line_width);
    s.stroke_rect(0.0, 0.0, w, h);

    s.begin_path();
    s.move_to(Point::new(w / 2.0, 0.0));
    s.line_to(Point::new(w / 2.0, h));
    s.stroke();

    s.begin_path();
    s.arc(Point::new(w / 2.0, h / 2.0), w.min(h) * style.center_circle_ratio, 0.0, 2.0 * PI)?;
    s.stroke();
    Ok(())
}

// =============================================================
// Drawings
// =============================================================

/// Paint every drawing bottom→top. Each drawing is isolated in its own
/// save/restore; an image that fails to load is logged and skipped.
///
/// # Errors
///
/// Returns the first surface error raised by a non-image drawing.
pub fn draw_drawings(s: &mut dyn Surface, frame: &LayerFrame<'_>, style: &RenderStyle) -> Result<(), SurfaceError> {
    let Some(scene) = frame.scene else {
        return Ok(());
    };
    for drawing in &scene.drawings {
        s.save();
        let result = draw_drawing(s, drawing, style);
        s.restore();
        match result {
            Ok(()) => {}
            Err(err @ SurfaceError::MissingImage(_)) => warn!(id = %drawing.id(), %err, "image skipped"),
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

fn draw_drawing(s: &mut dyn Surface, drawing: &Drawing, style: &RenderStyle) -> Result<(), SurfaceError> {
    match drawing {
        Drawing::Line(line) | Drawing::Pen(line) => draw_polyline(s, line),
        Drawing::Arrow(arrow) => {
            s.set_stroke_style(&arrow.stroke);
            s.set_fill_style(&arrow.stroke);
            s.set_line_width(arrow.width);
            s.begin_path();
            s.move_to(arrow.from);
            s.line_to(arrow.to);
            s.stroke();
            draw_arrowhead(s, arrow.from, arrow.to, arrow.width);
            Ok(())
        }
        Drawing::Cone(cone) => {
            s.set_global_alpha(style.cone_alpha);
            s.set_fill_style(&cone.fill);
            s.begin_path();
            s.arc(cone.at, cone.radius.max(0.0), 0.0, 2.0 * PI)?;
            s.fill();
            Ok(())
        }
        Drawing::Image(image) => {
            s.set_global_alpha(image.opacity.unwrap_or(1.0).clamp(0.0, 1.0));
            s.draw_image(&image.src, image.x, image.y, image.width, image.height)
        }
    }
}

fn draw_polyline(s: &mut dyn Surface, line: &Polyline) -> Result<(), SurfaceError> {
    let Some((first, rest)) = line.points.split_first() else {
        return Ok(());
    };
    if rest.is_empty() {
        // Single sample: a dot as wide as the stroke.
        s.set_fill_style(&line.stroke);
        s.begin_path();
        s.arc(*first, line.width / 2.0, 0.0, 2.0 * PI)?;
        s.fill();
        return Ok(());
    }
    s.set_stroke_style(&line.stroke);
    s.set_line_width(line.width);
    s.begin_path();
    s.move_to(*first);
    for p in rest {
        s.line_to(*p);
    }
    s.stroke();
    Ok(())
}

fn draw_arrowhead(s: &mut dyn Surface, from: Point, tip: Point, width: f64) {
    let size = width * ARROW_HEAD_SCALE;
    let angle = (tip.y - from.y).atan2(tip.x - from.x);
    let left = Point::new(
        tip.x - size * (angle - ARROW_HEAD_ANGLE).cos(),
        tip.y - size * (angle - ARROW_HEAD_ANGLE).sin(),
    );
    let right = Point::new(
        tip.x - size * (angle + ARROW_HEAD_ANGLE).cos(),
        tip.y - size * (angle + ARROW_HEAD_ANGLE).sin(),
    );
    s.begin_path();
    s.move_to(tip);
    s.line_to(left);
    s.line_to(right);
    s.close_path();
    s.fill();
}

// =============================================================
// Tokens
// =============================================================

/// Team discs (with optional label) and rect markers, in list order.
///
/// # Errors
///
/// Returns `Err` if the surface rejects an arc or label.
pub fn draw_tokens(s: &mut dyn Surface, frame: &LayerFrame<'_>, style: &RenderStyle) -> Result<(), SurfaceError> {
    let Some(scene) = frame.scene else {
        return Ok(());
    };
    let outline = frame.field_per_px;
    for token in &scene.tokens {
        s.set_fill_style(style.token_color(token));
        s.set_stroke_style(&style.token_outline);
        s.set_line_width(outline);
        s.begin_path();
        match token.shape() {
            TokenShape::Circle => s.arc(token.position(), style.token_radius, 0.0, 2.0 * PI)?,
            TokenShape::Rect => trace_rect_token(s, token, style.token_radius),
        }
        s.fill();
        s.stroke();

        if let Some(label) = token.label.as_deref().filter(|l| !l.is_empty()) {
            s.set_fill_style(&style.label_color);
            s.fill_text(label, token.position(), style.token_radius)?;
        }
    }
    Ok(())
}

fn trace_rect_token(s: &mut dyn Surface, token: &Token, radius: f64) {
    let (hw, hh) = token.half_extents(radius);
    let center = token.position();
    let rotation = token.rotation.unwrap_or(0.0);
    let corners = [
        Point::new(token.x - hw, token.y - hh),
        Point::new(token.x + hw, token.y - hh),
        Point::new(token.x + hw, token.y + hh),
        Point::new(token.x - hw, token.y + hh),
    ]
    .map(|p| rotate_about(p, center, rotation));
    s.move_to(corners[0]);
    for p in &corners[1..] {
        s.line_to(*p);
    }
    s.close_path();
}

// =============================================================
// Overlay
// =============================================================

/// Dashed outline around the hovered and selected shapes, handles of the
/// selected drawing, and its delete icon.
///
/// # Errors
///
/// Returns `Err` if the surface rejects a dash pattern or arc.
pub fn draw_overlay(s: &mut dyn Surface, frame: &LayerFrame<'_>, style: &RenderStyle) -> Result<(), SurfaceError> {
    let Some(scene) = frame.scene else {
        return Ok(());
    };
    let fpp = frame.field_per_px;
    let highlight = frame.highlight;

    if let Some(hovered) = highlight.hovered.filter(|h| Some(*h) != highlight.selected) {
        if let Some(bounds) = scene.bounds_of(hovered, style.token_radius) {
            dashed_bounds(s, bounds, &style.hover_color, fpp)?;
        }
    }

    let Some(selected) = highlight.selected else {
        return Ok(());
    };
    let Some(bounds) = scene.bounds_of(selected, style.token_radius) else {
        return Ok(());
    };
    dashed_bounds(s, bounds, &style.highlight_color, fpp)?;
    draw_handles(s, scene, selected, frame, style)?;
    draw_delete_icon(s, bounds, style, fpp)
}

fn dashed_bounds(s: &mut dyn Surface, bounds: Bounds, color: &str, fpp: f64) -> Result<(), SurfaceError> {
    let dash = SELECTION_DASH_PX * fpp;
    let pad = SELECTION_DASH_PX * fpp;
    s.set_stroke_style(color);
    s.set_line_width(fpp);
    s.set_line_dash(&[dash, dash])?;
    s.stroke_rect(
        bounds.min.x - pad,
        bounds.min.y - pad,
        bounds.max.x - bounds.min.x + 2.0 * pad,
        bounds.max.y - bounds.min.y + 2.0 * pad,
    );
    s.set_line_dash(&[])
}

fn draw_handles(
    s: &mut dyn Surface,
    scene: &Scene,
    selected: ShapeRef,
    frame: &LayerFrame<'_>,
    style: &RenderStyle,
) -> Result<(), SurfaceError> {
    let ShapeRef::Drawing(id) = selected else {
        return Ok(());
    };
    let Some(drawing) = scene.drawing(id) else {
        return Ok(());
    };
    let fpp = frame.field_per_px;
    let radius = HANDLE_RADIUS_PX * 0.6 * fpp;
    s.set_stroke_style(&style.highlight_color);
    s.set_line_width(fpp);
    for (handle, at) in drawing.handles() {
        let hovered = frame.highlight.hovered == Some(selected) && frame.highlight.hovered_handle == Some(handle);
        s.set_fill_style(if hovered { style.highlight_color.as_str() } else { "#fff" });
        s.begin_path();
        s.arc(at, radius, 0.0, 2.0 * PI)?;
        s.fill();
        s.stroke();
    }
    Ok(())
}

fn draw_delete_icon(s: &mut dyn Surface, bounds: Bounds, style: &RenderStyle, fpp: f64) -> Result<(), SurfaceError> {
    let center = delete_icon_center(bounds, fpp);
    let radius = DELETE_ICON_RADIUS_PX * fpp;
    s.set_fill_style(&style.delete_color);
    s.begin_path();
    s.arc(center, radius, 0.0, 2.0 * PI)?;
    s.fill();

    let arm = radius * 0.45;
    s.set_stroke_style("#fff");
    s.set_line_width(1.5 * fpp);
    s.begin_path();
    s.move_to(center.offset(-arm, -arm));
    s.line_to(center.offset(arm, arm));
    s.move_to(center.offset(arm, -arm));
    s.line_to(center.offset(-arm, arm));
    s.stroke();
    Ok(())
}
