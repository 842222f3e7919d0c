//! Hit-testing in field space.
//!
//! Screen-constant tolerances (handle radius, body slop, delete icon) are
//! given in CSS pixels and converted with the event's `field_per_px`, so
//! grabbing feels the same at every zoom level. A miss is `None`, never an
//! error.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use serde::Serialize;

use crate::consts::{BODY_SLOP_PX, DELETE_ICON_OFFSET_PX, DELETE_ICON_RADIUS_PX};
use crate::geometry::{Point, point_polyline_distance, point_segment_distance};
use crate::scene::{Bounds, Drawing, Handle, Scene, ShapeId, ShapeRef};

/// What a grab at the hit point would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HitAction {
    /// Remove the shape (delete icon).
    Delete,
    /// Move one control point.
    Handle,
    /// Move the whole shape.
    Body,
}

/// A resolved hit. Two targets are the same only if shape, handle and
/// action all match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HitTarget {
    pub shape: ShapeRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<Handle>,
    pub action: HitAction,
}

impl HitTarget {
    #[must_use]
    pub fn body(shape: ShapeRef) -> Self {
        Self { shape, handle: None, action: HitAction::Body }
    }

    #[must_use]
    pub fn handle(id: ShapeId, handle: Handle) -> Self {
        Self { shape: ShapeRef::Drawing(id), handle: Some(handle), action: HitAction::Handle }
    }

    #[must_use]
    pub fn delete(shape: ShapeRef) -> Self {
        Self { shape, handle: None, action: HitAction::Delete }
    }
}

/// Center of the delete icon drawn next to a selected shape's top-right corner.
#[must_use]
pub fn delete_icon_center(bounds: Bounds, field_per_px: f64) -> Point {
    let offset = DELETE_ICON_OFFSET_PX * field_per_px;
    bounds.top_right().offset(offset, -offset)
}

/// Whether `p` lands on the delete icon of the selected shape.
#[must_use]
pub fn hit_delete_icon(
    scene: &Scene,
    selection: Option<ShapeRef>,
    p: Point,
    field_per_px: f64,
    token_radius: f64,
) -> Option<HitTarget> {
    let selected = selection?;
    let bounds = scene.bounds_of(selected, token_radius)?;
    let center = delete_icon_center(bounds, field_per_px);
    (p.distance(center) <= DELETE_ICON_RADIUS_PX * field_per_px).then(|| HitTarget::delete(selected))
}

/// Closest handle of `drawing` within `radius` field units of `p`.
#[must_use]
pub fn hit_handle(drawing: &Drawing, p: Point, radius: f64) -> Option<Handle> {
    drawing
        .handles()
        .into_iter()
        .map(|(handle, at)| (handle, p.distance(at)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(handle, _)| handle)
}

/// Topmost token under `p` (last in list order wins).
#[must_use]
pub fn hit_token(scene: &Scene, p: Point, token_radius: f64) -> Option<ShapeId> {
    scene.tokens.iter().rev().find(|t| t.contains(p, token_radius)).map(|t| t.id)
}

/// Whether `p` lies on the drawing's body, with `slop` field units of
/// tolerance added to stroked shapes.
#[must_use]
pub fn drawing_contains(drawing: &Drawing, p: Point, slop: f64) -> bool {
    let reach = drawing.stroke_width() / 2.0 + slop;
    match drawing {
        Drawing::Line(line) | Drawing::Pen(line) => point_polyline_distance(p, &line.points).is_some_and(|d| d <= reach),
        Drawing::Arrow(arrow) => point_segment_distance(p, arrow.from, arrow.to) <= reach,
        Drawing::Cone(cone) => p.distance(cone.at) <= cone.radius,
        Drawing::Image(image) => {
            let (x0, x1) = (image.x.min(image.x + image.width), image.x.max(image.x + image.width));
            let (y0, y1) = (image.y.min(image.y + image.height), image.y.max(image.y + image.height));
            (x0..=x1).contains(&p.x) && (y0..=y1).contains(&p.y)
        }
    }
}

/// Topmost drawing body under `p` (reverse paint order).
#[must_use]
pub fn hit_drawing_body(scene: &Scene, p: Point, field_per_px: f64) -> Option<ShapeId> {
    let slop = BODY_SLOP_PX * field_per_px;
    scene
        .drawings
        .iter()
        .rev()
        .find(|d| drawing_contains(d, p, slop))
        .map(Drawing::id)
}

/// Full select-tool priority: delete icon of the selection, handles of the
/// selected drawing, tokens, then drawing bodies.
#[must_use]
pub fn hit_test(
    scene: &Scene,
    selection: Option<ShapeRef>,
    p: Point,
    field_per_px: f64,
    handle_radius_px: f64,
    token_radius: f64,
) -> Option<HitTarget> {
    if let Some(target) = hit_delete_icon(scene, selection, p, field_per_px, token_radius) {
        return Some(target);
    }
    if let Some(ShapeRef::Drawing(id)) = selection {
        let handle = scene
            .drawing(id)
            .and_then(|d| hit_handle(d, p, handle_radius_px * field_per_px));
        if let Some(handle) = handle {
            return Some(HitTarget::handle(id, handle));
        }
    }
    if let Some(id) = hit_token(scene, p, token_radius) {
        return Some(HitTarget::body(ShapeRef::Token(id)));
    }
    hit_drawing_body(scene, p, field_per_px).map(|id| HitTarget::body(ShapeRef::Drawing(id)))
}
