//! Plane geometry shared by hit-testing, dragging and erase clipping.
//!
//! All coordinates are plain `f64` pairs; nothing here knows whether a point
//! lives in field space or surface space.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

use crate::consts::SEGMENT_EPSILON;

/// A point in field or surface space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Squared distance to `other`.
    #[must_use]
    pub fn distance_sq(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// This point shifted by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }

    /// Linear interpolation: `t = 0` is `self`, `t = 1` is `other`.
    #[must_use]
    pub fn lerp(self, other: Point, t: f64) -> Self {
        Self {
            x: (other.x - self.x).mul_add(t, self.x),
            y: (other.y - self.y).mul_add(t, self.y),
        }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Shortest distance from `p` to the segment `a`–`b`.
///
/// A zero-length segment degrades to the distance to `a`.
#[must_use]
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx.mul_add(dx, dy * dy);
    if len_sq <= f64::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx) + ((p.y - a.y) * dy)) / len_sq;
    p.distance(a.lerp(b, t.clamp(0.0, 1.0)))
}

/// Shortest distance from `p` to any segment of the polyline.
///
/// Returns `None` for an empty polyline; a single point is measured directly.
#[must_use]
pub fn point_polyline_distance(p: Point, points: &[Point]) -> Option<f64> {
    match points {
        [] => None,
        [only] => Some(p.distance(*only)),
        _ => points
            .windows(2)
            .map(|w| point_segment_distance(p, w[0], w[1]))
            .min_by(f64::total_cmp),
    }
}

/// Parameters `t` in the open interval `(0, 1)` where segment `p0`–`p1`
/// crosses the circle of `radius` around `center`, in ascending order.
///
/// Solves `|p0 + t·(p1 − p0) − center|² = radius²`. Tangent contacts yield a
/// single parameter. Segments shorter than [`SEGMENT_EPSILON`] yield none.
#[must_use]
pub fn segment_circle_params(p0: Point, p1: Point, center: Point, radius: f64) -> Vec<f64> {
    let dx = p1.x - p0.x;
    let dy = p1.y - p0.y;
    let a = dx.mul_add(dx, dy * dy);
    if a.sqrt() <= SEGMENT_EPSILON {
        return Vec::new();
    }

    let fx = p0.x - center.x;
    let fy = p0.y - center.y;
    let b = 2.0 * fx.mul_add(dx, fy * dy);
    let c = fx.mul_add(fx, fy * fy) - radius * radius;

    let disc = b.mul_add(b, -4.0 * a * c);
    if disc < 0.0 {
        return Vec::new();
    }

    let root = disc.sqrt();
    let t1 = (-b - root) / (2.0 * a);
    let t2 = (-b + root) / (2.0 * a);

    let mut out = Vec::with_capacity(2);
    for t in [t1, t2] {
        let inside = t > SEGMENT_EPSILON && t < 1.0 - SEGMENT_EPSILON;
        let duplicate = out.last().is_some_and(|prev: &f64| (t - prev).abs() <= SEGMENT_EPSILON);
        if inside && !duplicate {
            out.push(t);
        }
    }
    out
}

/// Rotate `p` around `pivot` by `degrees` (positive = clockwise on a y-down surface).
#[must_use]
pub fn rotate_about(p: Point, pivot: Point, degrees: f64) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = p.x - pivot.x;
    let dy = p.y - pivot.y;
    Point {
        x: pivot.x + dx.mul_add(cos, -dy * sin),
        y: pivot.y + dx.mul_add(sin, dy * cos),
    }
}
