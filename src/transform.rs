//! 2D affine transform algebra.
//!
//! A [`Matrix2D`] holds the six free parameters of an affine map using the
//! same layout as a 2D canvas context:
//!
//! ```text
//! | a  c  tx |
//! | b  d  ty |
//! | 0  0  1  |
//! ```
//!
//! so a point maps as `x' = a·x + c·y + tx`, `y' = b·x + d·y + ty`.
//! Matrices are immutable values; every operation returns a new matrix.
//! `m1.multiply(m2)` applies `m2` first, then `m1`.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use std::ops::Mul;

use serde::{Deserialize, Serialize};

use crate::consts::MATRIX_EPSILON;
use crate::geometry::Point;

/// Errors from matrix operations.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum TransformError {
    /// The determinant is too close to zero for the matrix to be inverted.
    #[error("matrix not invertible (determinant {determinant})")]
    NotInvertible { determinant: f64 },
}

/// Direction of a quarter-turn rotation on a y-down surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    /// Clockwise: `(x, y) → (−y, x)`.
    Cw,
    /// Counter-clockwise: `(x, y) → (y, −x)`.
    Ccw,
}

/// A 2D affine transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix2D {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Matrix2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix2D {
    #[must_use]
    pub const fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    #[must_use]
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    #[must_use]
    pub const fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    #[must_use]
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    #[must_use]
    pub const fn uniform_scale(s: f64) -> Self {
        Self::scale(s, s)
    }

    /// Quarter-turn rotation about the origin.
    #[must_use]
    pub const fn rotation90(direction: Rotation) -> Self {
        match direction {
            Rotation::Cw => Self::new(0.0, 1.0, -1.0, 0.0, 0.0, 0.0),
            Rotation::Ccw => Self::new(0.0, -1.0, 1.0, 0.0, 0.0, 0.0),
        }
    }

    /// `self` followed by a quarter turn: `rotation90(direction) · self`.
    #[must_use]
    pub fn rotate90(self, direction: Rotation) -> Self {
        Self::rotation90(direction).multiply(self)
    }

    /// Compose two transforms. The result applies `other` first, then `self`.
    #[must_use]
    pub fn multiply(self, other: Self) -> Self {
        Self {
            a: self.a.mul_add(other.a, self.c * other.b),
            b: self.b.mul_add(other.a, self.d * other.b),
            c: self.a.mul_add(other.c, self.c * other.d),
            d: self.b.mul_add(other.c, self.d * other.d),
            tx: self.a.mul_add(other.tx, self.c.mul_add(other.ty, self.tx)),
            ty: self.b.mul_add(other.tx, self.d.mul_add(other.ty, self.ty)),
        }
    }

    #[must_use]
    pub fn determinant(self) -> f64 {
        self.a.mul_add(self.d, -(self.b * self.c))
    }

    /// Inverse transform.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::NotInvertible`] when the determinant is
    /// within a magnitude-scaled epsilon of zero.
    pub fn invert(self) -> Result<Self, TransformError> {
        let det = self.determinant();
        let magnitude = self.a.abs().max(self.b.abs()).max(self.c.abs()).max(self.d.abs());
        if !det.is_finite() || magnitude <= 0.0 || det.abs() < MATRIX_EPSILON * magnitude * magnitude {
            return Err(TransformError::NotInvertible { determinant: det });
        }
        Ok(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            tx: self.c.mul_add(self.ty, -(self.d * self.tx)) / det,
            ty: self.b.mul_add(self.tx, -(self.a * self.ty)) / det,
        })
    }

    #[must_use]
    pub fn apply(self, p: Point) -> Point {
        Point {
            x: self.a.mul_add(p.x, self.c.mul_add(p.y, self.tx)),
            y: self.b.mul_add(p.x, self.d.mul_add(p.y, self.ty)),
        }
    }

    /// Apply only the linear part (no translation); used for vectors.
    #[must_use]
    pub fn apply_vector(self, v: Point) -> Point {
        Point {
            x: self.a.mul_add(v.x, self.c * v.y),
            y: self.b.mul_add(v.x, self.d * v.y),
        }
    }

    /// Average linear scale: `√|det|`. Converts lengths between the two spaces.
    #[must_use]
    pub fn scale_factor(self) -> f64 {
        self.determinant().abs().sqrt()
    }

    /// Component-wise approximate equality.
    #[must_use]
    pub fn approx_eq(self, other: Self, epsilon: f64) -> bool {
        (self.a - other.a).abs() <= epsilon
            && (self.b - other.b).abs() <= epsilon
            && (self.c - other.c).abs() <= epsilon
            && (self.d - other.d).abs() <= epsilon
            && (self.tx - other.tx).abs() <= epsilon
            && (self.ty - other.ty).abs() <= epsilon
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        [self.a, self.b, self.c, self.d, self.tx, self.ty]
            .iter()
            .all(|v| v.is_finite())
    }
}

impl Mul for Matrix2D {
    type Output = Matrix2D;

    fn mul(self, rhs: Matrix2D) -> Matrix2D {
        self.multiply(rhs)
    }
}

/// Left fold of [`Matrix2D::multiply`] from identity.
///
/// `compose(&[a, b, c])` applies `c`, then `b`, then `a`.
#[must_use]
pub fn compose(matrices: &[Matrix2D]) -> Matrix2D {
    matrices
        .iter()
        .fold(Matrix2D::identity(), |acc, m| acc.multiply(*m))
}
