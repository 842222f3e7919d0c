//! Scene model: the field, the tokens placed on it, and the drawings layered
//! over it.
//!
//! A [`Scene`] is treated as an immutable snapshot once handed out. Tools and
//! hosts produce a new value for every committed mutation (clone, edit,
//! [`Scene::touch`]) and share snapshots behind `Arc`. List order is
//! meaningful: `drawings` paint bottom→top in array order and are
//! hit-tested in reverse.
//!
//! The serde shape is the persisted/exported snapshot format: camelCase
//! keys, drawings internally tagged by `kind`.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{MIN_IMAGE_SIZE, RECT_TOKEN_SIZE};
use crate::geometry::{Point, rotate_about};

/// Unique identifier for a token or drawing within a scene.
pub type ShapeId = Uuid;

/// Errors produced when loading or validating a scene snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// Two shapes in the same scene share an id.
    #[error("duplicate shape id: {0}")]
    DuplicateId(ShapeId),
    /// The snapshot JSON could not be parsed or produced.
    #[error("invalid scene JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================
// Field
// =============================================================

/// Field dimensions in field units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSize {
    pub width: f64,
    pub height: f64,
}

/// How the field is presented on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    /// Rendered rotated a quarter turn; field coordinates are unchanged.
    Portrait,
}

/// Axis-aligned bounds in field units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    #[must_use]
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut b = Bounds { min: *first, max: *first };
        for p in rest {
            b.min.x = b.min.x.min(p.x);
            b.min.y = b.min.y.min(p.y);
            b.max.x = b.max.x.max(p.x);
            b.max.y = b.max.y.max(p.y);
        }
        Some(b)
    }

    /// Top-right corner on a y-down surface.
    #[must_use]
    pub fn top_right(self) -> Point {
        Point::new(self.max.x, self.min.y)
    }
}

// =============================================================
// Tokens
// =============================================================

/// Token silhouette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenShape {
    /// Team-colored disc; its radius is a style setting, not part of the token.
    #[default]
    Circle,
    /// Neutral marker with independent width and height.
    Rect,
}

/// A piece placed on the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: ShapeId,
    pub team_id: String,
    /// Center x in field units.
    pub x: f64,
    /// Center y in field units.
    pub y: f64,
    /// Clockwise rotation in degrees around the center.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<TokenShape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Token {
    /// A circular team token.
    #[must_use]
    pub fn new(team_id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_id: team_id.into(),
            x,
            y,
            rotation: None,
            shape: None,
            width: None,
            height: None,
            color: None,
            label: None,
        }
    }

    /// A rectangular neutral marker.
    #[must_use]
    pub fn marker(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            shape: Some(TokenShape::Rect),
            width: Some(width),
            height: Some(height),
            ..Self::new("neutral", x, y)
        }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn shape(&self) -> TokenShape {
        self.shape.unwrap_or_default()
    }

    /// Half width and half height of the token's footprint, with circles
    /// drawn at `radius`.
    #[must_use]
    pub fn half_extents(&self, radius: f64) -> (f64, f64) {
        match self.shape() {
            TokenShape::Circle => (radius, radius),
            TokenShape::Rect => (
                self.width.unwrap_or(RECT_TOKEN_SIZE).abs() / 2.0,
                self.height.unwrap_or(RECT_TOKEN_SIZE).abs() / 2.0,
            ),
        }
    }

    /// Whether `p` lies on the token (circle radius test or rotated rect test).
    #[must_use]
    pub fn contains(&self, p: Point, radius: f64) -> bool {
        match self.shape() {
            TokenShape::Circle => p.distance(self.position()) <= radius,
            TokenShape::Rect => {
                let local = rotate_about(p, self.position(), -self.rotation.unwrap_or(0.0));
                let (hw, hh) = self.half_extents(radius);
                (local.x - self.x).abs() <= hw && (local.y - self.y).abs() <= hh
            }
        }
    }

    #[must_use]
    pub fn bounds(&self, radius: f64) -> Bounds {
        let (hw, hh) = self.half_extents(radius);
        let reach = match self.shape() {
            TokenShape::Circle => radius,
            TokenShape::Rect if self.rotation.unwrap_or(0.0) != 0.0 => hw.hypot(hh),
            TokenShape::Rect => {
                return Bounds {
                    min: Point::new(self.x - hw, self.y - hh),
                    max: Point::new(self.x + hw, self.y + hh),
                };
            }
        };
        Bounds {
            min: Point::new(self.x - reach, self.y - reach),
            max: Point::new(self.x + reach, self.y + reach),
        }
    }
}

// =============================================================
// Drawings
// =============================================================

/// Creation and last-edit timestamps (milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingMeta {
    pub created_at: i64,
    pub updated_at: i64,
}

impl DrawingMeta {
    #[must_use]
    pub fn at(now_ms: i64) -> Self {
        Self { created_at: now_ms, updated_at: now_ms }
    }
}

/// A polyline drawing, used by both `line` (two points) and `pen` (many).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub id: ShapeId,
    pub points: Vec<Point>,
    pub stroke: String,
    pub width: f64,
    pub meta: DrawingMeta,
}

impl Polyline {
    #[must_use]
    pub fn new(points: Vec<Point>, stroke: impl Into<String>, width: f64, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            points,
            stroke: stroke.into(),
            width,
            meta: DrawingMeta::at(now_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    pub id: ShapeId,
    pub from: Point,
    pub to: Point,
    pub stroke: String,
    pub width: f64,
    pub meta: DrawingMeta,
}

/// A filled disc zone marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cone {
    pub id: ShapeId,
    pub at: Point,
    pub radius: f64,
    pub fill: String,
    pub meta: DrawingMeta,
}

/// An axis-aligned bitmap placed on the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDrawing {
    pub id: ShapeId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    pub meta: DrawingMeta,
}

/// Annotation layered over the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Drawing {
    Line(Polyline),
    Pen(Polyline),
    Arrow(Arrow),
    Cone(Cone),
    Image(ImageDrawing),
}

/// Discriminant of [`Drawing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingKind {
    Line,
    Pen,
    Arrow,
    Cone,
    Image,
}

/// Reference to a token or drawing by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum ShapeRef {
    Token(ShapeId),
    Drawing(ShapeId),
}

impl ShapeRef {
    #[must_use]
    pub fn id(self) -> ShapeId {
        match self {
            Self::Token(id) | Self::Drawing(id) => id,
        }
    }
}

/// An editable control point of a drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    /// First point of a polyline, or the tail of an arrow.
    Start,
    /// Last point of a polyline, the tip of an arrow, or an image's bottom-right corner.
    End,
    /// Rim of a cone; dragging it changes the radius.
    Radius,
}

impl Drawing {
    #[must_use]
    pub fn id(&self) -> ShapeId {
        match self {
            Self::Line(p) | Self::Pen(p) => p.id,
            Self::Arrow(a) => a.id,
            Self::Cone(c) => c.id,
            Self::Image(i) => i.id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> DrawingKind {
        match self {
            Self::Line(_) => DrawingKind::Line,
            Self::Pen(_) => DrawingKind::Pen,
            Self::Arrow(_) => DrawingKind::Arrow,
            Self::Cone(_) => DrawingKind::Cone,
            Self::Image(_) => DrawingKind::Image,
        }
    }

    #[must_use]
    pub fn meta(&self) -> &DrawingMeta {
        match self {
            Self::Line(p) | Self::Pen(p) => &p.meta,
            Self::Arrow(a) => &a.meta,
            Self::Cone(c) => &c.meta,
            Self::Image(i) => &i.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut DrawingMeta {
        match self {
            Self::Line(p) | Self::Pen(p) => &mut p.meta,
            Self::Arrow(a) => &mut a.meta,
            Self::Cone(c) => &mut c.meta,
            Self::Image(i) => &mut i.meta,
        }
    }

    /// Stroke width in field units; filled shapes report zero.
    #[must_use]
    pub fn stroke_width(&self) -> f64 {
        match self {
            Self::Line(p) | Self::Pen(p) => p.width,
            Self::Arrow(a) => a.width,
            Self::Cone(_) | Self::Image(_) => 0.0,
        }
    }

    /// Shift the whole drawing by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        match self {
            Self::Line(p) | Self::Pen(p) => {
                for pt in &mut p.points {
                    *pt = pt.offset(dx, dy);
                }
            }
            Self::Arrow(a) => {
                a.from = a.from.offset(dx, dy);
                a.to = a.to.offset(dx, dy);
            }
            Self::Cone(c) => c.at = c.at.offset(dx, dy),
            Self::Image(i) => {
                i.x += dx;
                i.y += dy;
            }
        }
    }

    /// Editable handles and their current positions.
    #[must_use]
    pub fn handles(&self) -> Vec<(Handle, Point)> {
        match self {
            Self::Line(p) | Self::Pen(p) => match (p.points.first(), p.points.last()) {
                (Some(first), Some(last)) if p.points.len() > 1 => {
                    vec![(Handle::Start, *first), (Handle::End, *last)]
                }
                _ => Vec::new(),
            },
            Self::Arrow(a) => vec![(Handle::Start, a.from), (Handle::End, a.to)],
            Self::Cone(c) => vec![(Handle::Radius, c.at.offset(c.radius, 0.0))],
            Self::Image(i) => vec![(Handle::End, Point::new(i.x + i.width, i.y + i.height))],
        }
    }

    /// Move one handle to `to`. Returns `false` when the drawing has no such handle.
    ///
    /// Cone radius becomes the distance from the center; an image's `End`
    /// corner never shrinks it below [`MIN_IMAGE_SIZE`].
    pub fn move_handle(&mut self, handle: Handle, to: Point) -> bool {
        match (self, handle) {
            (Self::Line(p) | Self::Pen(p), Handle::Start) => p.points.first_mut().map(|pt| *pt = to).is_some(),
            (Self::Line(p) | Self::Pen(p), Handle::End) => p.points.last_mut().map(|pt| *pt = to).is_some(),
            (Self::Arrow(a), Handle::Start) => {
                a.from = to;
                true
            }
            (Self::Arrow(a), Handle::End) => {
                a.to = to;
                true
            }
            (Self::Cone(c), Handle::Radius) => {
                c.radius = c.at.distance(to);
                true
            }
            (Self::Image(i), Handle::End) => {
                i.width = (to.x - i.x).max(MIN_IMAGE_SIZE);
                i.height = (to.y - i.y).max(MIN_IMAGE_SIZE);
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            Self::Line(p) | Self::Pen(p) => Bounds::from_points(&p.points),
            Self::Arrow(a) => Bounds::from_points(&[a.from, a.to]),
            Self::Cone(c) => Some(Bounds {
                min: c.at.offset(-c.radius, -c.radius),
                max: c.at.offset(c.radius, c.radius),
            }),
            Self::Image(i) => Bounds::from_points(&[
                Point::new(i.x, i.y),
                Point::new(i.x + i.width, i.y + i.height),
            ]),
        }
    }
}

// =============================================================
// Scene
// =============================================================

/// A complete board snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: Uuid,
    pub field: FieldSize,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub tokens: Vec<Token>,
    /// Paint order bottom→top.
    #[serde(default)]
    pub drawings: Vec<Drawing>,
    /// Milliseconds; advances on every committed mutation.
    #[serde(default)]
    pub last_updated_at: i64,
}

impl Scene {
    /// An empty scene with a fresh id.
    #[must_use]
    pub fn new(field: FieldSize, orientation: Orientation) -> Self {
        Self {
            id: Uuid::new_v4(),
            field,
            orientation,
            tokens: Vec::new(),
            drawings: Vec::new(),
            last_updated_at: 0,
        }
    }

    /// Advance `last_updated_at` to `now_ms`, or one past its previous value
    /// when the clock has not moved forward.
    pub fn touch(&mut self, now_ms: i64) {
        self.last_updated_at = now_ms.max(self.last_updated_at.saturating_add(1));
    }

    #[must_use]
    pub fn token(&self, id: ShapeId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == id)
    }

    pub fn token_mut(&mut self, id: ShapeId) -> Option<&mut Token> {
        self.tokens.iter_mut().find(|t| t.id == id)
    }

    #[must_use]
    pub fn drawing(&self, id: ShapeId) -> Option<&Drawing> {
        self.drawings.iter().find(|d| d.id() == id)
    }

    pub fn drawing_mut(&mut self, id: ShapeId) -> Option<&mut Drawing> {
        self.drawings.iter_mut().find(|d| d.id() == id)
    }

    #[must_use]
    pub fn drawing_index(&self, id: ShapeId) -> Option<usize> {
        self.drawings.iter().position(|d| d.id() == id)
    }

    /// Whether the referenced shape exists with the referenced type.
    #[must_use]
    pub fn contains(&self, shape: ShapeRef) -> bool {
        match shape {
            ShapeRef::Token(id) => self.token(id).is_some(),
            ShapeRef::Drawing(id) => self.drawing(id).is_some(),
        }
    }

    /// Bounds of the referenced shape, if it exists. Circle tokens use
    /// `token_radius`.
    #[must_use]
    pub fn bounds_of(&self, shape: ShapeRef, token_radius: f64) -> Option<Bounds> {
        match shape {
            ShapeRef::Token(id) => self.token(id).map(|token| token.bounds(token_radius)),
            ShapeRef::Drawing(id) => self.drawing(id).and_then(Drawing::bounds),
        }
    }

    #[must_use]
    pub fn contains_id(&self, id: ShapeId) -> bool {
        self.token(id).is_some() || self.drawing(id).is_some()
    }

    /// Append a token on top of the others and return its id.
    pub fn add_token(&mut self, token: Token) -> ShapeId {
        let id = token.id;
        self.tokens.push(token);
        id
    }

    /// Append a drawing at the top of the paint order and return its id.
    pub fn add_drawing(&mut self, drawing: Drawing) -> ShapeId {
        let id = drawing.id();
        self.drawings.push(drawing);
        id
    }

    pub fn remove_token(&mut self, id: ShapeId) -> Option<Token> {
        let idx = self.tokens.iter().position(|t| t.id == id)?;
        Some(self.tokens.remove(idx))
    }

    pub fn remove_drawing(&mut self, id: ShapeId) -> Option<Drawing> {
        let idx = self.drawing_index(id)?;
        Some(self.drawings.remove(idx))
    }

    /// Remove a token or drawing by id. Returns `false` when nothing matched.
    pub fn remove(&mut self, id: ShapeId) -> bool {
        self.remove_token(id).is_some() || self.remove_drawing(id).is_some()
    }

    /// Whether two snapshots hold the same field, tokens and drawings,
    /// ignoring `id` and `last_updated_at`.
    #[must_use]
    pub fn same_content(&self, other: &Scene) -> bool {
        self.field == other.field
            && self.orientation == other.orientation
            && self.tokens == other.tokens
            && self.drawings == other.drawings
    }

    /// Check that every token and drawing id is unique.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::DuplicateId`] naming the first repeated id.
    pub fn validate(&self) -> Result<(), SceneError> {
        let mut seen = HashSet::with_capacity(self.tokens.len() + self.drawings.len());
        let ids = self
            .tokens
            .iter()
            .map(|t| t.id)
            .chain(self.drawings.iter().map(Drawing::id));
        for id in ids {
            if !seen.insert(id) {
                return Err(SceneError::DuplicateId(id));
            }
        }
        Ok(())
    }

    /// Parse and validate a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Json`] for malformed input and
    /// [`SceneError::DuplicateId`] when ids collide.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let scene: Scene = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Serialize the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
