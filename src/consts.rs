//! Shared numeric constants for the board engine.

// ── Transform ───────────────────────────────────────────────────

/// Base tolerance for matrix singularity, scaled by input magnitude.
pub const MATRIX_EPSILON: f64 = 1e-9;

/// Segments shorter than this are skipped by erase clipping.
pub const SEGMENT_EPSILON: f64 = 1e-9;

// ── Engine ──────────────────────────────────────────────────────

/// Default fit padding around the field, in CSS pixels.
pub const DEFAULT_PADDING_PX: f64 = 10.0;

/// Smallest accepted device pixel ratio.
pub const MIN_DEVICE_PIXEL_RATIO: f64 = 0.1;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit radius in pixels for drawing handles.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Extra screen-space slop added to half the stroke width when hitting drawing bodies.
pub const BODY_SLOP_PX: f64 = 4.0;

/// Distance from the selected shape's bounding box corner to the delete icon center, in pixels.
pub const DELETE_ICON_OFFSET_PX: f64 = 12.0;

/// Hit radius of the delete icon, in pixels.
pub const DELETE_ICON_RADIUS_PX: f64 = 8.0;

// ── Tokens ──────────────────────────────────────────────────────

/// Default radius of a circular team token in field units.
pub const DEFAULT_TOKEN_RADIUS: f64 = 2.0;

/// Smallest accepted circular token radius.
pub const MIN_TOKEN_RADIUS: f64 = 0.1;

/// Default edge length of a rectangular marker token in field units.
pub const RECT_TOKEN_SIZE: f64 = 4.0;

// ── Tools ───────────────────────────────────────────────────────

/// Default stroke width for lines, pens and arrows, in field units.
pub const DEFAULT_STROKE_WIDTH: f64 = 0.5;

/// Thinnest stroke a tool will produce.
pub const MIN_STROKE_WIDTH: f64 = 0.05;

/// Minimum spacing between recorded pen samples, in field units.
pub const PEN_MIN_DISTANCE: f64 = 0.35;

/// Lines and arrows shorter than this are discarded on release.
pub const MIN_SHAPE_LENGTH: f64 = 1e-3;

/// Cones with a smaller radius are discarded on release.
pub const MIN_CONE_RADIUS: f64 = 1e-3;

/// Default eraser radius in field units.
pub const DEFAULT_ERASER_RADIUS: f64 = 1.5;

/// Smallest eraser radius after clamping.
pub const MIN_ERASER_RADIUS: f64 = 0.1;

/// Smallest image edge length after a corner resize.
pub const MIN_IMAGE_SIZE: f64 = 1.0;

/// Maximum number of simultaneously tracked pointers per tool.
pub const MAX_ACTIVE_POINTERS: usize = 10;

// ── History ─────────────────────────────────────────────────────

/// Default number of undo (and redo) entries retained.
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

// ── Rendering ───────────────────────────────────────────────────

/// Arrowhead length as a multiple of the arrow's stroke width.
pub const ARROW_HEAD_SCALE: f64 = 4.0;

/// Arrowhead half-angle in radians (~30°).
pub const ARROW_HEAD_ANGLE: f64 = std::f64::consts::PI / 6.0;

/// Selection dash segment length in screen pixels.
pub const SELECTION_DASH_PX: f64 = 4.0;
