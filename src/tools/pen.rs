//! Pen tool: freehand polyline with distance-based decimation.
//!
//! A sample is kept only when it lies farther than `min_distance` field
//! units from the last kept one. A stroke that never leaves its first
//! sample is committed as a dot.

#[cfg(test)]
#[path = "pen_test.rs"]
mod pen_test;

use tracing::warn;

use super::creation::{CreationTool, ShapeSpec, clamp_stroke_width};
use super::{ToolId, ToolSettings};
use crate::consts::{DEFAULT_STROKE_WIDTH, PEN_MIN_DISTANCE};
use crate::geometry::Point;
use crate::scene::{Drawing, DrawingKind, Handle, Polyline};

pub type PenTool = CreationTool<PenSpec>;

#[derive(Debug, Clone, PartialEq)]
pub struct PenSpec {
    pub stroke: String,
    pub width: f64,
    pub min_distance: f64,
}

impl Default for PenSpec {
    fn default() -> Self {
        Self { stroke: "#ffffff".into(), width: DEFAULT_STROKE_WIDTH, min_distance: PEN_MIN_DISTANCE }
    }
}

impl ShapeSpec for PenSpec {
    const TOOL: ToolId = ToolId::Pen;
    const KIND: DrawingKind = DrawingKind::Pen;
    const GROW_HANDLE: Handle = Handle::End;

    fn start(&self, at: Point, now_ms: i64) -> Drawing {
        Drawing::Pen(Polyline::new(vec![at], self.stroke.clone(), self.width, now_ms))
    }

    fn extend(&self, drawing: &mut Drawing, to: Point) {
        let Drawing::Pen(line) = drawing else {
            return;
        };
        let far_enough = line.points.last().is_none_or(|last| last.distance(to) > self.min_distance);
        if far_enough {
            line.points.push(to);
        }
    }

    fn is_degenerate(&self, drawing: &Drawing) -> bool {
        matches!(drawing, Drawing::Pen(line) if line.points.is_empty())
    }

    fn configure(&mut self, settings: &ToolSettings) {
        if let Some(stroke) = &settings.stroke {
            self.stroke.clone_from(stroke);
        }
        if let Some(width) = settings.width {
            self.width = clamp_stroke_width(width);
        }
        if let Some(min_distance) = settings.min_distance {
            self.min_distance = if min_distance.is_finite() && min_distance >= 0.0 {
                min_distance
            } else {
                warn!(min_distance, "invalid pen min distance; using default");
                PEN_MIN_DISTANCE
            };
        }
    }

    fn settings(&self) -> ToolSettings {
        ToolSettings {
            stroke: Some(self.stroke.clone()),
            width: Some(self.width),
            min_distance: Some(self.min_distance),
            ..ToolSettings::default()
        }
    }
}
