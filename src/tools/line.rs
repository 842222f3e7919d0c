//! Line tool: a straight two-point polyline.

#[cfg(test)]
#[path = "line_test.rs"]
mod line_test;

use super::creation::{CreationTool, ShapeSpec, clamp_stroke_width};
use super::{ToolId, ToolSettings};
use crate::consts::{DEFAULT_STROKE_WIDTH, MIN_SHAPE_LENGTH};
use crate::geometry::Point;
use crate::scene::{Drawing, DrawingKind, Handle, Polyline};

pub type LineTool = CreationTool<LineSpec>;

#[derive(Debug, Clone, PartialEq)]
pub struct LineSpec {
    pub stroke: String,
    pub width: f64,
}

impl Default for LineSpec {
    fn default() -> Self {
        Self { stroke: "#ffffff".into(), width: DEFAULT_STROKE_WIDTH }
    }
}

impl ShapeSpec for LineSpec {
    const TOOL: ToolId = ToolId::Line;
    const KIND: DrawingKind = DrawingKind::Line;
    const GROW_HANDLE: Handle = Handle::End;

    fn start(&self, at: Point, now_ms: i64) -> Drawing {
        Drawing::Line(Polyline::new(vec![at, at], self.stroke.clone(), self.width, now_ms))
    }

    fn is_degenerate(&self, drawing: &Drawing) -> bool {
        match drawing {
            Drawing::Line(line) => match (line.points.first(), line.points.last()) {
                (Some(a), Some(b)) => a.distance(*b) < MIN_SHAPE_LENGTH,
                _ => true,
            },
            _ => false,
        }
    }

    fn configure(&mut self, settings: &ToolSettings) {
        if let Some(stroke) = &settings.stroke {
            self.stroke.clone_from(stroke);
        }
        if let Some(width) = settings.width {
            self.width = clamp_stroke_width(width);
        }
    }

    fn settings(&self) -> ToolSettings {
        ToolSettings { stroke: Some(self.stroke.clone()), width: Some(self.width), ..ToolSettings::default() }
    }
}
