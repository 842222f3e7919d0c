//! Arrow tool: a directed segment with a filled head at `to`.

#[cfg(test)]
#[path = "arrow_test.rs"]
mod arrow_test;

use uuid::Uuid;

use super::creation::{CreationTool, ShapeSpec, clamp_stroke_width};
use super::{ToolId, ToolSettings};
use crate::consts::{DEFAULT_STROKE_WIDTH, MIN_SHAPE_LENGTH};
use crate::geometry::Point;
use crate::scene::{Arrow, Drawing, DrawingKind, DrawingMeta, Handle};

pub type ArrowTool = CreationTool<ArrowSpec>;

#[derive(Debug, Clone, PartialEq)]
pub struct ArrowSpec {
    pub stroke: String,
    pub width: f64,
}

impl Default for ArrowSpec {
    fn default() -> Self {
        Self { stroke: "#ffeb3b".into(), width: DEFAULT_STROKE_WIDTH }
    }
}

impl ShapeSpec for ArrowSpec {
    const TOOL: ToolId = ToolId::Arrow;
    const KIND: DrawingKind = DrawingKind::Arrow;
    const GROW_HANDLE: Handle = Handle::End;

    fn start(&self, at: Point, now_ms: i64) -> Drawing {
        Drawing::Arrow(Arrow {
            id: Uuid::new_v4(),
            from: at,
            to: at,
            stroke: self.stroke.clone(),
            width: self.width,
            meta: DrawingMeta::at(now_ms),
        })
    }

    fn is_degenerate(&self, drawing: &Drawing) -> bool {
        matches!(drawing, Drawing::Arrow(a) if a.from.distance(a.to) < MIN_SHAPE_LENGTH)
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
