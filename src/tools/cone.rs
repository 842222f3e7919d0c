//! Cone tool: a filled disc dragged out from its center.

#[cfg(test)]
#[path = "cone_test.rs"]
mod cone_test;

use uuid::Uuid;

use super::creation::{CreationTool, ShapeSpec};
use super::{ToolId, ToolSettings};
use crate::consts::MIN_CONE_RADIUS;
use crate::geometry::Point;
use crate::scene::{Cone, Drawing, DrawingKind, DrawingMeta, Handle};

pub type ConeTool = CreationTool<ConeSpec>;

#[derive(Debug, Clone, PartialEq)]
pub struct ConeSpec {
    pub fill: String,
}

impl Default for ConeSpec {
    fn default() -> Self {
        Self { fill: "#ff9800".into() }
    }
}

impl ShapeSpec for ConeSpec {
    const TOOL: ToolId = ToolId::Cone;
    const KIND: DrawingKind = DrawingKind::Cone;
    const GROW_HANDLE: Handle = Handle::Radius;

    fn start(&self, at: Point, now_ms: i64) -> Drawing {
        Drawing::Cone(Cone { id: Uuid::new_v4(), at, radius: 0.0, fill: self.fill.clone(), meta: DrawingMeta::at(now_ms) })
    }

    fn is_degenerate(&self, drawing: &Drawing) -> bool {
        matches!(drawing, Drawing::Cone(c) if c.radius < MIN_CONE_RADIUS)
    }

    fn configure(&mut self, settings: &ToolSettings) {
        if let Some(fill) = &settings.fill {
            self.fill.clone_from(fill);
        }
    }

    fn settings(&self) -> ToolSettings {
        ToolSettings { fill: Some(self.fill.clone()), ..ToolSettings::default() }
    }
}
