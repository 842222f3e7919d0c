//! Eraser tool: clips pen and line strokes against a circle around the pointer.

#[cfg(test)]
#[path = "eraser_test.rs"]
mod eraser_test;

use tracing::{debug, warn};

use super::session::PointerSessions;
use super::{Tool, ToolEventData, ToolId, ToolRuntime, ToolSettings};
use crate::consts::{DEFAULT_ERASER_RADIUS, MIN_ERASER_RADIUS, SEGMENT_EPSILON};
use crate::engine::{PointerContext, PointerKind};
use crate::geometry::{Point, segment_circle_params};
use crate::scene::{Drawing, Polyline, ShapeId};

#[derive(Debug)]
pub struct EraserTool {
    radius: f64,
    sessions: PointerSessions<()>,
}

impl Default for EraserTool {
    fn default() -> Self {
        Self { radius: DEFAULT_ERASER_RADIUS, sessions: PointerSessions::default() }
    }
}

impl EraserTool {
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    fn erase_at(&self, ctx: &PointerContext, rt: &mut ToolRuntime<'_>) {
        let mut removed: Vec<ShapeId> = Vec::new();
        let mut created: Vec<ShapeId> = Vec::new();
        let mut next: Vec<Drawing> = Vec::with_capacity(rt.scene().drawings.len());

        for drawing in &rt.scene().drawings {
            let clipped = match drawing {
                Drawing::Line(line) | Drawing::Pen(line) => {
                    clip_polyline(&line.points, ctx.point, self.radius + line.width / 2.0)
                        .map(|fragments| (line, fragments))
                }
                _ => None,
            };
            let Some((line, fragments)) = clipped else {
                next.push(drawing.clone());
                continue;
            };
            removed.push(line.id);
            for points in fragments {
                let fragment = Polyline::new(points, line.stroke.clone(), line.width, ctx.timestamp_ms);
                created.push(fragment.id);
                next.push(match drawing {
                    Drawing::Pen(_) => Drawing::Pen(fragment),
                    _ => Drawing::Line(fragment),
                });
            }
        }

        if removed.is_empty() {
            return;
        }
        debug!(removed = removed.len(), created = created.len(), "erased");
        rt.update_scene(|scene| scene.drawings = next);
        rt.emit(ToolEventData::Erased { removed, created });
    }
}

impl Tool for EraserTool {
    fn id(&self) -> ToolId {
        ToolId::Eraser
    }

    fn handle(&mut self, ctx: &PointerContext, rt: &mut ToolRuntime<'_>) {
        match ctx.kind {
            PointerKind::Down => {
                if self.sessions.begin(ctx.pointer_id, ()) {
                    self.erase_at(ctx, rt);
                }
            }
            PointerKind::Move => {
                if ctx.is_pressed() && self.sessions.get(ctx.pointer_id).is_some() {
                    self.erase_at(ctx, rt);
                }
            }
            PointerKind::Up | PointerKind::Cancel => {
                self.sessions.end(ctx.pointer_id);
            }
        }
    }

    fn configure(&mut self, settings: &ToolSettings) {
        if let Some(radius) = settings.radius {
            self.radius = if radius.is_finite() {
                radius.max(MIN_ERASER_RADIUS)
            } else {
                warn!(radius, "invalid eraser radius; using default");
                DEFAULT_ERASER_RADIUS
            };
        }
    }

    fn settings(&self) -> ToolSettings {
        ToolSettings { radius: Some(self.radius), ..ToolSettings::default() }
    }

    fn reset(&mut self) {
        self.sessions.clear();
    }
}

/// Remove the parts of `points` inside the circle.
///
/// Returns `None` when nothing lies inside, otherwise the surviving
/// fragments (each with at least two points). Segments shorter than
/// [`SEGMENT_EPSILON`] are skipped; a polyline made only of such segments
/// is a point and is removed entirely when inside the circle.
#[must_use]
pub fn clip_polyline(points: &[Point], center: Point, radius: f64) -> Option<Vec<Vec<Point>>> {
    let first = *points.first()?;
    if points.windows(2).all(|pair| pair[0].distance(pair[1]) <= SEGMENT_EPSILON) {
        return (first.distance(center) <= radius).then(Vec::new);
    }

    let mut fragments = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let mut touched = false;

    for pair in points.windows(2) {
        let &[a, b] = pair else {
            continue;
        };
        if a.distance(b) <= SEGMENT_EPSILON {
            continue;
        }
        let mut ts = Vec::with_capacity(4);
        ts.push(0.0);
        ts.extend(segment_circle_params(a, b, center, radius));
        ts.push(1.0);

        for span in ts.windows(2) {
            let &[t0, t1] = span else {
                continue;
            };
            let mid = a.lerp(b, (t0 + t1) / 2.0);
            if mid.distance(center) > radius {
                if current.is_empty() {
                    current.push(point_at(a, b, t0));
                }
                current.push(point_at(a, b, t1));
            } else {
                touched = true;
                flush(&mut current, &mut fragments);
            }
        }
    }
    flush(&mut current, &mut fragments);

    touched.then_some(fragments)
}

fn point_at(a: Point, b: Point, t: f64) -> Point {
    if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        a.lerp(b, t)
    }
}

fn flush(current: &mut Vec<Point>, fragments: &mut Vec<Vec<Point>>) {
    let points = std::mem::take(current);
    if points.len() >= 2 {
        fragments.push(points);
    }
}
