use super::*;

#[test]
fn new_surface_is_empty() {
    let s = RecordingSurface::new();
    assert_eq!(s.size(), (0, 0));
    assert!(s.ops().is_empty());
    assert_eq!(s.depth(), 0);
}

#[test]
fn restore_rolls_back_style() {
    let mut s = RecordingSurface::new();
    s.set_fill_style("#111");
    s.save();
    s.set_fill_style("#222");
    s.set_line_width(7.0);
    s.restore();
    assert_eq!(s.state().fill_style, "#111");
    assert_eq!(s.state().line_width, 1.0);
    assert_eq!(s.depth(), 0);
}

#[test]
fn set_size_resets_state() {
    let mut s = RecordingSurface::new();
    s.save();
    s.set_stroke_style("red");
    s.set_size(400, 300);
    assert_eq!(s.size(), (400, 300));
    assert_eq!(s.depth(), 0);
    assert_eq!(s.state().stroke_style, "#000");
}

#[test]
fn non_finite_transform_is_rejected() {
    let mut s = RecordingSurface::new();
    let m = Matrix2D::translate(f64::INFINITY, 0.0);
    assert!(s.set_transform(m).is_err());
    assert_eq!(s.state().transform, Matrix2D::identity());
}

#[test]
fn negative_arc_radius_is_rejected() {
    let mut s = RecordingSurface::new();
    assert!(s.arc(Point::new(0.0, 0.0), -1.0, 0.0, 1.0).is_err());
}

#[test]
fn take_ops_drains_log() {
    let mut s = RecordingSurface::new();
    s.begin_path();
    s.stroke();
    assert_eq!(s.take_ops(), vec![SurfaceOp::BeginPath, SurfaceOp::Stroke]);
    assert!(s.ops().is_empty());
}
