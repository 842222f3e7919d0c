#![allow(clippy::float_cmp)]

use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::surface::{RecordingSurface, SurfaceOp};

const EPSILON: f64 = 1e-9;

// =============================================================
// Helpers
// =============================================================

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

fn scene(width: f64, height: f64, orientation: Orientation) -> Arc<Scene> {
    Arc::new(Scene::new(FieldSize { width, height }, orientation))
}

fn engine_with(viewport: (f64, f64), field: (f64, f64), orientation: Orientation) -> RenderEngine<RecordingSurface> {
    let mut engine = RenderEngine::with_padding(RecordingSurface::new(), 10.0);
    engine.resize(viewport.0, viewport.1).unwrap();
    engine.set_scene(scene(field.0, field.1, orientation)).unwrap();
    engine
}

fn raw(kind: PointerKind, x: f64, y: f64) -> RawPointerEvent {
    RawPointerEvent { kind, pointer_id: 1, client_x: x, client_y: y, buttons: 1, timestamp: 5.0 }
}

// =============================================================
// Layers
// =============================================================

#[test]
fn layer_order_is_fixed() {
    assert_eq!(Layer::ALL, [Layer::Background, Layer::Drawings, Layer::Tokens, Layer::Overlay]);
}

#[test]
fn layer_parses_known_names() {
    assert_eq!("tokens".parse::<Layer>().unwrap(), Layer::Tokens);
    assert_eq!(Layer::Overlay.to_string(), "overlay");
}

#[test]
fn layer_unknown_name_is_invalid_argument() {
    let err = "foreground".parse::<Layer>().unwrap_err();
    assert_eq!(err, EngineError::UnknownLayer("foreground".into()));
}

// =============================================================
// Fit transform
// =============================================================

#[test]
fn fit_landscape_scenario() {
    let m = fit_transform(
        FieldSize { width: 100.0, height: 50.0 },
        Orientation::Landscape,
        Viewport { width: 200.0, height: 200.0 },
        10.0,
    );
    assert!(approx_eq(m.a, 1.8));
    assert!(approx_eq(m.d, 1.8));
    assert!(approx_eq(m.tx, 10.0));
    assert!(approx_eq(m.ty, 55.0));
}

#[test]
fn fit_portrait_keeps_field_inside_viewport() {
    let field = FieldSize { width: 100.0, height: 50.0 };
    let viewport = Viewport { width: 200.0, height: 400.0 };
    let m = fit_transform(field, Orientation::Portrait, viewport, 10.0);
    for corner in [
        Point::new(0.0, 0.0),
        Point::new(100.0, 0.0),
        Point::new(0.0, 50.0),
        Point::new(100.0, 50.0),
    ] {
        let p = m.apply(corner);
        assert!(p.x >= 10.0 - EPSILON && p.x <= 190.0 + EPSILON, "{corner:?} → {p:?}");
        assert!(p.y >= 10.0 - EPSILON && p.y <= 390.0 + EPSILON, "{corner:?} → {p:?}");
    }
    // Effective size is 50×100; scale = min(180/50, 380/100) = 3.6.
    assert!(approx_eq(m.scale_factor(), 3.6));
}

#[test]
fn fit_portrait_rotates_field_x_axis_downwards() {
    let m = fit_transform(
        FieldSize { width: 100.0, height: 50.0 },
        Orientation::Portrait,
        Viewport { width: 200.0, height: 400.0 },
        10.0,
    );
    let origin = m.apply(Point::new(0.0, 0.0));
    let along_x = m.apply(Point::new(10.0, 0.0));
    assert!(approx_eq(along_x.x, origin.x));
    assert!(along_x.y > origin.y);
}

// =============================================================
// Resize / DPR
// =============================================================

#[test]
fn new_engine_defaults() {
    let engine = RenderEngine::new(RecordingSurface::new());
    assert_eq!(engine.transform_mode(), TransformMode::Auto);
    assert_eq!(engine.device_pixel_ratio(), 1.0);
    assert_eq!(engine.field_to_surface(), Matrix2D::identity());
    assert!(!engine.is_draw_pending());
}

#[test]
fn resize_scales_backing_store_by_dpr() {
    let mut engine = RenderEngine::new(RecordingSurface::new());
    engine.set_device_pixel_ratio(2.0).unwrap();
    engine.resize(300.0, 150.0).unwrap();
    assert_eq!(engine.surface().size(), (600, 300));
}

#[test]
fn field_to_surface_includes_dpr() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    engine.set_device_pixel_ratio(2.0).unwrap();
    let m = engine.field_to_surface();
    assert!(approx_eq(m.a, 3.6));
    assert!(approx_eq(m.tx, 20.0));
    assert!(approx_eq(m.ty, 110.0));
}

#[test]
fn bad_dpr_is_clamped() {
    let mut engine = RenderEngine::new(RecordingSurface::new());
    engine.set_device_pixel_ratio(f64::NAN).unwrap();
    assert_eq!(engine.device_pixel_ratio(), 1.0);
    engine.set_device_pixel_ratio(-3.0).unwrap();
    assert_eq!(engine.device_pixel_ratio(), MIN_DEVICE_PIXEL_RATIO);
}

#[test]
fn resize_auto_mode_refits() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    engine.resize(420.0, 200.0).unwrap();
    // min(400/100, 180/50) = 3.6
    assert!(approx_eq(engine.view_transform().a, 3.6));
}

#[test]
fn resize_custom_mode_keeps_transform() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    let custom = Matrix2D::translate(5.0, 5.0).multiply(Matrix2D::uniform_scale(3.0));
    engine.set_transform(custom).unwrap();
    engine.resize(800.0, 600.0).unwrap();
    assert_eq!(engine.transform_mode(), TransformMode::Custom);
    assert_eq!(engine.view_transform(), custom);
    assert_eq!(engine.surface().size(), (800, 600));
}

#[test]
fn resize_to_zero_reports_singular_transform() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    let before = engine.field_to_surface();
    let err = engine.resize(0.0, 0.0).unwrap_err();
    assert!(matches!(err, EngineError::Transform(TransformError::NotInvertible { .. })));
    assert_eq!(engine.field_to_surface(), before);
}

// =============================================================
// Scene / custom transform
// =============================================================

#[test]
fn set_scene_auto_mode_fits_new_field() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    engine.set_scene(scene(50.0, 50.0, Orientation::Landscape)).unwrap();
    assert!(approx_eq(engine.view_transform().a, 3.6));
}

#[test]
fn set_scene_custom_mode_keeps_transform() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    let custom = Matrix2D::uniform_scale(2.0);
    engine.set_transform(custom).unwrap();
    engine.set_scene(scene(10.0, 10.0, Orientation::Portrait)).unwrap();
    assert_eq!(engine.view_transform(), custom);
}

#[test]
fn set_transform_schedules_draw() {
    let mut engine = RenderEngine::new(RecordingSurface::new());
    engine.draw(None);
    assert!(!engine.is_draw_pending());
    engine.set_transform(Matrix2D::uniform_scale(2.0)).unwrap();
    assert!(engine.is_draw_pending());
}

#[test]
fn set_transform_rejects_singular_matrix() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    let err = engine.set_transform(Matrix2D::scale(0.0, 1.0)).unwrap_err();
    assert!(matches!(err, EngineError::Transform(_)));
    assert_eq!(engine.transform_mode(), TransformMode::Auto);
}

#[test]
fn auto_fit_scene_returns_to_auto() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    engine.set_transform(Matrix2D::uniform_scale(7.0)).unwrap();
    engine.auto_fit_scene().unwrap();
    assert_eq!(engine.transform_mode(), TransformMode::Auto);
    assert!(approx_eq(engine.view_transform().a, 1.8));
}

// =============================================================
// Coordinate conversion
// =============================================================

#[test]
fn screen_to_field_inverts_fit() {
    let engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    let p = engine.screen_to_field(10.0, 55.0);
    assert!(point_approx_eq(p, Point::new(0.0, 0.0)));
    let q = engine.screen_to_field(190.0, 145.0);
    assert!(point_approx_eq(q, Point::new(100.0, 50.0)));
}

#[test]
fn screen_to_field_is_dpr_independent() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    engine.set_device_pixel_ratio(3.0).unwrap();
    let p = engine.screen_to_field(100.0, 100.0);
    assert!(point_approx_eq(p, Point::new(50.0, 25.0)));
}

#[test]
fn screen_field_round_trip_portrait() {
    let mut engine = engine_with((300.0, 500.0), (100.0, 50.0), Orientation::Portrait);
    engine.set_device_pixel_ratio(2.0).unwrap();
    engine.set_client_origin(40.0, 12.0);
    let field_pt = Point::new(33.0, 17.0);
    let screen = engine.field_to_screen(field_pt);
    let back = engine.screen_to_field(screen.x, screen.y);
    assert!(point_approx_eq(back, field_pt));
}

#[test]
fn client_origin_is_subtracted() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    engine.set_client_origin(100.0, 100.0);
    let p = engine.screen_to_field(110.0, 155.0);
    assert!(point_approx_eq(p, Point::new(0.0, 0.0)));
}

#[test]
fn field_per_px_tracks_scale() {
    let engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    assert!(approx_eq(engine.field_per_px(), 1.0 / 1.8));
}

// =============================================================
// Pointer dispatch
// =============================================================

#[test]
fn dispatch_converts_to_field_space() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    let ctx = engine.dispatch_pointer(raw(PointerKind::Down, 100.0, 100.0));
    assert_eq!(ctx.kind, PointerKind::Down);
    assert!(point_approx_eq(ctx.point, Point::new(50.0, 25.0)));
    assert_eq!(ctx.screen, Point::new(100.0, 100.0));
    assert_eq!(ctx.timestamp_ms, 5);
    assert!(ctx.is_pressed());
    assert!(approx_eq(ctx.px_to_field(1.8), 1.0));
}

#[test]
fn listeners_only_see_their_phase() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    engine.on_pointer(PointerKind::Up, move |ctx| sink.borrow_mut().push(ctx.point));

    engine.dispatch_pointer(raw(PointerKind::Down, 100.0, 100.0));
    engine.dispatch_pointer(raw(PointerKind::Move, 100.0, 100.0));
    engine.dispatch_pointer(raw(PointerKind::Up, 10.0, 55.0));

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert!(point_approx_eq(seen[0], Point::new(0.0, 0.0)));
}

#[test]
fn disposed_listener_is_not_called() {
    let mut engine = RenderEngine::new(RecordingSurface::new());
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    let id = engine.on_pointer(PointerKind::Move, move |_| *sink.borrow_mut() += 1);
    engine.dispatch_pointer(raw(PointerKind::Move, 0.0, 0.0));
    assert!(engine.remove_pointer_listener(id));
    assert!(!engine.remove_pointer_listener(id));
    engine.dispatch_pointer(raw(PointerKind::Move, 0.0, 0.0));
    assert_eq!(*count.borrow(), 1);
}

// =============================================================
// Drawing
// =============================================================

#[test]
fn draw_runs_layers_in_fixed_order() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    let order = Rc::new(RefCell::new(Vec::new()));
    for (layer, name) in [
        (Layer::Overlay, "overlay"),
        (Layer::Background, "background"),
        (Layer::Tokens, "tokens-a"),
        (Layer::Drawings, "drawings"),
        (Layer::Tokens, "tokens-b"),
    ] {
        let sink = Rc::clone(&order);
        engine.register_layer_renderer(layer, move |_, _| {
            sink.borrow_mut().push(name);
            Ok(())
        });
    }
    engine.draw(None);
    assert_eq!(*order.borrow(), vec!["background", "drawings", "tokens-a", "tokens-b", "overlay"]);
}

#[test]
fn draw_clears_then_installs_field_transform() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    let expected = engine.field_to_surface();
    engine.register_layer_renderer(Layer::Drawings, |surface, frame| {
        surface.set_fill_style(frame.layer.as_str());
        Ok(())
    });
    engine.surface_mut().take_ops();
    engine.draw(Some(16.0));
    let ops = engine.surface().ops();
    assert_eq!(ops[0], SurfaceOp::SetTransform(Matrix2D::identity()));
    assert_eq!(ops[1], SurfaceOp::Clear);
    assert_eq!(ops[2], SurfaceOp::Save);
    assert_eq!(ops[3], SurfaceOp::SetTransform(expected));
    assert_eq!(ops[4], SurfaceOp::FillStyle("drawings".into()));
    assert_eq!(ops[5], SurfaceOp::Restore);
}

#[test]
fn renderer_styles_do_not_leak() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    let observed = Rc::new(RefCell::new(None));
    engine.register_layer_renderer(Layer::Drawings, |surface, _| {
        surface.set_stroke_style("#f00");
        surface.set_line_width(9.0);
        Ok(())
    });
    let sink = Rc::clone(&observed);
    engine.register_layer_renderer(Layer::Drawings, move |surface, _| {
        surface.begin_path();
        *sink.borrow_mut() = Some(());
        Ok(())
    });
    engine.draw(None);
    assert!(observed.borrow().is_some());
    assert_eq!(engine.surface().state().stroke_style, "#000");
    assert_eq!(engine.surface().state().line_width, 1.0);
    assert_eq!(engine.surface().depth(), 0);
}

#[test]
fn failing_renderer_does_not_stop_other_layers() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    let ran = Rc::new(RefCell::new(false));
    engine.register_layer_renderer(Layer::Background, |_, _| Err(SurfaceError::Backend("boom".into())));
    let sink = Rc::clone(&ran);
    engine.register_layer_renderer(Layer::Tokens, move |_, _| {
        *sink.borrow_mut() = true;
        Ok(())
    });
    engine.draw(None);
    assert!(*ran.borrow());
    assert_eq!(engine.frames_drawn(), 1);
}

#[test]
fn frame_exposes_scene_and_highlight() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    let selected = ShapeRef::Token(uuid::Uuid::new_v4());
    engine.set_highlight(Highlight { selected: Some(selected), ..Highlight::default() });
    let seen = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&seen);
    engine.register_layer_renderer(Layer::Overlay, move |_, frame| {
        *sink.borrow_mut() = Some((frame.scene.map(|s| s.field.width), frame.highlight.selected));
        Ok(())
    });
    engine.draw(None);
    assert_eq!(*seen.borrow(), Some((Some(100.0), Some(selected))));
}

#[test]
fn unregistered_renderer_stops_running() {
    let mut engine = RenderEngine::new(RecordingSurface::new());
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    let id = engine.register_layer_renderer(Layer::Tokens, move |_, _| {
        *sink.borrow_mut() += 1;
        Ok(())
    });
    engine.draw(None);
    assert!(engine.unregister_layer_renderer(id));
    engine.draw(None);
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn named_registration_rejects_unknown_layer() {
    let mut engine = RenderEngine::new(RecordingSurface::new());
    let err = engine.register_layer_renderer_named("hud", |_, _| Ok(())).unwrap_err();
    assert_eq!(err, EngineError::UnknownLayer("hud".into()));
    assert!(engine.register_layer_renderer_named("overlay", |_, _| Ok(())).is_ok());
}

// =============================================================
// Redraw coalescing
// =============================================================

#[test]
fn schedule_draw_coalesces_within_a_frame() {
    let mut engine = RenderEngine::new(RecordingSurface::new());
    engine.draw(None);
    assert!(engine.schedule_draw());
    assert!(!engine.schedule_draw());
    assert!(!engine.schedule_draw());
    assert!(engine.on_animation_frame(16.0));
    assert_eq!(engine.frames_drawn(), 2);
    assert!(!engine.on_animation_frame(32.0));
    assert_eq!(engine.frames_drawn(), 2);
}

#[test]
fn draw_reflects_latest_scene() {
    let mut engine = engine_with((200.0, 200.0), (100.0, 50.0), Orientation::Landscape);
    let widths = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&widths);
    engine.register_layer_renderer(Layer::Background, move |_, frame| {
        sink.borrow_mut().push(frame.scene.map_or(0.0, |s| s.field.width));
        Ok(())
    });
    engine.set_scene(scene(60.0, 40.0, Orientation::Landscape)).unwrap();
    engine.set_scene(scene(80.0, 40.0, Orientation::Landscape)).unwrap();
    engine.on_animation_frame(16.0);
    assert_eq!(*widths.borrow(), vec![80.0]);
}

#[test]
fn highlight_change_schedules_draw_once() {
    let mut engine = RenderEngine::new(RecordingSurface::new());
    engine.draw(None);
    engine.set_highlight(Highlight::default());
    assert!(!engine.is_draw_pending());
    engine.set_highlight(Highlight { hovered_handle: Some(Handle::End), ..Highlight::default() });
    assert!(engine.is_draw_pending());
}
