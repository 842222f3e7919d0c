use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::geometry::Point;
use crate::scene::{Drawing, FieldSize, Orientation};
use crate::surface::{RecordingSurface, SurfaceOp};
use crate::tools::ToolEventData;

// =============================================================
// Helpers
// =============================================================

fn approx_eq(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
}

/// 100×50 field in a 1020×520 viewport: scale 10, offset 10 px.
fn board_with(scene: Scene) -> Board<RecordingSurface> {
    let viewport = Viewport { width: 1020.0, height: 520.0 };
    Board::new(RecordingSurface::new(), viewport, scene, &BoardConfig::default()).unwrap()
}

fn field() -> Scene {
    Scene::new(FieldSize { width: 100.0, height: 50.0 }, Orientation::Landscape)
}

fn raw(kind: PointerKind, x: f64, y: f64, buttons: u16) -> RawPointerEvent {
    raw_on(1, kind, x, y, buttons)
}

fn raw_on(pointer_id: i32, kind: PointerKind, x: f64, y: f64, buttons: u16) -> RawPointerEvent {
    RawPointerEvent {
        kind,
        pointer_id,
        client_x: 10.0 + x * 10.0,
        client_y: 10.0 + y * 10.0,
        buttons,
        timestamp: 0.0,
    }
}

fn gesture(board: &mut Board<RecordingSurface>, path: &[(f64, f64)]) {
    let Some((&(x0, y0), rest)) = path.split_first() else { return };
    board.pointer(raw(PointerKind::Down, x0, y0, 1));
    let mut last = (x0, y0);
    for &(x, y) in rest {
        board.pointer(raw(PointerKind::Move, x, y, 1));
        last = (x, y);
    }
    board.pointer(raw(PointerKind::Up, last.0, last.1, 0));
}

fn token_at(board: &Board<RecordingSurface>, id: ShapeId) -> Point {
    board.scene().token(id).map(Token::position).unwrap()
}

// =============================================================
// Gestures and history
// =============================================================

#[test]
fn pointer_maps_client_to_field() {
    let mut board = board_with(field());
    let ctx = board.pointer(raw(PointerKind::Move, 30.0, 20.0, 0));
    assert!(approx_eq(ctx.point, Point::new(30.0, 20.0)));
    assert!((ctx.field_per_px - 0.1).abs() < 1e-12);
}

#[test]
fn drag_then_undo_redo_restores_exact_positions() {
    let mut scene = field();
    let id = scene.add_token(Token::new("home", 10.0, 10.0));
    let mut board = board_with(scene);

    gesture(&mut board, &[(10.0, 10.0), (14.0, 16.0), (20.0, 25.0)]);
    assert!(approx_eq(token_at(&board, id), Point::new(20.0, 25.0)));

    assert!(board.undo());
    assert_eq!(token_at(&board, id), Point::new(10.0, 10.0));
    assert!(!board.can_undo());

    assert!(board.redo());
    assert!(approx_eq(token_at(&board, id), Point::new(20.0, 25.0)));
    assert!(!board.can_redo());
}

#[test]
fn hover_and_clicks_do_not_create_history() {
    let mut scene = field();
    scene.add_token(Token::new("home", 10.0, 10.0));
    let mut board = board_with(scene);
    board.pointer(raw(PointerKind::Move, 10.0, 10.0, 0));
    gesture(&mut board, &[(10.0, 10.0)]);
    gesture(&mut board, &[(60.0, 40.0)]);
    assert!(!board.can_undo());
}

#[test]
fn cancel_leaves_scene_as_before_gesture() {
    let mut board = board_with(field());
    board.set_tool(ToolId::Pen);
    board.pointer(raw(PointerKind::Down, 5.0, 5.0, 1));
    board.pointer(raw(PointerKind::Move, 9.0, 9.0, 1));
    board.pointer(raw(PointerKind::Cancel, 9.0, 9.0, 0));
    assert!(board.scene().drawings.is_empty());
    assert!(!board.can_undo());
}

#[test]
fn overlapping_pointers_share_one_undo_entry() {
    let mut board = board_with(field());
    board.set_tool(ToolId::Pen);
    board.pointer(raw_on(1, PointerKind::Down, 5.0, 5.0, 1));
    board.pointer(raw_on(2, PointerKind::Down, 50.0, 30.0, 1));
    board.pointer(raw_on(1, PointerKind::Up, 5.0, 5.0, 0));
    for step in 1..=10 {
        board.pointer(raw_on(2, PointerKind::Move, 50.0 + f64::from(step), 30.0, 1));
    }
    board.pointer(raw_on(2, PointerKind::Up, 60.0, 30.0, 0));
    assert_eq!(board.scene().drawings.len(), 2);

    assert!(board.undo());
    assert!(board.scene().drawings.is_empty());
    assert!(!board.can_undo());
}

#[test]
fn cancel_on_one_pointer_keeps_the_other_gesture() {
    let mut board = board_with(field());
    board.set_tool(ToolId::Line);
    board.pointer(raw_on(1, PointerKind::Down, 5.0, 5.0, 1));
    board.pointer(raw_on(2, PointerKind::Down, 50.0, 30.0, 1));
    board.pointer(raw_on(2, PointerKind::Move, 70.0, 30.0, 1));
    board.pointer(raw_on(1, PointerKind::Cancel, 5.0, 5.0, 0));
    assert_eq!(board.scene().drawings.len(), 1);

    board.pointer(raw_on(2, PointerKind::Up, 70.0, 30.0, 0));
    let [Drawing::Line(line)] = board.scene().drawings.as_slice() else { panic!("expected one line") };
    assert!(approx_eq(line.points[0], Point::new(50.0, 30.0)));
    assert!(approx_eq(line.points[1], Point::new(70.0, 30.0)));

    assert!(board.undo());
    assert!(board.scene().drawings.is_empty());
    assert!(!board.can_undo());
}

#[test]
fn select_hits_tokens_at_style_radius() {
    let mut scene = field();
    let id = scene.add_token(Token::new("home", 10.0, 10.0));
    let mut config = BoardConfig::default();
    config.style.token_radius = 4.0;
    let viewport = Viewport { width: 1020.0, height: 520.0 };
    let mut board = Board::new(RecordingSurface::new(), viewport, scene, &config).unwrap();

    board.pointer(raw(PointerKind::Down, 13.5, 10.0, 1));
    assert_eq!(board.selection(), Some(ShapeRef::Token(id)));
}

#[test]
fn created_shape_is_one_undo_step() {
    let mut board = board_with(field());
    board.set_tool(ToolId::Line);
    gesture(&mut board, &[(5.0, 5.0), (8.0, 5.0), (12.0, 5.0)]);
    assert_eq!(board.scene().drawings.len(), 1);
    assert!(board.undo());
    assert!(board.scene().drawings.is_empty());
    assert_eq!(board.selection(), None);
    assert!(!board.can_undo());
}

#[test]
fn tool_events_are_collected() {
    let mut board = board_with(field());
    board.activate_tool("cone").unwrap();
    gesture(&mut board, &[(20.0, 20.0), (23.0, 20.0)]);
    let events = board.take_events();
    assert!(events.iter().any(|e| matches!(e.data, ToolEventData::ShapeCommitted { .. })));
    assert!(board.take_events().is_empty());
    assert!(matches!(board.activate_tool("lasso"), Err(BoardError::Tool(_))));
}

// =============================================================
// Direct edits
// =============================================================

#[test]
fn spawn_and_delete_are_undoable() {
    let mut board = board_with(field());
    let id = board.spawn_token(Token::new("away", 50.0, 25.0), 100).unwrap();
    assert!(board.scene().token(id).is_some());
    assert!(board.delete_shape(id, 200));
    assert!(board.scene().token(id).is_none());
    assert!(!board.delete_shape(id, 300));

    assert!(board.undo());
    assert!(board.scene().token(id).is_some());
    assert!(board.undo());
    assert!(board.scene().tokens.is_empty());
}

#[test]
fn spawn_rejects_duplicate_id() {
    let mut board = board_with(field());
    let token = Token::new("home", 1.0, 1.0);
    board.spawn_token(token.clone(), 1).unwrap();
    let err = board.spawn_token(token, 2).unwrap_err();
    assert!(matches!(err, BoardError::Scene(SceneError::DuplicateId(_))));
    assert_eq!(board.scene().tokens.len(), 1);
    assert!(board.scene().validate().is_ok());
    assert!(board.undo());
    assert!(!board.can_undo());
}

#[test]
fn load_scene_resets_history_and_rejects_duplicates() {
    let mut board = board_with(field());
    board.spawn_token(Token::new("home", 1.0, 1.0), 1).unwrap();

    let mut next = field();
    next.add_token(Token::new("away", 2.0, 2.0));
    board.load_scene(next.clone()).unwrap();
    assert_eq!(board.scene().tokens.len(), 1);
    assert!(!board.can_undo());

    next.tokens.push(next.tokens[0].clone());
    assert!(matches!(board.load_scene(next), Err(BoardError::Scene(SceneError::DuplicateId(_)))));
}

// =============================================================
// Rendering / export
// =============================================================

#[test]
fn pointer_schedules_one_coalesced_frame() {
    let mut board = board_with(field());
    board.on_animation_frame(0.0);
    board.set_tool(ToolId::Pen);
    gesture(&mut board, &[(5.0, 5.0), (8.0, 8.0), (11.0, 11.0)]);
    assert!(board.engine().is_draw_pending());
    let before = board.engine().frames_drawn();
    assert!(board.on_animation_frame(16.0));
    assert!(!board.on_animation_frame(32.0));
    assert_eq!(board.engine().frames_drawn(), before + 1);
    assert!(board.engine().surface().ops().iter().any(|op| matches!(op, SurfaceOp::Stroke)));
}

struct CountingExporter {
    seen: Rc<RefCell<Vec<usize>>>,
}

impl SceneExporter for CountingExporter {
    type Output = String;

    fn export(&self, mut scene: Scene, style: &RenderStyle) -> Result<String, ExportError> {
        self.seen.borrow_mut().push(scene.tokens.len());
        scene.tokens.clear();
        Ok(format!("{} {}", scene.field.width, style.pitch_fill))
    }
}

#[test]
fn export_receives_detached_copy() {
    let mut board = board_with(field());
    board.spawn_token(Token::new("home", 1.0, 1.0), 1).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let out = board.export(&CountingExporter { seen: Rc::clone(&seen) }).unwrap();
    assert_eq!(out, format!("100 {}", RenderStyle::default().pitch_fill));
    assert_eq!(*seen.borrow(), vec![1]);
    assert_eq!(board.scene().tokens.len(), 1);
}
