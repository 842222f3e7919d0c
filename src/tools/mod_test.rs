use std::sync::Arc;

use super::*;
use crate::scene::{FieldSize, Orientation, Token};
use crate::tools::test_support::Harness;

fn field() -> Scene {
    Scene::new(FieldSize { width: 100.0, height: 50.0 }, Orientation::Landscape)
}

#[test]
fn tool_ids_round_trip_through_names() {
    for id in ToolId::ALL {
        assert_eq!(id.as_str().parse::<ToolId>(), Ok(id));
        assert_eq!(id.to_string(), id.as_str());
    }
    assert_eq!("lasso".parse::<ToolId>(), Err(ToolError::UnknownTool("lasso".into())));
}

#[test]
fn registry_lists_builtin_tools_with_select_active() {
    let registry = ToolRegistry::new(Arc::new(field()));
    assert_eq!(registry.list_tools(), ToolId::ALL.to_vec());
    assert_eq!(registry.active_tool(), ToolId::Select);
}

#[test]
fn activate_by_name() {
    let mut registry = ToolRegistry::new(Arc::new(field()));
    registry.activate("pen").unwrap();
    assert_eq!(registry.active_tool(), ToolId::Pen);
    assert!(registry.activate("spray").is_err());
    assert_eq!(registry.active_tool(), ToolId::Pen);
}

#[test]
fn configure_by_name_is_reflected_in_settings() {
    let mut registry = ToolRegistry::new(Arc::new(field()));
    let settings = ToolSettings { radius: Some(3.0), ..ToolSettings::default() };
    registry.configure_tool_named("eraser", &settings).unwrap();
    assert_eq!(registry.tool_settings(ToolId::Eraser).and_then(|s| s.radius), Some(3.0));
    assert!(registry.configure_tool_named("nope", &settings).is_err());
}

#[test]
fn settings_merge_overlays_set_fields() {
    let base = ToolSettings { stroke: Some("#fff".into()), width: Some(1.0), ..ToolSettings::default() };
    let patch = ToolSettings { width: Some(2.0), radius: Some(4.0), ..ToolSettings::default() };
    let merged = base.merged(&patch);
    assert_eq!(merged.stroke.as_deref(), Some("#fff"));
    assert_eq!(merged.width, Some(2.0));
    assert_eq!(merged.radius, Some(4.0));
}

#[test]
fn external_update_clears_stale_selection() {
    let mut scene = field();
    let id = scene.add_token(Token::new("home", 10.0, 10.0));
    let mut registry = ToolRegistry::new(Arc::new(scene));
    registry.set_selection(Some(ShapeRef::Token(id)));
    assert_eq!(registry.selection(), Some(ShapeRef::Token(id)));

    registry.update_scene(Arc::new(field()));
    assert_eq!(registry.selection(), None);
}

#[test]
fn selecting_missing_shape_is_ignored() {
    let mut registry = ToolRegistry::new(Arc::new(field()));
    registry.set_selection(Some(ShapeRef::Token(uuid::Uuid::new_v4())));
    assert_eq!(registry.selection(), None);
}

#[test]
fn tool_mutations_commit_through_host_with_fresh_timestamp() {
    let mut h = Harness::empty(ToolId::Line);
    let before = h.scene().last_updated_at;
    h.down(1.0, 1.0);
    h.drag(5.0, 1.0);
    h.up(5.0, 1.0);
    assert_eq!(h.host.commits, 2);
    assert!(h.scene().last_updated_at > before);
    assert!(h.host.events.iter().all(|event| event.tool_id == ToolId::Line));
}

#[test]
fn switching_tools_drops_in_flight_sessions() {
    let mut h = Harness::empty(ToolId::Line);
    h.down(1.0, 1.0);
    h.registry.set_active_tool(ToolId::Select);
    h.registry.set_active_tool(ToolId::Line);
    h.drag(8.0, 1.0);
    // The orphaned line keeps its start point only.
    match h.scene().drawings.as_slice() {
        [crate::scene::Drawing::Line(line)] => assert_eq!(line.points[1], crate::geometry::Point::new(1.0, 1.0)),
        other => panic!("unexpected drawings {other:?}"),
    }
}

#[test]
fn highlight_reports_selection() {
    let mut h = Harness::empty(ToolId::Cone);
    h.down(10.0, 10.0);
    h.drag(12.0, 10.0);
    h.up(12.0, 10.0);
    let id = h.scene().drawings[0].id();
    let highlight = h.registry.highlight();
    assert_eq!(highlight.selected, Some(ShapeRef::Drawing(id)));
    assert_eq!(highlight.hovered, None);
}
