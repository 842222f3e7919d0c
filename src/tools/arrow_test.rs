use super::*;
use crate::tools::ToolEventData;
use crate::tools::test_support::Harness;

#[test]
fn drag_creates_arrow() {
    let mut h = Harness::empty(ToolId::Arrow);
    h.down(2.0, 2.0);
    h.drag(12.0, 7.0);
    h.up(12.0, 7.0);
    match h.scene().drawings.as_slice() {
        [Drawing::Arrow(arrow)] => {
            assert_eq!(arrow.from, Point::new(2.0, 2.0));
            assert_eq!(arrow.to, Point::new(12.0, 7.0));
        }
        other => panic!("expected one arrow, got {other:?}"),
    }
}

#[test]
fn zero_length_arrow_is_discarded() {
    let mut h = Harness::empty(ToolId::Arrow);
    h.down(2.0, 2.0);
    h.drag(2.0, 2.0);
    h.up(2.0, 2.0);
    assert!(h.scene().drawings.is_empty());
    assert!(h
        .take_events()
        .iter()
        .any(|e| matches!(e, ToolEventData::ShapeDiscarded { kind: DrawingKind::Arrow, .. })));
}

#[test]
fn tail_handle_edit_keeps_head() {
    let mut h = Harness::empty(ToolId::Arrow);
    h.down(0.0, 0.0);
    h.drag(10.0, 0.0);
    h.up(10.0, 0.0);
    h.down(0.0, 0.0);
    h.drag(0.0, 5.0);
    h.up(0.0, 5.0);
    match h.scene().drawings.as_slice() {
        [Drawing::Arrow(arrow)] => {
            assert_eq!(arrow.from, Point::new(0.0, 5.0));
            assert_eq!(arrow.to, Point::new(10.0, 0.0));
        }
        other => panic!("expected one arrow, got {other:?}"),
    }
}

#[test]
fn settings_report_stroke() {
    let mut spec = ArrowSpec::default();
    spec.configure(&ToolSettings { stroke: Some("red".into()), ..ToolSettings::default() });
    assert_eq!(spec.settings().stroke.as_deref(), Some("red"));
}
