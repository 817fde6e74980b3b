#![allow(clippy::float_cmp)]

use std::io::Cursor;

use stickyboard::doc::{Note, NoteBoard, NoteColor};
use stickyboard::engine::EngineCore;
use stickyboard::geometry::Size;

use super::*;

struct NoSync;

impl RemoteSync for NoSync {
    fn request_save(&self, _notes: &[Note]) {}
}

fn surface_with(notes: Vec<Note>) -> Surface<FixedLayout, NoteBoard, NoSync> {
    let mut board = NoteBoard::new();
    board.load_snapshot(notes);
    let layout = FixedLayout::new(Rect::new(0.0, 0.0, 500.0, 500.0), Some(Rect::new(452.0, 452.0, 48.0, 48.0)));
    Surface::new(layout, EngineCore::new(board, NoSync))
}

fn note(id: &str) -> Note {
    Note {
        id: id.to_owned(),
        color: NoteColor::Green,
        text: String::new(),
        position: Point::new(100.0, 100.0),
        size: Size::new(160.0, 200.0),
        is_editing: false,
    }
}

fn run(surface: &mut Surface<FixedLayout, NoteBoard, NoSync>, script: &str) -> Vec<Action> {
    let events = parse_script(Cursor::new(script)).unwrap();
    events.into_iter().flat_map(|e| apply(surface, e).unwrap()).collect()
}

// =============================================================
// Parsing
// =============================================================

#[test]
fn parse_skips_blank_and_comment_lines() {
    let script = "# drag a\n\n{\"type\": \"pointer_up\"}\n   \n{\"type\": \"toggle_placing\"}\n";
    let events = parse_script(Cursor::new(script)).unwrap();
    assert_eq!(events, vec![ReplayEvent::PointerUp, ReplayEvent::TogglePlacing]);
}

#[test]
fn parse_reports_failing_line_number() {
    let script = "{\"type\": \"pointer_up\"}\n{\"type\": \"warp\"}\n";
    let err = parse_script(Cursor::new(script)).unwrap_err();
    assert!(matches!(err, ReplayError::Json { line: 2, .. }), "{err}");
}

#[test]
fn pointer_down_target_defaults_to_surface() {
    let events = parse_script(Cursor::new("{\"type\": \"pointer_down\", \"x\": 1, \"y\": 2}")).unwrap();
    assert_eq!(events, vec![ReplayEvent::PointerDown { x: 1.0, y: 2.0, target: TargetSpec::Surface }]);
}

#[test]
fn handle_target_defaults_to_bottom_right() {
    let line = "{\"type\": \"pointer_down\", \"x\": 0, \"y\": 0, \"target\": {\"kind\": \"handle\", \"id\": \"a\"}}";
    let events = parse_script(Cursor::new(line)).unwrap();
    let ReplayEvent::PointerDown { target, .. } = events[0].clone() else {
        panic!("expected pointer_down");
    };
    assert_eq!(
        target.resolve().unwrap(),
        PointerTarget::ResizeHandle { id: "a".into(), handle: ResizeHandle::BottomRight }
    );
}

#[test]
fn unknown_handle_is_an_error() {
    let spec = TargetSpec::Handle { id: "a".into(), handle: "north".into() };
    assert!(matches!(spec.resolve(), Err(ReplayError::UnknownHandle(h)) if h == "north"));
}

#[test]
fn parse_rect_forms() {
    assert_eq!(parse_rect("800x600").unwrap(), Rect::new(0.0, 0.0, 800.0, 600.0));
    assert_eq!(parse_rect("10, 20, 48, 48").unwrap(), Rect::new(10.0, 20.0, 48.0, 48.0));
    assert!(parse_rect("800").is_err());
    assert!(parse_rect("1,2").is_err());
    assert!(parse_rect("wide x tall").is_err());
}

// =============================================================
// Replay
// =============================================================

#[test]
fn scripted_drag_is_clamped() {
    let mut surface = surface_with(vec![note("a")]);
    run(
        &mut surface,
        r#"
{"type": "pointer_down", "x": 150, "y": 150, "target": {"kind": "body", "id": "a"}}
{"type": "pointer_move", "x": 600, "y": 150}
{"type": "pointer_up"}
"#,
    );
    assert_eq!(surface.core.note("a").map(|n| n.position), Some(Point::new(340.0, 100.0)));
}

#[test]
fn scripted_drop_on_trash_deletes() {
    let mut surface = surface_with(vec![note("a")]);
    let actions = run(
        &mut surface,
        r#"
{"type": "pointer_down", "x": 100, "y": 100, "target": {"kind": "body", "id": "a"}}
{"type": "pointer_move", "x": 340, "y": 300}
{"type": "pointer_up"}
"#,
    );
    assert!(actions.contains(&Action::Dropped { id: "a".into(), deleted: true }));
    assert!(surface.core.note("a").is_none());
}

#[test]
fn scripted_escape_cancels_drop() {
    let mut surface = surface_with(vec![note("a")]);
    run(
        &mut surface,
        r#"
{"type": "pointer_down", "x": 100, "y": 100, "target": {"kind": "body", "id": "a"}}
{"type": "pointer_move", "x": 340, "y": 300}
{"type": "key_down", "key": "Escape"}
{"type": "pointer_up"}
"#,
    );
    assert!(surface.core.note("a").is_some());
}

#[test]
fn scripted_placement_and_layout_changes() {
    let mut surface = surface_with(vec![]);
    run(
        &mut surface,
        r#"
{"type": "set_surface", "rect": {"x": 50, "y": 50, "width": 500, "height": 500}}
{"type": "set_trash", "rect": null}
{"type": "toggle_placing"}
{"type": "click", "x": 60, "y": 70}
"#,
    );
    assert_eq!(surface.layout().drop_target, None);
    assert!(!surface.core.placing);
    let placed: Vec<_> = surface.core.store.notes().iter().map(|n| n.position).collect();
    assert_eq!(placed, vec![Point::new(10.0, 20.0)]);
}
