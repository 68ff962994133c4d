use crate::state::test_helpers::{event, test_room, user_ids};
use crate::state::Room;

fn stamps(room: &Room) -> Vec<u64> {
    room.snapshot().iter().map(|e| e.timestamp).collect()
}

#[test]
fn undo_on_empty_history_is_noop() {
    let mut room = test_room(2);
    assert_eq!(room.undo("a"), None);
    assert!(room.redo_stacks.is_empty());
}

#[test]
fn undo_without_own_events_is_noop() {
    let mut room = test_room(2);
    room.append(event("b", Some("g"), 1));
    assert_eq!(room.undo("a"), None);
    assert_eq!(stamps(&room), vec![1]);
}

#[test]
fn redo_on_empty_stack_is_noop() {
    let mut room = test_room(2);
    room.append(event("a", None, 1));
    assert_eq!(room.redo("a"), None);
    assert_eq!(stamps(&room), vec![1]);
}

#[test]
fn interleaved_gesture_is_undone_and_redone_as_one_group() {
    let mut room = test_room(2);
    room.append(event("a", Some("g"), 1));
    room.append(event("a", Some("g"), 2));
    room.append(event("b", Some("h"), 3));
    room.append(event("a", Some("g"), 4));
    assert_eq!(room.snapshot().len(), 4);

    assert_eq!(room.undo("a"), Some(3));
    assert_eq!(user_ids(&room.snapshot()), vec!["b"]);

    assert_eq!(room.redo("a"), Some(3));
    assert_eq!(user_ids(&room.snapshot()), vec!["b", "a", "a", "a"]);
    assert_eq!(stamps(&room), vec![3, 1, 2, 4]);
}

#[test]
fn grouped_undo_leaves_older_gestures_and_other_authors() {
    let mut room = test_room(2);
    room.append(event("a", Some("old"), 1));
    room.append(event("b", Some("new"), 2));
    room.append(event("a", Some("new"), 3));
    room.append(event("a", Some("new"), 4));

    assert_eq!(room.undo("a"), Some(2));
    assert_eq!(stamps(&room), vec![1, 2]);
}

#[test]
fn ungrouped_undo_removes_one_event_in_place() {
    let mut room = test_room(2);
    room.append(event("a", None, 1));
    room.append(event("a", None, 2));
    room.append(event("b", None, 3));

    assert_eq!(room.undo("a"), Some(1));
    assert_eq!(stamps(&room), vec![1, 3]);
    let stack = room.redo_stacks.get("a").expect("redo stack");
    assert_eq!(stack.len(), 1);
    assert_eq!(stack[0].events[0].timestamp, 2);
}

#[test]
fn redo_is_last_undone_first_restored() {
    let mut room = test_room(2);
    room.append(event("a", Some("g1"), 1));
    room.append(event("a", Some("g2"), 2));

    room.undo("a");
    room.undo("a");
    assert!(room.snapshot().is_empty());

    assert_eq!(room.redo("a"), Some(1));
    assert_eq!(stamps(&room), vec![1]);
    assert_eq!(room.redo("a"), Some(1));
    assert_eq!(stamps(&room), vec![1, 2]);
    assert_eq!(room.redo("a"), None);
    assert!(!room.redo_stacks.contains_key("a"));
}

#[test]
fn redo_lands_after_work_drawn_in_between() {
    let mut room = test_room(2);
    room.append(event("a", Some("g"), 1));
    room.undo("a");
    room.append(event("b", None, 2));

    room.redo("a");
    assert_eq!(stamps(&room), vec![2, 1]);
}

#[test]
fn new_drawing_invalidates_redo() {
    let mut room = test_room(2);
    room.append(event("a", Some("g"), 1));
    room.undo("a");
    room.append(event("a", Some("k"), 2));

    assert_eq!(room.redo("a"), None);
    assert_eq!(stamps(&room), vec![2]);
}

#[test]
fn other_users_drawing_keeps_redo() {
    let mut room = test_room(2);
    room.append(event("a", Some("g"), 1));
    room.undo("a");
    room.append(event("b", Some("g"), 2));

    assert_eq!(room.redo("a"), Some(1));
}

#[test]
fn same_stroke_id_from_another_user_is_not_removed() {
    let mut room = test_room(2);
    room.append(event("a", Some("shared"), 1));
    room.append(event("b", Some("shared"), 2));

    assert_eq!(room.undo("a"), Some(1));
    assert_eq!(user_ids(&room.snapshot()), vec!["b"]);
}

#[test]
fn undo_and_redo_after_clear_are_noops() {
    let mut room = test_room(2);
    room.append(event("a", Some("g"), 1));
    room.append(event("a", Some("k"), 2));
    room.undo("a");

    room.clear();

    assert_eq!(room.undo("a"), None);
    assert_eq!(room.redo("a"), None);
    assert!(room.snapshot().is_empty());
}

#[test]
fn partially_evicted_group_undoes_the_survivors() {
    let mut room = Room::new("r".into(), "R".into(), 2, 3);
    room.append(event("a", Some("g"), 1));
    room.append(event("a", Some("g"), 2));
    room.append(event("b", None, 3));
    room.append(event("a", Some("g"), 4));
    assert_eq!(stamps(&room), vec![2, 3, 4]);

    assert_eq!(room.undo("a"), Some(2));
    assert_eq!(stamps(&room), vec![3]);
    assert_eq!(room.redo("a"), Some(2));
    assert_eq!(stamps(&room), vec![3, 2, 4]);
}

#[test]
fn redo_respects_the_history_bound() {
    let mut room = Room::new("r".into(), "R".into(), 2, 3);
    room.append(event("a", Some("g"), 1));
    room.append(event("a", Some("g"), 2));
    room.undo("a");
    room.append(event("b", None, 3));
    room.append(event("b", None, 4));

    room.redo("a");
    assert_eq!(stamps(&room), vec![4, 1, 2]);
}
