use super::*;
use crate::state::test_helpers;

#[tokio::test]
async fn ensure_room_creates_once() {
    let registry = RoomRegistry::new();
    let first = registry.ensure_room("r1", "First", 4, 1000).await;
    let second = registry.ensure_room("r1", "Second", 9, 1000).await;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len().await, 1);

    let room = second.read().await;
    assert_eq!(room.name, "First");
    assert_eq!(room.capacity, 4);
}

#[tokio::test]
async fn get_unknown_room_is_none() {
    let registry = RoomRegistry::new();
    assert!(registry.get("missing").await.is_none());
    registry.ensure_room("r1", "Room", 2, 1000).await;
    assert!(registry.get("r1").await.is_some());
}

#[tokio::test]
async fn delete_if_empty_keeps_occupied_room() {
    let registry = RoomRegistry::new();
    let room = registry.ensure_room("r1", "Room", 2, 1000).await;
    let _rx = test_helpers::attach(&mut *room.write().await, "a", "A");

    assert!(!registry.delete_if_empty("r1", &room).await);
    assert!(registry.get("r1").await.is_some());
    assert!(!room.read().await.closed);
}

#[tokio::test]
async fn delete_if_empty_removes_and_closes_empty_room() {
    let registry = RoomRegistry::new();
    let room = registry.ensure_room("r1", "Room", 2, 1000).await;

    assert!(registry.delete_if_empty("r1", &room).await);
    assert!(registry.get("r1").await.is_none());
    assert!(room.read().await.closed);
}

#[tokio::test]
async fn delete_if_empty_ignores_recreated_room() {
    let registry = RoomRegistry::new();
    let old = registry.ensure_room("r1", "Old", 2, 1000).await;
    assert!(registry.delete_if_empty("r1", &old).await);
    let new = registry.ensure_room("r1", "New", 2, 1000).await;

    assert!(!registry.delete_if_empty("r1", &old).await);
    let current = registry.get("r1").await.expect("recreated room should stay");
    assert!(Arc::ptr_eq(&current, &new));
}

#[tokio::test]
async fn stats_count_rooms_and_members() {
    let registry = RoomRegistry::new();
    let a = registry.ensure_room("a", "Alpha", 3, 1000).await;
    registry.ensure_room("b", "Beta", 5, 1000).await;
    {
        let mut room = a.write().await;
        let _x = test_helpers::attach(&mut room, "x", "X");
        let _y = test_helpers::attach(&mut room, "y", "Y");
        room.history.push_back(test_helpers::event("x", None, 1));
    }

    let stats = registry.stats().await;
    assert_eq!(stats.total_rooms, 2);
    assert_eq!(stats.total_users, 2);
    let alpha = stats
        .rooms
        .iter()
        .find(|room| room.room_id == "a")
        .expect("alpha listed");
    assert_eq!(alpha.room_name, "Alpha");
    assert_eq!(alpha.users, 2);
    assert_eq!(alpha.capacity, 3);
    assert_eq!(alpha.history_length, 1);
}

#[test]
fn normalize_room_id_trims_and_bounds() {
    assert_eq!(normalize_room_id("  abc "), Some("abc".into()));
    assert_eq!(normalize_room_id("   "), None);
    assert_eq!(normalize_room_id(&"x".repeat(MAX_ROOM_ID_LEN)).map(|id| id.len()), Some(MAX_ROOM_ID_LEN));
    assert_eq!(normalize_room_id(&"x".repeat(MAX_ROOM_ID_LEN + 1)), None);
}
