use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::state::{Room, SharedRoom};

pub const MAX_ROOM_ID_LEN: usize = 64;

/// Owns every live room. The outer lock only guards the id -> room map;
/// room state is serialized by each room's own lock.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<String, SharedRoom>>>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomStats {
    pub room_id: String,
    pub room_name: String,
    pub users: usize,
    pub capacity: usize,
    pub history_length: usize,
    pub created_at: u64,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub total_rooms: usize,
    pub total_users: usize,
    pub rooms: Vec<RoomStats>,
}

pub fn normalize_room_id(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_ROOM_ID_LEN {
        return None;
    }
    Some(trimmed.to_string())
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the room if it does not exist yet. An existing room keeps its
    /// name and capacity.
    pub async fn ensure_room(
        &self,
        room_id: &str,
        name: &str,
        capacity: usize,
        history_limit: usize,
    ) -> SharedRoom {
        if let Some(room) = self.rooms.read().await.get(room_id).cloned() {
            return room;
        }
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room_id.to_string())
            .or_insert_with(|| {
                info!(room_id, name, capacity, "room created");
                Arc::new(RwLock::new(Room::new(
                    room_id.to_string(),
                    name.to_string(),
                    capacity,
                    history_limit,
                )))
            })
            .clone()
    }

    pub async fn get(&self, room_id: &str) -> Option<SharedRoom> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Tears the room down once its member set is empty. Only removes the
    /// exact instance passed in, so a room recreated under the same id is
    /// left alone.
    pub async fn delete_if_empty(&self, room_id: &str, room: &SharedRoom) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(current) = rooms.get(room_id) else {
            return false;
        };
        if !Arc::ptr_eq(current, room) {
            return false;
        }
        let mut guard = room.write().await;
        if !guard.members.is_empty() {
            return false;
        }
        guard.closed = true;
        drop(guard);
        rooms.remove(room_id);
        info!(room_id, "room deleted");
        true
    }

    /// Drops a stale map entry pointing at a room that was already closed.
    pub async fn forget_closed(&self, room_id: &str, room: &SharedRoom) {
        let mut rooms = self.rooms.write().await;
        if let Some(current) = rooms.get(room_id) {
            if Arc::ptr_eq(current, room) {
                rooms.remove(room_id);
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn stats(&self) -> RegistryStats {
        let rooms = self
            .rooms
            .read()
            .await
            .values()
            .cloned()
            .collect::<Vec<_>>();
        let mut stats = Vec::with_capacity(rooms.len());
        for room in rooms {
            let room = room.read().await;
            stats.push(RoomStats {
                room_id: room.id.clone(),
                room_name: room.name.clone(),
                users: room.members.len(),
                capacity: room.capacity,
                history_length: room.history.len(),
                created_at: room.created_at,
            });
        }
        stats.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.room_id.cmp(&b.room_id))
        });
        RegistryStats {
            total_rooms: stats.len(),
            total_users: stats.iter().map(|room| room.users).sum(),
            rooms: stats,
        }
    }
}

#[cfg(test)]
#[path = "rooms_test.rs"]
mod tests;
