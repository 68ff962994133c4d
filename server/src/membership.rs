use inkroom_shared::{MemberInfo, ServerMessage};
use tracing::info;

use crate::broadcast::{deliver, Outcome};
use crate::error::RoomError;
use crate::state::{AppState, Member, PeerSender, Room, SharedRoom};

/// A sanitized join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    pub room_id: String,
    pub room_name: String,
    pub user_name: String,
    pub user_color: String,
    pub capacity: usize,
    pub is_host: bool,
}

/// Adds the connection to a room. Only a host may create the room. The
/// joiner gets the member list and the history snapshot; everyone else
/// gets a `user-joined` notice.
pub async fn join(
    state: &AppState,
    connection_id: &str,
    request: &JoinRequest,
    tx: PeerSender,
) -> Result<SharedRoom, RoomError> {
    loop {
        let room = if request.is_host {
            state
                .rooms
                .ensure_room(
                    &request.room_id,
                    &request.room_name,
                    request.capacity,
                    state.limits.history_limit,
                )
                .await
        } else {
            state
                .rooms
                .get(&request.room_id)
                .await
                .ok_or(RoomError::RoomNotFound)?
        };

        let mut guard = room.write().await;
        if guard.closed {
            // Lost a race with the last member leaving; resolve the id again.
            drop(guard);
            state.rooms.forget_closed(&request.room_id, &room).await;
            continue;
        }
        if guard.is_full() {
            info!(
                room_id = %request.room_id,
                conn = connection_id,
                capacity = guard.capacity,
                "join rejected, room full"
            );
            return Err(RoomError::RoomFull);
        }

        let info = MemberInfo {
            id: connection_id.to_string(),
            name: request.user_name.clone(),
            color: request.user_color.clone(),
            x: 0.0,
            y: 0.0,
        };
        let seq = guard.next_seq;
        guard.next_seq += 1;
        guard.members.insert(
            connection_id.to_string(),
            Member {
                info: info.clone(),
                seq,
            },
        );
        guard.peers.insert(connection_id.to_string(), tx);

        let users = guard.member_list();
        let outcomes = vec![
            Outcome::Reply(ServerMessage::UsersList {
                user_id: connection_id.to_string(),
                users: users.clone(),
            }),
            Outcome::Others(ServerMessage::UserJoined { user: info, users }),
            Outcome::Reply(ServerMessage::DrawingHistory {
                history: guard.snapshot(),
            }),
        ];
        deliver(&mut guard, connection_id, outcomes);
        info!(
            room_id = %guard.id,
            conn = connection_id,
            members = guard.members.len(),
            capacity = guard.capacity,
            "member joined"
        );
        drop(guard);
        return Ok(room);
    }
}

/// Removes the connection, tells the remaining members, and tears the room
/// down if it is now empty. Returns `false` if the connection was not a
/// member.
pub async fn leave(state: &AppState, room: &SharedRoom, connection_id: &str) -> bool {
    let room_id = {
        let mut guard = room.write().await;
        if guard.members.remove(connection_id).is_none() {
            return false;
        }
        guard.peers.remove(connection_id);
        guard.redo_stacks.remove(connection_id);

        let users = guard.member_list();
        let notice = ServerMessage::UserLeft {
            user_id: connection_id.to_string(),
            users,
        };
        deliver(&mut guard, connection_id, vec![Outcome::Others(notice)]);
        info!(
            room_id = %guard.id,
            conn = connection_id,
            members = guard.members.len(),
            "member left"
        );
        guard.id.clone()
    };
    state.rooms.delete_if_empty(&room_id, room).await;
    true
}

/// Records the member's pointer position. Cursor positions never enter the
/// history log.
pub fn update_cursor(room: &mut Room, connection_id: &str, x: f32, y: f32) -> Option<MemberInfo> {
    let member = room.members.get_mut(connection_id)?;
    member.info.x = x;
    member.info.y = y;
    Some(member.info.clone())
}

#[cfg(test)]
#[path = "membership_test.rs"]
mod tests;
