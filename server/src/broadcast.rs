//! Reconciliation broadcaster.
//!
//! Handlers never send directly; they return `Outcome`s and `deliver` routes
//! them while the caller still holds the room's write lock. Enqueueing is a
//! non-blocking `try_send` onto each member's bounded queue, so delivery order
//! matches mutation order and a slow member never holds up the room. A full
//! queue drops the message for that member only; a closed queue drops the
//! member from the delivery set.

use inkroom_shared::ServerMessage;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::state::{PeerSender, Room};

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Every member, sender included.
    Everyone(ServerMessage),
    /// Every member except the sender.
    Others(ServerMessage),
    /// The sender only.
    Reply(ServerMessage),
}

/// The whole current log for every member. Used after clear, undo and redo,
/// which can remove or reorder entries.
pub fn full_resync(room: &Room) -> Outcome {
    Outcome::Everyone(ServerMessage::FullHistoryUpdate {
        history: room.snapshot(),
    })
}

pub fn deliver(room: &mut Room, sender: &str, outcomes: Vec<Outcome>) {
    for outcome in outcomes {
        match outcome {
            Outcome::Everyone(message) => broadcast_all(room, &message),
            Outcome::Others(message) => broadcast_except(room, sender, &message),
            Outcome::Reply(message) => send_to(room, sender, message),
        }
    }
}

pub fn broadcast_except(room: &mut Room, sender: &str, message: &ServerMessage) {
    let mut stale = Vec::new();
    for (id, tx) in &room.peers {
        if id == sender {
            continue;
        }
        if !enqueue(Some(room.id.as_str()), id, tx, message.clone()) {
            stale.push(id.clone());
        }
    }
    drop_stale(room, stale);
}

pub fn broadcast_all(room: &mut Room, message: &ServerMessage) {
    let mut stale = Vec::new();
    for (id, tx) in &room.peers {
        if !enqueue(Some(room.id.as_str()), id, tx, message.clone()) {
            stale.push(id.clone());
        }
    }
    drop_stale(room, stale);
}

pub fn send_to(room: &mut Room, target: &str, message: ServerMessage) {
    let Some(tx) = room.peers.get(target) else {
        return;
    };
    if !enqueue(Some(room.id.as_str()), target, tx, message) {
        drop_stale(room, vec![target.to_string()]);
    }
}

/// Returns `false` once the member's queue is closed. `room_id` is `None`
/// for replies to connections that have not joined a room.
pub fn enqueue(
    room_id: Option<&str>,
    conn: &str,
    tx: &PeerSender,
    message: ServerMessage,
) -> bool {
    match tx.try_send(message) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!(room_id, conn, "outbound queue full, message dropped");
            true
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

fn drop_stale(room: &mut Room, stale: Vec<String>) {
    for id in stale {
        debug!(room_id = %room.id, conn = %id, "dropping stale peer");
        room.peers.remove(&id);
    }
}

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;
