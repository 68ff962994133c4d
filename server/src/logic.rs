use inkroom_shared::{ClientMessage, Segment, ServerMessage, StrokeEvent};
use tracing::{debug, info};

use crate::broadcast::{full_resync, Outcome};
use crate::membership::{update_cursor, JoinRequest};
use crate::rooms::normalize_room_id;
use crate::state::{now_millis, Room, RoomLimits};

pub const MAX_STROKE_ID_LEN: usize = 64;
pub const MAX_NAME_LEN: usize = 64;
pub const MAX_COLOR_LEN: usize = 32;
pub const DEFAULT_COLOR: &str = "#000000";
pub const DEFAULT_WIDTH: f32 = 4.0;
pub const MIN_WIDTH: f32 = 1.0;
pub const MAX_WIDTH: f32 = 100.0;
pub const ANONYMOUS: &str = "Anonymous";

/// A sanitized inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Join(JoinRequest),
    Ping,
    Room(RoomCommand),
}

/// Events that act on the room the connection has joined.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomCommand {
    Draw(Segment),
    DrawLine(Segment),
    ClearCanvas,
    CursorMove { x: f32, y: f32 },
    Undo,
    Redo,
}

/// Validates and normalizes an inbound message. `None` means the message is
/// malformed and must be dropped without side effects.
pub fn classify(message: ClientMessage, limits: &RoomLimits) -> Option<Inbound> {
    match message {
        ClientMessage::Join {
            room_id,
            room_name,
            user_name,
            user_color,
            capacity,
            is_host,
        } => {
            let room_id = normalize_room_id(&room_id)?;
            let capacity = match capacity {
                None => limits.default_capacity,
                Some(0) => return None,
                Some(requested) => usize::try_from(requested).unwrap_or(usize::MAX),
            }
            .min(limits.max_capacity)
            .max(1);
            Some(Inbound::Join(JoinRequest {
                room_name: sanitize_name(room_name).unwrap_or_else(|| room_id.clone()),
                room_id,
                user_name: sanitize_name(user_name).unwrap_or_else(|| ANONYMOUS.to_string()),
                user_color: sanitize_color(user_color),
                capacity,
                is_host,
            }))
        }
        ClientMessage::Draw(segment) => {
            let segment = sanitize_segment(segment)?;
            if !segment.tool.is_continuous() {
                return None;
            }
            Some(Inbound::Room(RoomCommand::Draw(segment)))
        }
        ClientMessage::DrawLine(segment) => Some(Inbound::Room(RoomCommand::DrawLine(
            sanitize_segment(segment)?,
        ))),
        ClientMessage::ClearCanvas => Some(Inbound::Room(RoomCommand::ClearCanvas)),
        ClientMessage::CursorMove { x, y } => {
            if !x.is_finite() || !y.is_finite() {
                return None;
            }
            Some(Inbound::Room(RoomCommand::CursorMove { x, y }))
        }
        ClientMessage::Undo => Some(Inbound::Room(RoomCommand::Undo)),
        ClientMessage::Redo => Some(Inbound::Room(RoomCommand::Redo)),
        ClientMessage::Ping => Some(Inbound::Ping),
    }
}

/// Applies one room-scoped command as a single mutation and returns what must
/// be delivered. Commands from connections that are not members do nothing.
pub fn apply_room_command(room: &mut Room, sender: &str, command: RoomCommand) -> Vec<Outcome> {
    if !room.members.contains_key(sender) {
        return Vec::new();
    }
    match command {
        RoomCommand::Draw(segment) => {
            let (user_name, event) = log_segment(room, sender, segment);
            vec![Outcome::Others(ServerMessage::Draw { user_name, event })]
        }
        RoomCommand::DrawLine(segment) => {
            let (user_name, event) = log_segment(room, sender, segment);
            vec![Outcome::Others(ServerMessage::DrawLine { user_name, event })]
        }
        RoomCommand::ClearCanvas => {
            room.clear();
            info!(room_id = %room.id, conn = sender, "canvas cleared");
            vec![full_resync(room)]
        }
        RoomCommand::CursorMove { x, y } => {
            let Some(member) = update_cursor(room, sender, x, y) else {
                return Vec::new();
            };
            vec![Outcome::Others(ServerMessage::CursorMove {
                user_id: member.id,
                user_name: member.name,
                user_color: member.color,
                x,
                y,
            })]
        }
        RoomCommand::Undo => match room.undo(sender) {
            Some(removed) => {
                info!(room_id = %room.id, conn = sender, removed, "undo");
                vec![full_resync(room)]
            }
            None => {
                debug!(room_id = %room.id, conn = sender, "nothing to undo");
                Vec::new()
            }
        },
        RoomCommand::Redo => match room.redo(sender) {
            Some(restored) => {
                info!(room_id = %room.id, conn = sender, restored, "redo");
                vec![full_resync(room)]
            }
            None => {
                debug!(room_id = %room.id, conn = sender, "nothing to redo");
                Vec::new()
            }
        },
    }
}

fn log_segment(room: &mut Room, sender: &str, segment: Segment) -> (String, StrokeEvent) {
    let user_name = match room.members.get_mut(sender) {
        Some(member) => {
            member.info.x = segment.to_x;
            member.info.y = segment.to_y;
            member.info.name.clone()
        }
        None => ANONYMOUS.to_string(),
    };
    let event = StrokeEvent::from_segment(segment, sender, now_millis());
    let evicted = room.append(event.clone());
    if evicted > 0 {
        debug!(room_id = %room.id, evicted, "history bound reached");
    }
    (user_name, event)
}

fn sanitize_segment(mut segment: Segment) -> Option<Segment> {
    if !segment.is_finite() {
        return None;
    }
    segment.stroke_id = match segment.stroke_id.take() {
        Some(id) if id.len() > MAX_STROKE_ID_LEN => return None,
        Some(id) if id.is_empty() => None,
        other => other,
    };
    segment.color = sanitize_color(segment.color);
    segment.width = sanitize_width(segment.width);
    Some(segment)
}

fn sanitize_color(mut color: String) -> String {
    if color.trim().is_empty() {
        return DEFAULT_COLOR.to_string();
    }
    truncate_utf8(&mut color, MAX_COLOR_LEN);
    color
}

fn sanitize_width(width: f32) -> f32 {
    let width = if width.is_finite() { width } else { DEFAULT_WIDTH };
    width.clamp(MIN_WIDTH, MAX_WIDTH)
}

fn sanitize_name(name: String) -> Option<String> {
    let mut name = name.trim().to_string();
    if name.is_empty() {
        return None;
    }
    truncate_utf8(&mut name, MAX_NAME_LEN);
    Some(name)
}

fn truncate_utf8(value: &mut String, max_len: usize) {
    if value.len() <= max_len {
        return;
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value.truncate(end);
}

#[cfg(test)]
#[path = "logic_test.rs"]
mod tests;
