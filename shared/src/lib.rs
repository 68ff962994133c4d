use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

pub mod wire;

pub use wire::{
    decode_client_binary, decode_client_text, decode_server_frame, encode_client_message,
    encode_server_message, WireError, WireFormat, WireFrame,
};

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Brush,
    Eraser,
    Line,
    Rectangle,
    Circle,
}

impl Tool {
    /// Continuous tools stream one segment per pointer move; shape tools
    /// commit a single segment when the gesture ends.
    pub fn is_continuous(self) -> bool {
        matches!(self, Tool::Brush | Tool::Eraser)
    }
}

/// Geometry and styling of one drawing segment as sent by a client.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub from_x: f32,
    pub from_y: f32,
    pub to_x: f32,
    pub to_y: f32,
    pub color: String,
    pub width: f32,
    pub tool: Tool,
    #[serde(default)]
    pub stroke_id: Option<String>,
}

impl Segment {
    pub fn is_finite(&self) -> bool {
        [self.from_x, self.from_y, self.to_x, self.to_y]
            .iter()
            .all(|value| value.is_finite())
    }
}

/// A segment accepted into a room's history, stamped with its author and
/// the server arrival time.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StrokeEvent {
    pub from_x: f32,
    pub from_y: f32,
    pub to_x: f32,
    pub to_y: f32,
    pub color: String,
    pub width: f32,
    pub tool: Tool,
    pub user_id: String,
    pub stroke_id: Option<String>,
    pub timestamp: u64,
}

impl StrokeEvent {
    pub fn from_segment(segment: Segment, user_id: impl Into<String>, timestamp: u64) -> Self {
        Self {
            from_x: segment.from_x,
            from_y: segment.from_y,
            to_x: segment.to_x,
            to_y: segment.to_y,
            color: segment.color,
            width: segment.width,
            tool: segment.tool,
            user_id: user_id.into(),
            stroke_id: segment.stroke_id,
            timestamp,
        }
    }
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
pub struct MemberInfo {
    pub id: String,
    pub name: String,
    pub color: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Join {
        room_id: String,
        #[serde(default)]
        room_name: String,
        user_name: String,
        user_color: String,
        #[serde(default)]
        capacity: Option<u32>,
        #[serde(default)]
        is_host: bool,
    },
    Draw(Segment),
    DrawLine(Segment),
    ClearCanvas,
    CursorMove {
        x: f32,
        y: f32,
    },
    Undo,
    Redo,
    Ping,
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    UsersList {
        user_id: String,
        users: Vec<MemberInfo>,
    },
    UserJoined {
        user: MemberInfo,
        users: Vec<MemberInfo>,
    },
    #[serde(rename_all = "camelCase")]
    UserLeft {
        user_id: String,
        users: Vec<MemberInfo>,
    },
    #[serde(rename_all = "camelCase")]
    Draw {
        user_name: String,
        event: StrokeEvent,
    },
    #[serde(rename_all = "camelCase")]
    DrawLine {
        user_name: String,
        event: StrokeEvent,
    },
    #[serde(rename_all = "camelCase")]
    CursorMove {
        user_id: String,
        user_name: String,
        user_color: String,
        x: f32,
        y: f32,
    },
    DrawingHistory {
        history: Vec<StrokeEvent>,
    },
    FullHistoryUpdate {
        history: Vec<StrokeEvent>,
    },
    RoomError {
        message: String,
    },
    Pong,
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
