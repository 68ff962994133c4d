//! Frame encoding for the WebSocket transport.
//!
//! Clients pick the outbound encoding when they connect. JSON travels in
//! text frames, bincode (standard config) in binary frames. Inbound frames
//! are decoded by their frame kind, independent of the negotiated format.

use bincode::config::Config;
use serde::Deserialize;

use crate::{ClientMessage, ServerMessage};

/// Upper bound on bytes a single client frame may claim while decoding.
pub const MAX_CLIENT_FRAME: usize = 64 * 1024;
/// Server frames carry whole history snapshots, so they get more room.
pub const MAX_SERVER_FRAME: usize = 16 * 1024 * 1024;

fn client_decode_config() -> impl Config {
    bincode::config::standard().with_limit::<MAX_CLIENT_FRAME>()
}

fn server_decode_config() -> impl Config {
    bincode::config::standard().with_limit::<MAX_SERVER_FRAME>()
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    #[default]
    Json,
    Bincode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireFrame {
    Text(String),
    Binary(Vec<u8>),
}

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("invalid json frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bincode encode failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("invalid bincode frame: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("{0} trailing bytes after bincode frame")]
    TrailingBytes(usize),
}

pub fn encode_server_message(
    format: WireFormat,
    message: &ServerMessage,
) -> Result<WireFrame, WireError> {
    match format {
        WireFormat::Json => Ok(WireFrame::Text(serde_json::to_string(message)?)),
        WireFormat::Bincode => Ok(WireFrame::Binary(bincode::encode_to_vec(
            message,
            bincode::config::standard(),
        )?)),
    }
}

pub fn encode_client_message(
    format: WireFormat,
    message: &ClientMessage,
) -> Result<WireFrame, WireError> {
    match format {
        WireFormat::Json => Ok(WireFrame::Text(serde_json::to_string(message)?)),
        WireFormat::Bincode => Ok(WireFrame::Binary(bincode::encode_to_vec(
            message,
            bincode::config::standard(),
        )?)),
    }
}

pub fn decode_client_text(text: &str) -> Result<ClientMessage, WireError> {
    Ok(serde_json::from_str(text)?)
}

/// Length prefixes are checked against [`MAX_CLIENT_FRAME`] before anything
/// is allocated.
pub fn decode_client_binary(payload: &[u8]) -> Result<ClientMessage, WireError> {
    let (message, read) =
        bincode::decode_from_slice::<ClientMessage, _>(payload, client_decode_config())?;
    if read != payload.len() {
        return Err(WireError::TrailingBytes(payload.len() - read));
    }
    Ok(message)
}

pub fn decode_server_frame(frame: &WireFrame) -> Result<ServerMessage, WireError> {
    match frame {
        WireFrame::Text(text) => Ok(serde_json::from_str(text)?),
        WireFrame::Binary(payload) => {
            let (message, _) =
                bincode::decode_from_slice::<ServerMessage, _>(payload, server_decode_config())?;
            Ok(message)
        }
    }
}
