//! HTTP and WebSocket entry points.
//!
//! Each socket gets an opaque connection id and a bounded outbound queue
//! drained by its own writer task. Inbound frames are decoded, classified,
//! and applied under the joined room's write lock; the resulting outcomes are
//! queued before the lock is released.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use futures_util::{SinkExt, StreamExt};
use inkroom_shared::{
    decode_client_binary, decode_client_text, encode_server_message, ClientMessage, ServerMessage,
    WireFormat, WireFrame,
};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::broadcast::{deliver, enqueue};
use crate::logic::{apply_room_command, classify, Inbound};
use crate::membership::{join, leave};
use crate::state::{AppState, PeerSender, SharedRoom, OUTBOUND_QUEUE};

#[derive(Deserialize, Debug, Default)]
pub struct WsParams {
    #[serde(default)]
    pub format: WireFormat,
}

pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.rooms.stats().await)
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.format))
}

async fn handle_socket(socket: WebSocket, state: AppState, format: WireFormat) {
    let (mut socket_sender, mut socket_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(OUTBOUND_QUEUE);
    let connection_id = Uuid::new_v4().to_string();
    info!(conn = %connection_id, ?format, "ws connected");

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let frame = match encode_server_message(format, &message) {
                Ok(WireFrame::Text(text)) => Message::Text(text),
                Ok(WireFrame::Binary(payload)) => Message::Binary(payload),
                Err(error) => {
                    warn!(%error, "ws encode failed");
                    continue;
                }
            };
            if socket_sender.send(frame).await.is_err() {
                break;
            }
        }
    });

    let mut joined: Option<SharedRoom> = None;
    while let Some(Ok(message)) = socket_receiver.next().await {
        let parsed = match message {
            Message::Text(text) => decode_client_text(&text),
            Message::Binary(data) => decode_client_binary(&data),
            Message::Close(frame) => {
                if let Some(frame) = frame {
                    debug!(
                        conn = %connection_id,
                        code = frame.code,
                        reason = %frame.reason,
                        "ws close frame"
                    );
                }
                break;
            }
            _ => continue,
        };
        match parsed {
            Ok(message) => dispatch(&state, &mut joined, &connection_id, &tx, message).await,
            Err(error) => debug!(conn = %connection_id, %error, "dropping malformed frame"),
        }
    }

    if let Some(room) = joined {
        leave(&state, &room, &connection_id).await;
    }
    send_task.abort();
    let rooms = state.rooms.len().await;
    info!(
        conn = %connection_id,
        rooms,
        "ws disconnected"
    );
}

/// Routes one decoded message. Malformed or out-of-place messages are
/// dropped without side effects.
pub async fn dispatch(
    state: &AppState,
    joined: &mut Option<SharedRoom>,
    connection_id: &str,
    tx: &PeerSender,
    message: ClientMessage,
) {
    let Some(inbound) = classify(message, &state.limits) else {
        debug!(conn = connection_id, "dropping invalid message");
        return;
    };
    match inbound {
        Inbound::Join(request) => {
            if joined.is_some() {
                debug!(conn = connection_id, "already joined, ignoring join");
                return;
            }
            match join(state, connection_id, &request, tx.clone()).await {
                Ok(room) => *joined = Some(room),
                Err(error) => {
                    info!(room_id = %request.room_id, conn = connection_id, %error, "join refused");
                    enqueue(
                        Some(request.room_id.as_str()),
                        connection_id,
                        tx,
                        ServerMessage::RoomError {
                            message: error.to_string(),
                        },
                    );
                }
            }
        }
        Inbound::Ping => {
            let room_id = match joined {
                Some(room) => Some(room.read().await.id.clone()),
                None => None,
            };
            enqueue(room_id.as_deref(), connection_id, tx, ServerMessage::Pong);
        }
        Inbound::Room(command) => {
            let Some(room) = joined.as_ref() else {
                debug!(conn = connection_id, "not in a room, dropping event");
                return;
            };
            let mut room = room.write().await;
            let outcomes = apply_room_command(&mut room, connection_id, command);
            deliver(&mut room, connection_id, outcomes);
        }
    }
}

#[cfg(test)]
#[path = "handlers_test.rs"]
mod tests;
