//! WebSocket Routes
//!
//! `/ws/video` carries commands, binary frames and detection results;
//! `/ws/text` is the text-only chat channel. Both bridge one socket to one
//! SessionHub session.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};

use crate::error::Error;
use crate::models::ConnectQuery;
use crate::session_hub::{InboundMessage, SessionKind};
use crate::state::AppState;

/// Create WebSocket routes
pub fn stream_routes() -> Router<AppState> {
    Router::new()
        .route("/ws/video", get(video_handler))
        .route("/ws/text", get(text_handler))
}

/// WebSocket upgrade handler (detection stream)
async fn video_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state, SessionKind::Video, query.client_id))
}

/// WebSocket upgrade handler (chat)
async fn text_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state, SessionKind::Chat, query.client_id))
}

/// Handle WebSocket connection
async fn handle_websocket(
    socket: WebSocket,
    state: AppState,
    kind: SessionKind,
    client_id: Option<String>,
) {
    let (mut sender, mut receiver) = socket.split();

    let (session_id, mut rx) = state.sessions.register(kind, client_id).await;

    tracing::info!(session_id = %session_id, kind = ?kind, "WebSocket client connected");

    // Forward hub output to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // One receive per message; the frame type decides text vs binary
    let hub = state.sessions.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            let inbound = match result {
                Ok(Message::Text(text)) => InboundMessage::Text(text),
                Ok(Message::Binary(data)) => InboundMessage::Binary(data),
                Ok(Message::Ping(data)) => {
                    // Pong is handled automatically by axum
                    tracing::trace!("Received ping: {:?}", data);
                    continue;
                }
                Ok(Message::Pong(_)) => continue,
                Ok(Message::Close(_)) => {
                    tracing::info!(session_id = %session_id, "WebSocket client disconnected");
                    break;
                }
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "WebSocket error");
                    break;
                }
            };

            match hub.dispatch(&session_id, inbound).await {
                Ok(()) => {}
                Err(e @ (Error::Connection(_) | Error::NotFound(_))) => {
                    tracing::warn!(session_id = %session_id, error = %e, "Session ended");
                    break;
                }
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "Dispatch failed");
                }
            }
        }
    });

    // Wait for either task to complete, then stop the other
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    // Unregister from hub; drops windows and any in-flight frame
    state.sessions.unregister(&session_id).await;
}
