//! # WebSocket Handlers
//!
//! The room event socket.
//!
//! ## Endpoints
//!
//! - `GET /api/ws/room` - WebSocket connection to the chat room
//!
//! ## Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:3001/api/ws/room');
//! ws.onopen = () => ws.send(JSON.stringify({ event: 'enterEvent', data: 'alice' }));
//! ws.onmessage = (event) => {
//!   const { event: name, data } = JSON.parse(event.data);
//!   if (name === 'updateParticipants') console.log(`in the room: ${data}`);
//! };
//! ```

use crate::chat::{Envelope, Room};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use lib_core::dto::ClientEvent;
use lib_core::{AppError, ConnectionId};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

#[cfg(test)]
mod tests;

/// WebSocket handler for the chat room.
///
/// **Route**: `GET /api/ws/room`
///
/// Each upgraded socket gets a fresh [`ConnectionId`]. The room subscription is
/// taken before the upgrade completes, so a client never misses events sent
/// after its handshake.
pub async fn room_websocket(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(room): State<Arc<Room>>,
) -> Response {
    let connection_id = ConnectionId::new();

    let client_ip = headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or("").trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| addr.ip().to_string());

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    info!(
        connection_id = %connection_id,
        client_ip = %client_ip,
        user_agent = ?user_agent,
        "[WS] CONNECT_ATTEMPT connection_id={} ip={}",
        connection_id,
        client_ip
    );

    let events = room.subscribe();

    ws.on_upgrade(move |socket| handle_room_websocket(socket, room, events, connection_id, client_ip))
}

/// Drive one room connection until either side goes away, then run the disconnect path.
async fn handle_room_websocket(
    socket: WebSocket,
    room: Arc<Room>,
    mut events: broadcast::Receiver<Arc<Envelope>>,
    connection_id: ConnectionId,
    client_ip: String,
) {
    let (mut sender, mut receiver) = socket.split();
    let connection_start = Instant::now();
    let messages_sent = Arc::new(AtomicU64::new(0));
    let messages_received = Arc::new(AtomicU64::new(0));

    info!(
        connection_id = %connection_id,
        client_ip = %client_ip,
        connections = room.connection_count(),
        "[WS] CONNECTED connection_id={} ip={}",
        connection_id,
        client_ip
    );

    // Room events addressed to this connection -> socket
    let messages_sent_send = Arc::clone(&messages_sent);
    let mut send_task = tokio::spawn(async move {
        loop {
            let envelope = match events.recv().await {
                Ok(envelope) => envelope,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        connection_id = %connection_id,
                        skipped,
                        "[WS] LAGGED connection_id={} skipped={} events",
                        connection_id,
                        skipped
                    );
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return "room_closed".to_string(),
            };

            if !envelope.is_for(&connection_id) {
                continue;
            }

            let json = match serde_json::to_string(&envelope.event) {
                Ok(json) => json,
                Err(e) => {
                    error!(
                        connection_id = %connection_id,
                        error = %e,
                        "[WS] SERIALIZE_ERROR connection_id={} error={}",
                        connection_id,
                        e
                    );
                    continue;
                }
            };

            if let Err(e) = sender.send(Message::Text(json.into())).await {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "[WS] SEND_ERROR connection_id={} error={}",
                    connection_id,
                    e
                );
                return "send_error".to_string();
            }
            messages_sent_send.fetch_add(1, Ordering::Relaxed);
        }
    });

    // Client frames -> room
    let room_recv = Arc::clone(&room);
    let messages_received_recv = Arc::clone(&messages_received);
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    messages_received_recv.fetch_add(1, Ordering::Relaxed);
                    dispatch(&room_recv, connection_id, text.as_str()).await;
                }
                Ok(Message::Close(frame)) => {
                    return frame
                        .map(|f| format!("close {}", f.code))
                        .unwrap_or_else(|| "close".to_string());
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(Message::Binary(data)) => {
                    debug!(
                        connection_id = %connection_id,
                        size = data.len(),
                        "[WS] BINARY_IGNORED connection_id={} size={}",
                        connection_id,
                        data.len()
                    );
                }
                Err(e) => {
                    warn!(
                        connection_id = %connection_id,
                        error = %e,
                        "[WS] RECV_ERROR connection_id={} error={}",
                        connection_id,
                        e
                    );
                    return "receive_error".to_string();
                }
            }
        }
        "client_gone".to_string()
    });

    // Wait for either task to complete
    let reason = tokio::select! {
        result = &mut send_task => {
            recv_task.abort();
            result.unwrap_or_else(|e| format!("send task failed: {e}"))
        }
        result = &mut recv_task => {
            send_task.abort();
            result.unwrap_or_else(|e| format!("receive task failed: {e}"))
        }
    };

    room.disconnect(connection_id).await;

    let duration = connection_start.elapsed();
    info!(
        connection_id = %connection_id,
        client_ip = %client_ip,
        reason = %reason,
        duration_ms = duration.as_millis(),
        messages_sent = messages_sent.load(Ordering::Relaxed),
        messages_received = messages_received.load(Ordering::Relaxed),
        "[WS] DISCONNECTED connection_id={} reason={} duration={:.2}s",
        connection_id,
        reason,
        duration.as_secs_f64()
    );
}

/// Parse one text frame and apply it to the room.
///
/// Malformed frames and rejected requests are answered with an `error` event to
/// the sender; they never reach other connections.
async fn dispatch(room: &Room, connection_id: ConnectionId, text: &str) {
    let result = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => {
            debug!(
                connection_id = %connection_id,
                event = event.name(),
                "[WS] EVENT connection_id={} event={}",
                connection_id,
                event.name()
            );
            room.handle(connection_id, event).await
        }
        Err(e) => Err(AppError::from(e)),
    };

    if let Err(err) = result {
        warn!(
            connection_id = %connection_id,
            error = %err,
            "[WS] REJECTED connection_id={} error={}",
            connection_id,
            err
        );
        room.reject(connection_id, &err);
    }
}
