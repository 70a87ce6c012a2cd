//! # HTTP Request Handlers
//!
//! Axum handlers for the relay, organized by surface.
//!
//! - **[`websocket`]**: the room event socket
//!   - `GET /api/ws/room` - WebSocket upgrade; all room events flow here
//!
//! - **[`room`]**: read-only HTTP views of the room
//!   - `GET /api/room` - room overview
//!   - `GET /api/room/messages` - message log, newest first
//!
//! Handlers that can fail return `lib_core::Result<T>`; [`lib_core::AppError`]
//! renders itself as a `{"error", "code"}` JSON body with the mapped status.

pub mod room;
pub mod websocket;
