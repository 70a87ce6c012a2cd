//! # Room HTTP Handlers
//!
//! Read-only views of the room for dashboards and debugging.
//!
//! - `GET /api/room` - participants, message count, last handed-out id
//! - `GET /api/room/messages?limit=N` - newest-first log, optionally truncated

use crate::chat::Room;
use axum::extract::{Query, State};
use axum::Json;
use lib_core::dto::{ChatMessage, RoomOverview};
use lib_core::{AppError, Result};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    /// Return at most this many of the newest messages
    pub limit: Option<usize>,
}

pub async fn get_room(State(room): State<Arc<Room>>) -> Json<RoomOverview> {
    Json(room.overview().await)
}

pub async fn get_messages(
    State(room): State<Arc<Room>>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<ChatMessage>>> {
    let mut messages = room.snapshot().await;

    if let Some(limit) = query.limit {
        if limit == 0 {
            return Err(AppError::InvalidInput("limit must be greater than 0".to_string()));
        }
        messages.truncate(limit);
    }

    Ok(Json(messages))
}
