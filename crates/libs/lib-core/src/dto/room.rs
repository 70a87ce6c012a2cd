//! # Room Wire Format
//!
//! Every WebSocket frame is a JSON text frame shaped as an event envelope:
//!
//! ```json
//! { "event": "publishEvent", "data": { "id": 3, "user": "alice", "text": "hi" } }
//! ```
//!
//! Events without a payload (`getMessages`, `getId`, `requestGemini`) omit `data`.
//! Event names are a contract with existing clients and must not change.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A posted chat message.
///
/// Stored and relayed exactly as the client sent it. Only `id` matters to the
/// room (it is the delete key); `user` and `text`, when present, feed the
/// summary prompt. Nothing else about the shape is checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ChatMessage(pub Value);

impl ChatMessage {
    pub fn new(id: impl Into<Value>, user: impl Into<Value>, text: impl Into<Value>) -> Self {
        Self(json!({ "id": id.into(), "user": user.into(), "text": text.into() }))
    }

    /// The delete key, if the message carries a non-null one.
    pub fn id(&self) -> Option<&Value> {
        self.field("id")
    }

    pub fn user(&self) -> Option<&Value> {
        self.field("user")
    }

    pub fn text(&self) -> Option<&Value> {
        self.field("text")
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }
}

/// Events sent by clients.
///
/// Decoded through [`RawFrame`]: an absent `data` reads as `null`, so payload-free
/// variants of `enterEvent`/`exitEvent` are still honoured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", try_from = "RawFrame")]
pub enum ClientEvent {
    /// Join the room with a display payload (e.g. `"alice"` or `{name, avatar}`).
    #[serde(rename = "enterEvent")]
    Enter(Value),
    #[serde(rename = "exitEvent")]
    Exit(Value),
    #[serde(rename = "publishEvent")]
    Publish(ChatMessage),
    /// Delete every message whose id matches `data.id`.
    #[serde(rename = "deleteEvent")]
    Delete(Value),
    #[serde(rename = "getMessages")]
    GetMessages,
    #[serde(rename = "getId")]
    GetId,
    #[serde(rename = "requestGemini")]
    RequestSummary,
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Enter(_) => "enterEvent",
            ClientEvent::Exit(_) => "exitEvent",
            ClientEvent::Publish(_) => "publishEvent",
            ClientEvent::Delete(_) => "deleteEvent",
            ClientEvent::GetMessages => "getMessages",
            ClientEvent::GetId => "getId",
            ClientEvent::RequestSummary => "requestGemini",
        }
    }
}

/// Inbound frame before the event name is resolved.
#[derive(Debug, Deserialize)]
pub struct RawFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl TryFrom<RawFrame> for ClientEvent {
    type Error = String;

    fn try_from(frame: RawFrame) -> Result<Self, Self::Error> {
        let event = match frame.event.as_str() {
            "enterEvent" => ClientEvent::Enter(frame.data),
            "exitEvent" => ClientEvent::Exit(frame.data),
            "publishEvent" => ClientEvent::Publish(ChatMessage(frame.data)),
            "deleteEvent" => ClientEvent::Delete(frame.data),
            "getMessages" => ClientEvent::GetMessages,
            "getId" => ClientEvent::GetId,
            "requestGemini" => ClientEvent::RequestSummary,
            other => return Err(format!("unknown event `{other}`")),
        };
        Ok(event)
    }
}

/// Events sent by the relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "enterEvent")]
    Enter(Value),
    #[serde(rename = "exitEvent")]
    Exit(Value),
    /// Participant payloads joined with `", "`.
    #[serde(rename = "updateParticipants")]
    UpdateParticipants(String),
    #[serde(rename = "publishEvent")]
    Publish(ChatMessage),
    /// The original delete request, not the resulting log.
    #[serde(rename = "deleteMessages")]
    DeleteMessages(Value),
    /// Full log, newest first.
    #[serde(rename = "getMessages")]
    Messages(Vec<ChatMessage>),
    #[serde(rename = "newId")]
    NewId(u64),
    #[serde(rename = "updateGeminiResponse")]
    Summary(SummaryOutcome),
    #[serde(rename = "error")]
    Error(ErrorPayload),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Enter(_) => "enterEvent",
            ServerEvent::Exit(_) => "exitEvent",
            ServerEvent::UpdateParticipants(_) => "updateParticipants",
            ServerEvent::Publish(_) => "publishEvent",
            ServerEvent::DeleteMessages(_) => "deleteMessages",
            ServerEvent::Messages(_) => "getMessages",
            ServerEvent::NewId(_) => "newId",
            ServerEvent::Summary(_) => "updateGeminiResponse",
            ServerEvent::Error(_) => "error",
        }
    }
}

/// Result of a summary request.
///
/// Success and failure share the `updateGeminiResponse` event; clients tell them
/// apart by shape (a string versus an `{error, code}` object).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SummaryOutcome {
    Text(String),
    Failed(ErrorPayload),
}

/// Sanitized error shape sent to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorPayload {
    pub error: String,
    pub code: String,
}

impl From<&AppError> for ErrorPayload {
    fn from(err: &AppError) -> Self {
        Self {
            error: err.user_message(),
            code: err.code().to_string(),
        }
    }
}

/// Read-only room overview served over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomOverview {
    pub participants: Vec<Value>,
    pub message_count: usize,
    /// Last value handed out by `getId` (0 before the first request).
    pub last_id: u64,
    /// RFC 3339 start time of the room
    pub started_at: String,
}

/// Extract the delete key from a `deleteEvent` payload.
///
/// A missing or `null` id yields `None`.
pub fn delete_target(payload: &Value) -> Option<&Value> {
    payload.get("id").filter(|id| !id.is_null())
}
