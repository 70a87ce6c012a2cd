//! # Connection Registry
//!
//! Maps live connections to the display payload they announced with `enterEvent`.
//! Entries keep insertion order; re-entering with the same connection replaces the
//! payload in place. Identical payloads from different connections are kept as-is.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Separator used for the `updateParticipants` string.
pub const PARTICIPANT_SEPARATOR: &str = ", ";

/// Opaque identity of one live WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    entries: Vec<(ConnectionId, Value)>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `connection_id`, or overwrite its payload if already present.
    pub fn join(&mut self, connection_id: ConnectionId, payload: Value) {
        match self.entries.iter_mut().find(|(id, _)| *id == connection_id) {
            Some(entry) => entry.1 = payload,
            None => self.entries.push((connection_id, payload)),
        }
    }

    /// Remove `connection_id`. Returns the payload it held, if any.
    pub fn leave(&mut self, connection_id: &ConnectionId) -> Option<Value> {
        let idx = self.entries.iter().position(|(id, _)| id == connection_id)?;
        Some(self.entries.remove(idx).1)
    }

    /// Payloads in registration order.
    pub fn participants(&self) -> Vec<Value> {
        self.entries.iter().map(|(_, payload)| payload.clone()).collect()
    }

    /// Payloads rendered with [`display_payload`] and joined with `", "`.
    pub fn joined(&self) -> String {
        self.entries
            .iter()
            .map(|(_, payload)| display_payload(payload))
            .collect::<Vec<_>>()
            .join(PARTICIPANT_SEPARATOR)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// String form of a participant payload.
///
/// JSON strings render raw (`"alice"` → `alice`); anything else renders as compact JSON.
pub fn display_payload(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
