//! # Message Log
//!
//! Newest-first sequence of posted messages. Growth is unbounded unless a
//! retention cap is set, in which case the oldest messages are evicted.

use crate::dto::ChatMessage;
use serde_json::Value;
use std::collections::VecDeque;

#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    /// Front is the newest message
    messages: VecDeque<ChatMessage>,
    /// Retention cap, `None` for unbounded
    limit: Option<usize>,
}

impl MessageLog {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            messages: VecDeque::new(),
            limit,
        }
    }

    /// Prepend `message`. Returns how many old messages were evicted by the cap.
    pub fn post(&mut self, message: ChatMessage) -> usize {
        self.messages.push_front(message);

        let Some(limit) = self.limit else {
            return 0;
        };
        let overflow = self.messages.len().saturating_sub(limit);
        self.messages.truncate(self.messages.len() - overflow);
        overflow
    }

    /// Remove every message whose id equals `id`. Returns the number removed.
    ///
    /// Numbers compare by value (`1` matches `1.0`); everything else compares as JSON.
    pub fn delete(&mut self, id: &Value) -> usize {
        let before = self.messages.len();
        self.messages
            .retain(|m| !m.id().is_some_and(|stored| ids_match(stored, id)));
        before - self.messages.len()
    }

    /// Full log, newest first.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    /// Newest-first iteration without cloning.
    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn ids_match(stored: &Value, requested: &Value) -> bool {
    match (stored.as_f64(), requested.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => stored == requested,
    }
}
