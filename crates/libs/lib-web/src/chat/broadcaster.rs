//! # Room Broadcaster
//!
//! Fan-out of [`ServerEvent`]s to connected sockets over a single
//! `tokio::sync::broadcast` channel. Every envelope carries its audience; each
//! connection's send task drops envelopes that are not addressed to it.

use lib_core::dto::ServerEvent;
use lib_core::ConnectionId;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Per-connection buffer before a slow socket starts lagging.
pub const BROADCAST_CAPACITY: usize = 1000;

/// Who receives an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Every connection, the sender included
    Everyone,
    /// Every connection except the sender
    AllExcept(ConnectionId),
    /// The sender only
    Only(ConnectionId),
}

impl Audience {
    pub fn includes(&self, connection_id: &ConnectionId) -> bool {
        match self {
            Audience::Everyone => true,
            Audience::AllExcept(excluded) => excluded != connection_id,
            Audience::Only(target) => target == connection_id,
        }
    }
}

/// An addressed event on the broadcast channel.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub audience: Audience,
    pub event: ServerEvent,
}

impl Envelope {
    pub fn is_for(&self, connection_id: &ConnectionId) -> bool {
        self.audience.includes(connection_id)
    }
}

#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<Arc<Envelope>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    /// Get a receiver for room events (used by WebSocket handlers).
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Envelope>> {
        self.tx.subscribe()
    }

    pub fn send(&self, audience: Audience, event: ServerEvent) {
        let name = event.name();
        // Err only means nobody is connected right now
        let receivers = self
            .tx
            .send(Arc::new(Envelope { audience, event }))
            .unwrap_or(0);
        debug!(event = name, audience = ?audience, receivers, "[ROOM] broadcast {}", name);
    }

    pub fn to_everyone(&self, event: ServerEvent) {
        self.send(Audience::Everyone, event);
    }

    pub fn to_others(&self, sender: ConnectionId, event: ServerEvent) {
        self.send(Audience::AllExcept(sender), event);
    }

    pub fn to_sender(&self, sender: ConnectionId, event: ServerEvent) {
        self.send(Audience::Only(sender), event);
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}
