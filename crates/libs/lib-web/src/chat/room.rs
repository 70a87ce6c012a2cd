//! # Chat Room
//!
//! The single shared room: connection registry, message log, and id counter,
//! owned together behind one lock.
//!
//! Every mutation broadcasts while still holding the write lock, so all
//! connections observe events in the order the state changed. The summary
//! request is the only operation that suspends outside the lock: the external
//! call runs in a detached task working on a snapshot of the log.
//!
//! | Inbound          | Broadcasts                                                  |
//! |------------------|-------------------------------------------------------------|
//! | `enterEvent`     | `enterEvent` → others, then `updateParticipants` → everyone |
//! | `exitEvent`      | `exitEvent` → others, then `updateParticipants` → everyone  |
//! | `publishEvent`   | `publishEvent` → everyone                                   |
//! | `deleteEvent`    | `deleteMessages` (original payload) → everyone              |
//! | `getMessages`    | `getMessages` → sender                                      |
//! | `getId`          | `newId` → sender                                            |
//! | `requestGemini`  | `updateGeminiResponse` → everyone, once the service answers |
//! | disconnect       | `updateParticipants` → everyone                             |

use super::broadcaster::{Broadcaster, Envelope};
use super::summarizer::{build_prompt, TextGenerator};
use chrono::{DateTime, Utc};
use lib_core::dto::{
    delete_target, ChatMessage, ClientEvent, ErrorPayload, RoomOverview, ServerEvent,
    SummaryOutcome,
};
use lib_core::{AppError, ConnectionId, ConnectionRegistry, MessageLog, Result};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

struct RoomState {
    registry: ConnectionRegistry,
    log: MessageLog,
    /// Last value handed out by `getId`
    last_id: u64,
}

pub struct Room {
    state: RwLock<RoomState>,
    broadcaster: Broadcaster,
    generator: Arc<dyn TextGenerator>,
    started_at: DateTime<Utc>,
}

impl Room {
    /// Create an empty room.
    ///
    /// `history_limit` caps the message log; `None` keeps everything.
    pub fn new(history_limit: Option<usize>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            state: RwLock::new(RoomState {
                registry: ConnectionRegistry::new(),
                log: MessageLog::new(history_limit),
                last_id: 0,
            }),
            broadcaster: Broadcaster::new(),
            generator,
            started_at: lib_utils::now_utc(),
        }
    }

    /// Get a receiver for room events (used by WebSocket handlers).
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Envelope>> {
        self.broadcaster.subscribe()
    }

    /// Number of sockets currently subscribed.
    pub fn connection_count(&self) -> usize {
        self.broadcaster.receiver_count()
    }

    /// Apply one inbound event from `sender`.
    pub async fn handle(&self, sender: ConnectionId, event: ClientEvent) -> Result<()> {
        match event {
            ClientEvent::Enter(payload) => self.enter(sender, payload).await,
            ClientEvent::Exit(payload) => self.exit(sender, payload).await,
            ClientEvent::Publish(message) => self.publish(message).await,
            ClientEvent::Delete(request) => {
                self.delete(request).await?;
            }
            ClientEvent::GetMessages => self.send_messages(sender).await,
            ClientEvent::GetId => {
                self.next_id(sender).await;
            }
            ClientEvent::RequestSummary => {
                // Detached: the result is broadcast whenever the service answers
                tokio::spawn(watch_summary(self.request_summary(sender).await));
            }
        }
        Ok(())
    }

    pub async fn enter(&self, sender: ConnectionId, payload: Value) {
        let mut state = self.state.write().await;
        self.broadcaster.to_others(sender, ServerEvent::Enter(payload.clone()));
        state.registry.join(sender, payload);
        debug!(connection_id = %sender, participants = state.registry.len(), "[ROOM] enter");
        self.broadcast_participants(&state);
    }

    pub async fn exit(&self, sender: ConnectionId, payload: Value) {
        let mut state = self.state.write().await;
        self.broadcaster.to_others(sender, ServerEvent::Exit(payload));
        state.registry.leave(&sender);
        debug!(connection_id = %sender, participants = state.registry.len(), "[ROOM] exit");
        self.broadcast_participants(&state);
    }

    pub async fn publish(&self, message: ChatMessage) {
        let mut state = self.state.write().await;
        let evicted = state.log.post(message.clone());
        debug!(id = ?message.id(), log_len = state.log.len(), evicted, "[ROOM] publish");
        self.broadcaster.to_everyone(ServerEvent::Publish(message));
    }

    /// Delete every message matching `request.id` and echo the request to everyone.
    ///
    /// A request without an id is rejected and nothing is broadcast.
    pub async fn delete(&self, request: Value) -> Result<usize> {
        let id = delete_target(&request)
            .cloned()
            .ok_or_else(|| AppError::InvalidInput("deleteEvent requires an id".to_string()))?;

        let mut state = self.state.write().await;
        let removed = state.log.delete(&id);
        debug!(id = %id, removed, log_len = state.log.len(), "[ROOM] delete");
        self.broadcaster.to_everyone(ServerEvent::DeleteMessages(request));
        Ok(removed)
    }

    /// Send the full log, newest first, to `sender` only.
    pub async fn send_messages(&self, sender: ConnectionId) {
        let state = self.state.read().await;
        self.broadcaster
            .to_sender(sender, ServerEvent::Messages(state.log.snapshot()));
    }

    /// Hand out the next value of the room-wide counter.
    pub async fn next_id(&self, sender: ConnectionId) -> u64 {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let id = state.last_id;
        self.broadcaster.to_sender(sender, ServerEvent::NewId(id));
        id
    }

    /// Summarize the current log.
    ///
    /// The prompt is built now; the external call runs in the returned task and
    /// its outcome, text or sanitized error, goes to everyone as
    /// `updateGeminiResponse`. Disconnecting does not cancel it.
    pub async fn request_summary(&self, sender: ConnectionId) -> JoinHandle<()> {
        let prompt = {
            let state = self.state.read().await;
            info!(connection_id = %sender, messages = state.log.len(), "[ROOM] summary requested");
            build_prompt(state.log.iter())
        };

        let generator = Arc::clone(&self.generator);
        let broadcaster = self.broadcaster.clone();
        tokio::spawn(async move {
            let outcome = match generator.generate(&prompt).await {
                Ok(text) => {
                    info!(len = text.len(), "[ROOM] summary ready");
                    SummaryOutcome::Text(text)
                }
                Err(e) => {
                    error!(error = %e, "[ROOM] summary failed");
                    SummaryOutcome::Failed(ErrorPayload::from(&e))
                }
            };
            broadcaster.to_everyone(ServerEvent::Summary(outcome));
        })
    }

    /// Drop `connection_id` from the registry after its socket closed.
    ///
    /// Always broadcasts the participant list, registered or not.
    pub async fn disconnect(&self, connection_id: ConnectionId) -> bool {
        let mut state = self.state.write().await;
        let was_registered = state.registry.leave(&connection_id).is_some();
        debug!(connection_id = %connection_id, was_registered, "[ROOM] disconnect");
        self.broadcast_participants(&state);
        was_registered
    }

    /// Report a failed request back to its sender only.
    pub fn reject(&self, sender: ConnectionId, err: &AppError) {
        self.broadcaster
            .to_sender(sender, ServerEvent::Error(ErrorPayload::from(err)));
    }

    pub async fn snapshot(&self) -> Vec<ChatMessage> {
        self.state.read().await.log.snapshot()
    }

    pub async fn overview(&self) -> RoomOverview {
        let state = self.state.read().await;
        RoomOverview {
            participants: state.registry.participants(),
            message_count: state.log.len(),
            last_id: state.last_id,
            started_at: lib_utils::format_time(self.started_at),
        }
    }

    fn broadcast_participants(&self, state: &RoomState) {
        self.broadcaster
            .to_everyone(ServerEvent::UpdateParticipants(state.registry.joined()));
    }
}

/// Wait for a summary task and log it if it died instead of finishing.
async fn watch_summary(task: JoinHandle<()>) -> bool {
    match task.await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, panicked = e.is_panic(), "[ROOM] summary task failed");
            false
        }
    }
}
