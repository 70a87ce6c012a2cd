//! # Room Model
//!
//! In-memory state of the single chat room. These types are plain data
//! structures; serialization of access is the caller's concern.

pub mod registry;
pub mod message_log;

pub use registry::{display_payload, ConnectionId, ConnectionRegistry};
pub use message_log::MessageLog;
