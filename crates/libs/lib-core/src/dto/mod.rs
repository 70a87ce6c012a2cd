//! # Data Transfer Objects (DTOs)
//!
//! Structures exchanged with clients over the room WebSocket and the HTTP API.

pub mod room;

pub use room::*;
