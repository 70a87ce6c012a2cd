//! # Core Library
//!
//! Configuration, error type, wire DTOs, and the in-memory room model
//! (connection registry and message log).

pub mod config;
pub mod error;
pub mod model;
pub mod dto;

// Re-export commonly used types
pub use config::{Config, SummarizerConfig};
pub use error::{AppError, Result};
pub use model::{ConnectionId, ConnectionRegistry, MessageLog};
