//! # Web Library
//!
//! The room relay's transport: WebSocket and HTTP handlers, middleware, the
//! chat room itself, and server startup.

pub mod chat;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use server::{create_router, init_tracing, start_server, AppState};
