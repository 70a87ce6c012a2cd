//! # Chat Module
//!
//! The room behind the `/api/ws/room` socket: state, fan-out, and summaries.
//!
//! - **[`room`]**: registry, message log, and counter behind one lock
//! - **[`broadcaster`]**: addressed fan-out over a tokio broadcast channel
//! - **[`summarizer`]**: prompt building and the text-generation backend

pub mod broadcaster;
pub mod room;
pub mod summarizer;
#[cfg(test)]
pub(crate) mod testing;

pub use broadcaster::{Audience, Broadcaster, Envelope};
pub use room::Room;
pub use summarizer::{build_prompt, default_generator, TextGenerator};
