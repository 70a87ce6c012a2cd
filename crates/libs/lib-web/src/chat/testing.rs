//! Test doubles for the chat module.

use super::summarizer::TextGenerator;
use async_trait::async_trait;
use lib_core::{AppError, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Generator with a fixed reply that records every prompt it receives.
///
/// With a gate, `generate` parks until [`ScriptedGenerator::release`] is called.
pub struct ScriptedGenerator {
    reply: std::result::Result<String, String>,
    prompts: Mutex<Vec<String>>,
    gate: Option<Arc<Notify>>,
    panics: bool,
}

impl ScriptedGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
            gate: None,
            panics: false,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            reply: Err(reason.to_string()),
            prompts: Mutex::new(Vec::new()),
            gate: None,
            panics: false,
        }
    }

    /// Generator whose call panics, as a broken backend would.
    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::replying("unreachable")
        }
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.panics {
            panic!("generator blew up");
        }
        self.reply.clone().map_err(AppError::Summarizer)
    }
}
