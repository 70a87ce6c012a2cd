//! # Summarization Gateway
//!
//! Turns the room's message log into a prompt and hands it to an external
//! text-generation service through rust-genai (Gemini by default).
//!
//! The gateway itself never broadcasts; [`crate::chat::Room::request_summary`]
//! drives the request and publishes the outcome.

use async_trait::async_trait;
use lib_core::dto::ChatMessage;
use lib_core::model::display_payload;
use lib_core::{AppError, Result, SummarizerConfig};
use std::sync::Arc;

/// Instructions placed ahead of the transcript.
pub const SUMMARY_INSTRUCTIONS: &str = "You are summarizing a group chat. \
The conversation below is listed newest message first, one message per line as \"user: text\". \
Write a short summary, then list:\n\
- Decisions that were made\n\
- Action items, with the person responsible when stated\n\
- Open questions that still need an answer\n\
Write \"None\" under any heading with nothing to report.";

/// Build the prompt for a newest-first sequence of messages.
///
/// Messages keep the order they are given in; nothing is re-sorted.
pub fn build_prompt<'a>(messages: impl IntoIterator<Item = &'a ChatMessage>) -> String {
    let transcript = messages
        .into_iter()
        .map(transcript_line)
        .collect::<Vec<_>>()
        .join("\n");

    format!("{SUMMARY_INSTRUCTIONS}\n\nConversation:\n{transcript}")
}

/// `user: text`, each side rendered like a participant payload.
///
/// A message that is not an object (a bare string, say) is its own text.
fn transcript_line(message: &ChatMessage) -> String {
    let user = message
        .user()
        .map(display_payload)
        .unwrap_or_else(|| "unknown".to_string());
    let text = match &message.0 {
        serde_json::Value::Object(_) => message.text().map(display_payload).unwrap_or_default(),
        other => display_payload(other),
    };
    format!("{user}: {text}")
}

/// External text-generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Single attempt; no retry, no timeout.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Generator backed by rust-genai.
#[cfg(feature = "genai")]
pub struct GenaiGenerator {
    config: SummarizerConfig,
    client: genai::Client,
}

#[cfg(feature = "genai")]
impl GenaiGenerator {
    pub fn new(config: SummarizerConfig) -> Self {
        use genai::resolver::{AuthData, AuthResolver};

        // Build auth resolver for the configured API key
        let api_key = config.api_key.clone();
        let auth_resolver = AuthResolver::from_resolver_fn(
            move |_model_iden| -> std::result::Result<Option<AuthData>, genai::resolver::Error> {
                Ok(Some(AuthData::from_single(api_key.clone())))
            },
        );

        let client = genai::Client::builder()
            .with_auth_resolver(auth_resolver)
            .build();

        Self { config, client }
    }
}

#[cfg(feature = "genai")]
#[async_trait]
impl TextGenerator for GenaiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        use genai::chat::{ChatMessage as GenaiMessage, ChatOptions, ChatRequest};

        let chat_req = ChatRequest::default().append_message(GenaiMessage::user(prompt));

        let chat_options = ChatOptions::default()
            .with_temperature(self.config.temperature as f64)
            .with_max_tokens(self.config.max_tokens);

        tracing::debug!(model = %self.config.model, prompt_len = prompt.len(), "Calling AI API");
        let chat_res = self
            .client
            .exec_chat(&self.config.model, chat_req, Some(&chat_options))
            .await
            .map_err(|e| AppError::Summarizer(format!("AI API error: {:?}", e)))?;

        let text = chat_res
            .first_text()
            .ok_or_else(|| AppError::Summarizer("No response from AI".to_string()))?
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(AppError::Summarizer("Empty response from AI".to_string()));
        }

        Ok(text)
    }
}

/// Fallback when the genai feature is not enabled.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(AppError::Summarizer(
            "AI summaries are not enabled. Please enable the 'genai' feature.".to_string(),
        ))
    }
}

/// Generator for the current build.
#[cfg(feature = "genai")]
pub fn default_generator(config: &SummarizerConfig) -> Arc<dyn TextGenerator> {
    Arc::new(GenaiGenerator::new(config.clone()))
}

/// Generator for the current build.
#[cfg(not(feature = "genai"))]
pub fn default_generator(_config: &SummarizerConfig) -> Arc<dyn TextGenerator> {
    Arc::new(DisabledGenerator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_user_and_text() {
        let messages = vec![ChatMessage::new(1, "A", "hi")];
        let prompt = build_prompt(&messages);
        assert!(prompt.contains("A: hi"));
        assert!(prompt.starts_with(SUMMARY_INSTRUCTIONS));
    }

    #[test]
    fn test_prompt_keeps_given_order() {
        // Newest first, as stored in the log
        let messages = vec![
            ChatMessage::new(3, "carol", "third"),
            ChatMessage::new(2, "bob", "second"),
            ChatMessage::new(1, "alice", "first"),
        ];
        let prompt = build_prompt(&messages);
        assert!(prompt.ends_with("carol: third\nbob: second\nalice: first"));
    }

    #[test]
    fn test_prompt_tolerates_missing_fields() {
        let message = ChatMessage(serde_json::json!({ "text": "anonymous note" }));
        let prompt = build_prompt([&message]);
        assert!(prompt.contains("unknown: anonymous note"));
    }

    #[test]
    fn test_prompt_renders_structured_and_bare_messages() {
        let messages = vec![
            ChatMessage::new(2, serde_json::json!({ "name": "alice" }), 5),
            ChatMessage(serde_json::json!("plain string message")),
        ];
        let prompt = build_prompt(&messages);
        assert!(prompt.ends_with("{\"name\":\"alice\"}: 5\nunknown: plain string message"));
    }

    #[tokio::test]
    async fn test_disabled_generator_fails() {
        let err = DisabledGenerator.generate("anything").await.unwrap_err();
        assert!(matches!(err, AppError::Summarizer(_)));
    }
}
