//! # Application Configuration
//!
//! This module manages relay configuration loaded from environment variables.
//! Configuration is validated on startup to fail fast if misconfigured.
//!
//! ```rust,no_run
//! use lib_core::Config;
//!
//! let config = Config::from_env()?;
//! config.validate()?;
//! # Ok::<(), String>(())
//! ```

use lib_utils::{envs, get_env_or, get_env_parse_opt, validate_not_empty, validate_range};

/// Credential used when `GEMINI_API_KEY` is not set.
///
/// The relay still starts; every summary request then fails at the provider.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";

/// Relay configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// Listen address (e.g., "127.0.0.1:3001")
    pub bind_address: String,

    /// Allowed CORS origins
    pub allowed_origins: Vec<String>,

    /// Tracing filter level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Retention cap for the message log
    ///
    /// `None` keeps every message for the lifetime of the process.
    pub history_limit: Option<usize>,

    /// Text-generation backend used for room summaries
    pub summarizer: SummarizerConfig,
}

/// Settings for the external text-generation service.
#[derive(Clone, Debug)]
pub struct SummarizerConfig {
    /// API key for the provider
    pub api_key: String,
    /// Model name (e.g., "gemini-2.0-flash")
    pub model: String,
    /// Maximum response length in tokens
    pub max_tokens: u32,
    /// Temperature for response generation
    pub temperature: f32,
}

impl SummarizerConfig {
    /// Whether the key is the built-in placeholder rather than a real credential.
    pub fn has_placeholder_key(&self) -> bool {
        self.api_key.trim().is_empty() || self.api_key == PLACEHOLDER_API_KEY
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: PLACEHOLDER_API_KEY.to_string(),
            model: "gemini-2.0-flash".to_string(),
            max_tokens: 500,
            temperature: 0.7,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3001".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            log_level: "info".to_string(),
            history_limit: None,
            summarizer: SummarizerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; unset values fall back to [`Config::default`].
    pub fn from_env() -> Result<Self, String> {
        let defaults = Config::default();

        let bind_address = get_env_or("BIND_ADDRESS", &defaults.bind_address);

        let allowed_origins = match envs::get_env("ALLOWED_ORIGINS") {
            Ok(raw) => parse_origins(&raw),
            Err(_) => defaults.allowed_origins,
        };

        let log_level = get_env_or("LOG_LEVEL", &defaults.log_level).to_lowercase();

        let history_limit = get_env_parse_opt::<usize>("ROOM_HISTORY_LIMIT")
            .map_err(|_| "ROOM_HISTORY_LIMIT must be a positive integer".to_string())?;

        let summarizer_defaults = defaults.summarizer;
        let max_tokens = get_env_parse_opt::<u32>("AI_MAX_TOKENS")
            .map_err(|_| "AI_MAX_TOKENS must be a valid number".to_string())?
            .unwrap_or(summarizer_defaults.max_tokens);
        let temperature = get_env_parse_opt::<f32>("AI_TEMPERATURE")
            .map_err(|_| "AI_TEMPERATURE must be a valid number".to_string())?
            .unwrap_or(summarizer_defaults.temperature);

        let summarizer = SummarizerConfig {
            api_key: get_env_or("GEMINI_API_KEY", &summarizer_defaults.api_key),
            model: get_env_or("GEMINI_MODEL", &summarizer_defaults.model),
            max_tokens,
            temperature,
        };

        Ok(Self {
            bind_address,
            allowed_origins,
            log_level,
            history_limit,
            summarizer,
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        validate_not_empty(&self.bind_address, "BIND_ADDRESS")?;
        validate_not_empty(&self.summarizer.model, "GEMINI_MODEL")?;

        if self.history_limit == Some(0) {
            return Err("ROOM_HISTORY_LIMIT must be greater than 0 when set".to_string());
        }

        validate_range(self.summarizer.temperature, 0.0, 2.0, "AI_TEMPERATURE")?;
        validate_range(self.summarizer.max_tokens, 1, 8192, "AI_MAX_TOKENS")?;

        if self.summarizer.has_placeholder_key() {
            tracing::warn!("GEMINI_API_KEY is not set - room summaries will fail until it is configured");
        }

        Ok(())
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
