//! # Centralized Error Handling
//!
//! This module defines the relay-wide error type [`AppError`], used by the room,
//! the summarization gateway, and the HTTP handlers alike.
//!
//! ## Error Categories
//!
//! 1. **Client Errors** - bad frames or payloads from a connection
//!    - [`InvalidInput`](AppError::InvalidInput) → 400 Bad Request / `error` event to the sender
//!    - [`NotFound`](AppError::NotFound) → 404 Not Found
//!
//! 2. **Server Errors** - internal or upstream failures
//!    - [`Config`](AppError::Config) → 500 Internal Server Error
//!    - [`Summarizer`](AppError::Summarizer) → 502 Bad Gateway (external service)
//!    - [`Internal`](AppError::Internal) → 500 Internal Server Error
//!
//! Server errors never expose their details to clients: [`AppError::user_message`]
//! returns a generic text for them, and the full error only goes to the logs.

use thiserror::Error;
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Relay-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error during startup or environment loading.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed frame, unknown event, or missing payload field.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Text-generation service failure (network, auth, quota, empty reply).
    #[error("Summarizer error: {0}")]
    Summarizer(String),

    /// Internal server error (unexpected failures).
    #[error("Internal error: {0}")]
    Internal(String),

    /// Requested resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Summarizer(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code, sent to clients alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "Config",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Summarizer(_) => "Summarizer",
            AppError::Internal(_) => "Internal",
            AppError::NotFound(_) => "NotFound",
        }
    }

    /// Get a user-friendly error message.
    ///
    /// For server-side errors, returns a generic message to avoid exposing implementation details.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Summarizer(_) => "Summary service temporarily unavailable".to_string(),
            AppError::Config(_) | AppError::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match status {
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                tracing::debug!("Client error: {}", self);
            }
            _ => {
                tracing::error!("Server error: {}", self);
            }
        }

        let body = Json(json!({
            "error": self.user_message(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Convert `serde_json::Error` to `AppError`.
///
/// Every JSON failure in the relay comes from a client frame, so it is a client error.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("Malformed event: {}", err))
    }
}
