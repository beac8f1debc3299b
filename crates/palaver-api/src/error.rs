//! Error types for palaver-api

use thiserror::Error;

/// Result type alias using palaver-api Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the chat backend
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend returned an error response
    #[error("API error: {message}")]
    Api { message: String },

    /// Server-sent events error
    #[error("SSE error: {0}")]
    Sse(String),

    /// The push-hub connection dropped before any content arrived
    #[error("Hub disconnected before any content was received: {0}")]
    HubDisconnected(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected response format
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// Create an API error from a message
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Check if this error is a configuration problem (no network was attempted)
    pub fn is_config(&self) -> bool {
        matches!(self, Error::InvalidConfig(_))
    }
}
