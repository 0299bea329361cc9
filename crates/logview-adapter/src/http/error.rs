/*
[INPUT]:  Error sources (HTTP, log server error bodies, serialization, URLs)
[OUTPUT]: Structured error types with context and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the logview adapter
#[derive(Error, Debug)]
pub enum LogviewError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Log server answered with an error body or a failing status
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection timeout
    #[error("Connection timeout after {duration}s")]
    Timeout { duration: u64 },
}

impl LogviewError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            LogviewError::Http(_)
            | LogviewError::Timeout { .. }
            | LogviewError::InvalidResponse(_) => true,
            LogviewError::Api { code, .. } => *code >= 500 || *code == 429,
            _ => false,
        }
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        LogviewError::Api {
            code: status.as_u16() as i32,
            message: message.into(),
        }
    }
}

/// Result type alias for logview adapter operations
pub type Result<T> = std::result::Result<T, LogviewError>;
