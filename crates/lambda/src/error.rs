//! Error types for Lambda Cloud API operations.

use thiserror::Error;

use crate::api::models::ApiErrorEnvelope;

/// Errors that can occur while talking to the Lambda Cloud API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the request.
    #[error("API error ({status}): {message}{}", .suggestion.as_deref().map(|s| format!(" (suggestion: {s})")).unwrap_or_default())]
    Api {
        status: u16,
        message: String,
        suggestion: Option<String>,
    },

    /// Credentials were missing or rejected.
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Response body did not parse.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// Build the error for a non-2xx response, decoding the structured
    /// `{"error": {...}}` envelope when the body carries one.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ApiErrorEnvelope>(body) {
            Ok(envelope) => {
                let message = envelope.error.message;
                let suggestion = envelope.error.suggestion;
                match status {
                    401 | 403 => Self::Auth { message },
                    404 => Self::NotFound(message),
                    _ => Self::Api {
                        status,
                        message,
                        suggestion,
                    },
                }
            }
            Err(_) => {
                let message = body.trim().to_string();
                match status {
                    401 | 403 => Self::Auth { message },
                    404 => Self::NotFound(message),
                    _ => Self::Api {
                        status,
                        message,
                        suggestion: None,
                    },
                }
            }
        }
    }
}
