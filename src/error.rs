/// Unified error types for the moderation client
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::queue::ItemId;

/// Main error type for moderation operations
#[derive(Error, Debug)]
pub enum ModerationError {
    /// Transport errors (connection refused, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Authorization errors
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Item is not in the loaded collection
    #[error("Item {0} not found")]
    NotFound(ItemId),

    /// Transition not defined for the item's current state
    #[error("Cannot {action} item {id}: status is {status}")]
    InvalidTransition {
        id: ItemId,
        action: &'static str,
        status: &'static str,
    },

    /// Another transition for the same item is still outstanding
    #[error("A transition for item {0} is already in flight")]
    InFlight(ItemId),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ModerationError {
    fn from(e: serde_json::Error) -> Self {
        ModerationError::Decode(e.to_string())
    }
}

/// Error body the backend sends with failed requests
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BackendErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl BackendErrorBody {
    /// Pick the most specific message the backend provided
    pub fn into_message(self, fallback: &str) -> String {
        self.detail
            .or(self.message)
            .or(self.error)
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Result type alias for moderation operations
pub type ModerationResult<T> = Result<T, ModerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_body_prefers_detail() {
        let body: BackendErrorBody =
            serde_json::from_str(r#"{"error": "bad", "detail": "Note not found"}"#).unwrap();
        assert_eq!(body.into_message("fallback"), "Note not found");
    }

    #[test]
    fn test_backend_error_body_fallback() {
        let body = BackendErrorBody::default();
        assert_eq!(body.into_message("Internal Server Error"), "Internal Server Error");
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = ModerationError::InvalidTransition {
            id: ItemId::Int(7),
            action: "approve",
            status: "approved",
        };
        assert_eq!(err.to_string(), "Cannot approve item 7: status is approved");
    }
}
