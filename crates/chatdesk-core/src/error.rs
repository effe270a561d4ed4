//! Error types for the Chatdesk application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::router::RouterError;

/// A shared error type for the entire Chatdesk application.
///
/// Every backend and I/O failure is converted into one of these variants at the
/// SessionController/ConversationStore boundary, so front ends can render them
/// as text instead of aborting the session.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatdeskError {
    /// The query backend could not be reached or failed to answer
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The query backend did not answer within the configured timeout
    #[error("Backend timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// A persisted conversation could not be parsed
    #[error("Corrupt conversation data in '{source_name}': {message}")]
    CorruptData {
        source_name: String,
        message: String,
    },

    /// A conversation could not be written to durable storage
    #[error("Failed to write '{target}': {message}")]
    WriteFailure { target: String, message: String },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },
}

impl ChatdeskError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a CorruptData error
    pub fn corrupt(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptData {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Creates a WriteFailure error
    pub fn write_failure(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteFailure {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a CorruptData error
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptData { .. })
    }

    /// Check if this is a WriteFailure error
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Self::WriteFailure { .. })
    }

    /// Check if this error came from the query backend.
    ///
    /// Returns true for `BackendUnavailable` and `Timeout`, the two failures a
    /// user can resolve by resubmitting.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_) | Self::Timeout { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ChatdeskError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ChatdeskError {
    fn from(err: serde_json::Error) -> Self {
        Self::CorruptData {
            source_name: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<RouterError> for ChatdeskError {
    fn from(err: RouterError) -> Self {
        match err {
            RouterError::Timeout(duration) => Self::Timeout {
                seconds: duration.as_secs(),
            },
            RouterError::BackendUnavailable(message) => Self::BackendUnavailable(message),
            RouterError::InvalidReply(message) => {
                Self::BackendUnavailable(format!("invalid reply: {}", message))
            }
        }
    }
}

/// A type alias for `Result<T, ChatdeskError>`.
pub type Result<T> = std::result::Result<T, ChatdeskError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_router_timeout_maps_to_timeout() {
        let err: ChatdeskError = RouterError::Timeout(Duration::from_secs(30)).into();
        assert_eq!(err, ChatdeskError::Timeout { seconds: 30 });
        assert!(err.is_backend());
        assert_eq!(err.to_string(), "Backend timed out after 30s");
    }

    #[test]
    fn test_json_error_is_corrupt() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ChatdeskError = parse_err.into();
        assert!(err.is_corrupt());
        assert!(!err.is_backend());
    }

    #[test]
    fn test_io_error_keeps_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ChatdeskError = io.into();
        match err {
            ChatdeskError::Io { message } => assert!(message.contains("PermissionDenied")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
