//! Query router trait.
//!
//! Defines the single capability the session layer needs from a backend:
//! turn a query into a reply. Implementations live in `chatdesk-interaction`.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failures a [`QueryRouter`] may report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// The backend could not be reached, refused the request, or died.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend did not answer in time.
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The backend answered with something that contains no reply text.
    #[error("invalid reply: {0}")]
    InvalidReply(String),
}

/// An abstract backend that answers user queries.
///
/// The backend may be a long-lived local agent process or a remote workflow
/// engine; callers only rely on this contract.
///
/// # Implementation Notes
///
/// Implementations must either return a reply within a bounded time or fail
/// with [`RouterError::BackendUnavailable`] / [`RouterError::Timeout`]. They
/// must never block the caller indefinitely. The session controller applies
/// its own timeout on top of whatever the backend enforces.
#[async_trait]
pub trait QueryRouter: Send + Sync {
    /// Sends a query and returns the reply text.
    async fn send(&self, query: &str) -> Result<String, RouterError>;

    /// Short backend name for logs and status lines.
    fn name(&self) -> &str;
}
