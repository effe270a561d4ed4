//! Conversation repository trait.
//!
//! Defines the interface for durable conversation persistence.

use super::log::ConversationLog;
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;

/// A conversation read back from durable storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedConversation {
    /// File name (not path) the conversation was read from.
    pub filename: String,
    /// When the conversation was saved.
    pub saved_at: NaiveDateTime,
    /// The conversation itself, keyed by the file stem.
    pub log: ConversationLog,
}

/// An abstract repository for persisted conversations.
///
/// This trait decouples the conversation store from the specific storage
/// mechanism (flat JSON files, database, remote API).
///
/// # Implementation Notes
///
/// Persisted conversations are immutable history: `save` always creates a
/// new entry and never overwrites an existing one, even when two saves land in
/// the same second or come from different processes sharing the storage.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Persists a conversation and returns the name it was stored under.
    ///
    /// # Errors
    ///
    /// Returns `ChatdeskError::WriteFailure` if the data cannot be written.
    async fn save(&self, log: &ConversationLog) -> Result<String>;

    /// Loads a persisted conversation by name.
    ///
    /// # Errors
    ///
    /// - `ChatdeskError::NotFound`: nothing stored under `filename`
    /// - `ChatdeskError::CorruptData`: the stored content is not a conversation
    async fn load(&self, filename: &str) -> Result<SavedConversation>;

    /// Lists every readable persisted conversation.
    ///
    /// Entries that fail to parse are skipped (and logged), not returned as
    /// errors. Ordering is unspecified; callers sort.
    async fn list_all(&self) -> Result<Vec<SavedConversation>>;
}
