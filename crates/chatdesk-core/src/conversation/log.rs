//! Conversation log: one ordered, append-only transcript.

use super::message::{Message, MessageKind, Sender, current_timestamp};
use serde::{Deserialize, Serialize};

/// Preview text returned for a log without a usable first message.
pub const NO_MESSAGE_PREVIEW: &str = "No message";

/// An ordered, append-only sequence of messages for one conversation thread.
///
/// Insertion order is the transcript order. Timestamps are non-decreasing:
/// `append` never stamps a message earlier than the one before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationLog {
    id: String,
    messages: Vec<Message>,
}

impl ConversationLog {
    /// Creates an empty log.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
        }
    }

    /// Rebuilds a log from already-ordered messages (used when loading).
    pub fn from_messages(id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            id: id.into(),
            messages,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends a message stamped with the current time and returns it.
    pub fn append(&mut self, sender: Sender, text: impl Into<String>, kind: MessageKind) -> Message {
        let mut timestamp = current_timestamp();
        if let Some(last) = self.messages.last() {
            // Wall clock may step backwards; keep the transcript ordered.
            timestamp = timestamp.max(last.timestamp());
        }

        let message = Message::new(sender, text, timestamp, kind);
        self.messages.push(message.clone());
        message
    }

    /// Returns the first message's text truncated to `max_len` characters.
    ///
    /// Returns [`NO_MESSAGE_PREVIEW`] for an empty log or a first message
    /// with no text.
    pub fn preview(&self, max_len: usize) -> String {
        match self.messages.first() {
            Some(first) if !first.text().is_empty() => first.text().chars().take(max_len).collect(),
            _ => NO_MESSAGE_PREVIEW.to_string(),
        }
    }

    /// Drops every message, keeping the id.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
