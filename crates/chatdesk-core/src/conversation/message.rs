//! Conversation message types.
//!
//! This module contains types for representing messages in a conversation,
//! including senders and message kinds.

use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};

/// Represents who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sender {
    /// Message typed by the user.
    User,
    /// Reply produced by the backend (or a fallback on backend failure).
    Assistant,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "User",
            Sender::Assistant => "Assistant",
        }
    }

    /// The message kind normally paired with this sender.
    pub fn default_kind(&self) -> MessageKind {
        match self {
            Sender::User => MessageKind::UserMessage,
            Sender::Assistant => MessageKind::Response,
        }
    }
}

/// Distinguishes user input from backend responses in the persisted transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    UserMessage,
    Response,
}

/// A single message in a conversation log.
///
/// Messages are immutable once created. The timestamp is wall-clock local
/// time at second resolution, which is what the persisted format can hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    sender: Sender,
    text: String,
    timestamp: NaiveDateTime,
    kind: MessageKind,
}

impl Message {
    /// Creates a message with an explicit timestamp (sub-second part dropped).
    pub fn new(
        sender: Sender,
        text: impl Into<String>,
        timestamp: NaiveDateTime,
        kind: MessageKind,
    ) -> Self {
        Self {
            sender,
            text: text.into(),
            timestamp: timestamp.trunc_subsecs(0),
            kind,
        }
    }

    /// Creates a message stamped with the current local time.
    pub fn now(sender: Sender, text: impl Into<String>, kind: MessageKind) -> Self {
        Self::new(sender, text, current_timestamp(), kind)
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }
}

/// Current local wall-clock time at second resolution.
pub fn current_timestamp() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn test_new_drops_subseconds() {
        let ts = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_milli_opt(10, 20, 30, 450)
            .unwrap();
        let message = Message::new(Sender::User, "hi", ts, MessageKind::UserMessage);
        assert_eq!(message.timestamp().nanosecond(), 0);
        assert_eq!(message.timestamp().second(), 30);
    }

    #[test]
    fn test_default_kind_matches_sender() {
        assert_eq!(Sender::User.default_kind(), MessageKind::UserMessage);
        assert_eq!(Sender::Assistant.default_kind(), MessageKind::Response);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&MessageKind::UserMessage).unwrap();
        assert_eq!(json, "\"user_message\"");
    }
}
