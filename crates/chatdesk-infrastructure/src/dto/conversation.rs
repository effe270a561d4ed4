//! Conversation file DTOs and legacy-shape migration.
//!
//! Current format (the only one ever written):
//!
//! ```text
//! { "default": [ {"sender": "User", "message": "...",
//!                 "timestamp": "2025-01-01 12:00:00", "type": "user_message"}, ... ] }
//! ```
//!
//! Older front ends also wrote a bare array of messages, keyed the mapping
//! by something other than `default`, or left out `type`/`timestamp`. Those
//! shapes are accepted on load and normalized here.

use chatdesk_core::conversation::{ConversationLog, Message, MessageKind, Sender};
use chatdesk_core::{ChatdeskError, Result};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key under which the transcript is stored.
pub const CONVERSATION_KEY: &str = "default";

/// Timestamp format used inside conversation files.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// Message DTO
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SenderDto {
    #[serde(alias = "user")]
    User,
    #[serde(alias = "assistant", alias = "Bot", alias = "bot")]
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKindDto {
    UserMessage,
    Response,
}

/// One persisted message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDto {
    pub sender: SenderDto,
    /// Missing in some malformed legacy files.
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
    /// Absent before kinds were recorded; derived from `sender` then.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageKindDto>,
}

impl From<Sender> for SenderDto {
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::User => SenderDto::User,
            Sender::Assistant => SenderDto::Assistant,
        }
    }
}

impl From<SenderDto> for Sender {
    fn from(sender: SenderDto) -> Self {
        match sender {
            SenderDto::User => Sender::User,
            SenderDto::Assistant => Sender::Assistant,
        }
    }
}

impl From<MessageKind> for MessageKindDto {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::UserMessage => MessageKindDto::UserMessage,
            MessageKind::Response => MessageKindDto::Response,
        }
    }
}

impl From<MessageKindDto> for MessageKind {
    fn from(kind: MessageKindDto) -> Self {
        match kind {
            MessageKindDto::UserMessage => MessageKind::UserMessage,
            MessageKindDto::Response => MessageKind::Response,
        }
    }
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            sender: message.sender().into(),
            message: message.text().to_string(),
            timestamp: message.timestamp().format(TIMESTAMP_FORMAT).to_string(),
            kind: Some(message.kind().into()),
        }
    }
}

impl MessageDto {
    /// Converts to the domain message.
    ///
    /// An empty timestamp is replaced by `fallback`; an unparsable one is an
    /// error.
    fn into_domain(self, fallback: NaiveDateTime) -> std::result::Result<Message, String> {
        let sender = Sender::from(self.sender);
        let kind = self
            .kind
            .map(MessageKind::from)
            .unwrap_or_else(|| sender.default_kind());
        let timestamp = parse_timestamp(&self.timestamp, fallback)?;
        Ok(Message::new(sender, self.message, timestamp, kind))
    }
}

fn parse_timestamp(value: &str, fallback: NaiveDateTime) -> std::result::Result<NaiveDateTime, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(fallback);
    }

    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.naive_local()))
        .map_err(|_| format!("invalid timestamp '{}'", value))
}

// ============================================================================
// File DTOs
// ============================================================================

/// Current file shape, as written.
#[derive(Debug, Serialize)]
struct ConversationFileV1<'a> {
    default: &'a [MessageDto],
}

/// Every shape accepted on load.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConversationFileDto {
    Keyed(BTreeMap<String, Vec<MessageDto>>),
    Bare(Vec<MessageDto>),
}

impl ConversationFileDto {
    fn into_messages(self) -> std::result::Result<Vec<MessageDto>, String> {
        match self {
            ConversationFileDto::Bare(messages) => {
                tracing::debug!("Migrating bare-array conversation file");
                Ok(messages)
            }
            ConversationFileDto::Keyed(mut keyed) => {
                if let Some(messages) = keyed.remove(CONVERSATION_KEY) {
                    return Ok(messages);
                }
                match keyed.len() {
                    0 => Ok(Vec::new()),
                    1 => {
                        let (key, messages) = keyed.into_iter().next().unwrap_or_default();
                        tracing::debug!(key = %key, "Migrating conversation stored under legacy key");
                        Ok(messages)
                    }
                    n => Err(format!(
                        "expected a single conversation key, found {} ({})",
                        n,
                        keyed.keys().cloned().collect::<Vec<_>>().join(", ")
                    )),
                }
            }
        }
    }
}

/// Serializes a log into the current file format.
pub fn encode_conversation(log: &ConversationLog) -> Result<String> {
    let messages: Vec<MessageDto> = log.messages().iter().map(MessageDto::from).collect();
    serde_json::to_string_pretty(&ConversationFileV1 {
        default: &messages,
    })
    .map_err(|e| ChatdeskError::write_failure(log.id(), e.to_string()))
}

/// Parses file content in any accepted shape into messages.
///
/// `source_name` only labels errors; `fallback` stamps messages that carry no
/// timestamp.
pub fn decode_conversation(
    source_name: &str,
    content: &str,
    fallback: NaiveDateTime,
) -> Result<Vec<Message>> {
    let file: ConversationFileDto = serde_json::from_str(content)
        .map_err(|e| ChatdeskError::corrupt(source_name, e.to_string()))?;

    file.into_messages()
        .and_then(|messages| {
            messages
                .into_iter()
                .map(|dto| dto.into_domain(fallback))
                .collect::<std::result::Result<Vec<_>, _>>()
        })
        .map_err(|message| ChatdeskError::corrupt(source_name, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fallback() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_encode_uses_default_key_and_field_names() {
        let log = ConversationLog::from_messages(
            "default",
            vec![Message::new(
                Sender::User,
                "hello",
                fallback(),
                MessageKind::UserMessage,
            )],
        );

        let json: serde_json::Value = serde_json::from_str(&encode_conversation(&log).unwrap()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "default": [{
                    "sender": "User",
                    "message": "hello",
                    "timestamp": "2024-06-01 08:00:00",
                    "type": "user_message"
                }]
            })
        );
    }

    #[test]
    fn test_decode_bare_array_without_type() {
        let content = r#"[
            {"sender": "User", "message": "hi", "timestamp": "2024-01-02 03:04:05"},
            {"sender": "Assistant", "message": "hello"}
        ]"#;

        let messages = decode_conversation("legacy.json", content, fallback()).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].kind(), MessageKind::UserMessage);
        assert_eq!(messages[1].kind(), MessageKind::Response);
        assert_eq!(messages[1].timestamp(), fallback());
    }

    #[test]
    fn test_decode_single_legacy_key() {
        let content = r#"{"chat_1": [{"sender": "user", "message": "hi", "type": "user_message"}]}"#;
        let messages = decode_conversation("legacy.json", content, fallback()).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender(), Sender::User);
    }

    #[test]
    fn test_decode_missing_message_text() {
        let content = r#"{"default": [{"sender": "User", "timestamp": "2024-01-02 03:04:05"}]}"#;
        let messages = decode_conversation("x.json", content, fallback()).unwrap();
        assert_eq!(messages[0].text(), "");
    }

    #[test]
    fn test_decode_rfc3339_timestamp() {
        let content = r#"{"default": [{"sender": "User", "message": "a", "timestamp": "2024-01-02T03:04:05+00:00"}]}"#;
        let messages = decode_conversation("x.json", content, fallback()).unwrap();
        assert_eq!(
            messages[0].timestamp(),
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(3, 4, 5)
                .unwrap()
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        for content in [
            "not json",
            r#"{"default": "nope"}"#,
            r#"{"a": [], "b": []}"#,
            r#"{"default": [{"sender": "Robot", "message": "x"}]}"#,
            r#"{"default": [{"sender": "User", "message": "x", "timestamp": "yesterday"}]}"#,
        ] {
            let err = decode_conversation("bad.json", content, fallback()).unwrap_err();
            assert!(err.is_corrupt(), "expected CorruptData for {content}");
        }
    }
}
