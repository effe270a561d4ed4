//! Data transfer objects for persisted files.

pub mod conversation;

pub use conversation::{
    CONVERSATION_KEY, MessageDto, MessageKindDto, SenderDto, TIMESTAMP_FORMAT,
    decode_conversation, encode_conversation,
};
