//! Conversation domain module.
//!
//! # Module Structure
//!
//! - `message`: Message types (`Message`, `Sender`, `MessageKind`)
//! - `log`: Append-only transcript (`ConversationLog`)
//! - `repository`: Repository trait for durable persistence
//! - `store`: In-memory store with the active-chat pointer (`ConversationStore`)

mod log;
mod message;
mod repository;
mod store;

// Re-export public API
pub use log::{ConversationLog, NO_MESSAGE_PREVIEW};
pub use message::{Message, MessageKind, Sender, current_timestamp};
pub use repository::{ConversationRepository, SavedConversation};
pub use store::{
    ConversationStore, ConversationSummary, DEFAULT_CONVERSATION_ID, DEFAULT_PREVIEW_LEN,
};
