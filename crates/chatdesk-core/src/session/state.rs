//! Session state types.

use crate::conversation::ConversationStore;
use serde::{Deserialize, Serialize};

/// Where the request cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionPhase {
    /// Waiting for user input.
    #[default]
    Idle,
    /// A query is in flight; further submits are ignored.
    Processing,
}

/// Everything one user session carries between interactions.
///
/// The front end re-enters the controller once per event; this struct is the
/// only place state survives between those re-entries.
pub struct SessionState {
    pub store: ConversationStore,
    pub phase: SessionPhase,
}

impl SessionState {
    pub fn new(store: ConversationStore) -> Self {
        Self {
            store,
            phase: SessionPhase::Idle,
        }
    }
}

/// Why a submit had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The query was empty or whitespace-only.
    EmptyInput,
    /// Another query is still in flight.
    Busy,
}

/// Result of one `submit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing changed.
    Ignored(IgnoreReason),
    /// The active conversation was emptied by the quit command.
    Reset,
    /// A user/assistant pair was appended.
    Replied {
        /// Text of the assistant message (the fallback text when `failed`).
        reply: String,
        /// True when the backend failed and `reply` is the fallback message.
        failed: bool,
    },
}
