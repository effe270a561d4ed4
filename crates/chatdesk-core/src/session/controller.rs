use super::state::{IgnoreReason, SessionPhase, SessionState, SubmitOutcome};
use crate::conversation::{
    ConversationLog, ConversationStore, ConversationSummary, MessageKind, Sender,
};
use crate::error::{ChatdeskError, Result};
use crate::router::QueryRouter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Timeout applied to each backend call unless configured otherwise.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Input that empties the active conversation instead of being sent.
pub const QUIT_COMMAND: &str = "quit";

/// Drives one request cycle per user interaction.
///
/// `SessionController` is responsible for:
/// - Validating input and handling the quit command
/// - Appending the user message, calling the router, appending the reply
/// - Converting backend failures into an assistant fallback message
/// - Guarding against a second query while one is in flight
///
/// The state lock is not held while the router runs, so history browsing and
/// new-chat actions stay responsive during a slow backend call.
pub struct SessionController {
    state: Arc<RwLock<SessionState>>,
    router: Arc<dyn QueryRouter>,
    timeout: Duration,
}

impl SessionController {
    /// Creates a controller over `store`, answering queries with `router`.
    pub fn new(store: ConversationStore, router: Arc<dyn QueryRouter>) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::new(store))),
            router,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Overrides the per-query backend timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn router_name(&self) -> &str {
        self.router.name()
    }

    /// Current phase of the request cycle.
    pub async fn phase(&self) -> SessionPhase {
        self.state.read().await.phase
    }

    /// Id of the active conversation (creating the default one if needed).
    pub async fn active_id(&self) -> String {
        let mut state = self.state.write().await;
        state.store.get_active().id().to_string()
    }

    /// A copy of the active conversation for rendering.
    pub async fn snapshot(&self) -> ConversationLog {
        let mut state = self.state.write().await;
        state.store.get_active().clone()
    }

    /// A copy of any registered conversation.
    pub async fn conversation(&self, id: &str) -> Option<ConversationLog> {
        self.state.read().await.store.log(id).cloned()
    }

    /// Whether the active conversation has unsaved changes.
    pub async fn is_active_modified(&self) -> bool {
        let mut state = self.state.write().await;
        let id = state.store.get_active().id().to_string();
        state.store.is_modified(&id)
    }

    /// Submits one user query.
    ///
    /// Never fails: backend errors become an assistant message whose text
    /// starts with `Error:`, and the session returns to `Idle`.
    pub async fn submit(&self, query: &str) -> SubmitOutcome {
        let query = query.trim();

        let conversation_id = {
            let mut state = self.state.write().await;

            if state.phase == SessionPhase::Processing {
                tracing::debug!("Query dropped: another query is in flight");
                return SubmitOutcome::Ignored(IgnoreReason::Busy);
            }

            if query.is_empty() {
                return SubmitOutcome::Ignored(IgnoreReason::EmptyInput);
            }

            if query.eq_ignore_ascii_case(QUIT_COMMAND) {
                state.store.reset_active();
                tracing::info!("Active conversation reset by quit command");
                return SubmitOutcome::Reset;
            }

            state.phase = SessionPhase::Processing;
            let log = state.store.get_active_mut();
            log.append(Sender::User, query, MessageKind::UserMessage);
            log.id().to_string()
        };

        // Closes the cycle if this future is dropped before the reply lands
        let in_flight = InFlight {
            state: Arc::clone(&self.state),
            conversation_id: conversation_id.clone(),
            armed: true,
        };

        tracing::debug!(
            conversation = %conversation_id,
            router = self.router.name(),
            query_len = query.len(),
            "Sending query"
        );

        let result = match tokio::time::timeout(self.timeout, self.router.send(query)).await {
            Ok(reply) => reply.map_err(ChatdeskError::from),
            Err(_) => Err(ChatdeskError::Timeout {
                seconds: self.timeout.as_secs(),
            }),
        };

        let (reply, failed) = match result {
            Ok(reply) => (reply, false),
            Err(e) => {
                tracing::warn!(conversation = %conversation_id, error = %e, "Query failed");
                (format!("Error: {}", e), true)
            }
        };

        let mut state = self.state.write().await;
        in_flight.disarm();
        finish_cycle(&mut state, &conversation_id, &reply);

        SubmitOutcome::Replied { reply, failed }
    }

    /// Starts a new conversation, auto-saving the current one if modified.
    pub async fn new_conversation(&self) -> Result<String> {
        let mut state = self.state.write().await;
        state.store.new_conversation().await
    }

    /// Saves the active conversation and returns the file name.
    pub async fn save_active(&self) -> Result<String> {
        let mut state = self.state.write().await;
        let id = state.store.get_active().id().to_string();
        state.store.save(&id).await
    }

    /// Loads a saved conversation and makes it active.
    pub async fn load(&self, filename: &str) -> Result<String> {
        let mut state = self.state.write().await;
        state.store.load(filename).await
    }

    /// Lists saved conversations, most recent first.
    pub async fn list_saved(&self) -> Result<Vec<ConversationSummary>> {
        let state = self.state.read().await;
        state.store.list_saved().await
    }
}

/// Fallback reply recorded when a submit is dropped mid-cycle.
const ABANDONED_REPLY: &str = "Error: query abandoned before the backend replied";

/// Appends the assistant reply to the originating conversation and returns
/// the session to `Idle`.
fn finish_cycle(state: &mut SessionState, conversation_id: &str, reply: &str) {
    // The user may have switched chats meanwhile; the reply belongs to the
    // conversation the query came from.
    match state.store.log_mut(conversation_id) {
        Some(log) => {
            log.append(Sender::Assistant, reply, MessageKind::Response);
        }
        None => {
            tracing::warn!(conversation = %conversation_id, "Conversation vanished before reply");
        }
    }
    state.store.mark_modified(conversation_id);
    state.phase = SessionPhase::Idle;
}

/// Armed while a query is in flight. Dropping it armed (the submit future was
/// cancelled) records the fallback reply and releases the Processing phase.
struct InFlight {
    state: Arc<RwLock<SessionState>>,
    conversation_id: String,
    armed: bool,
}

impl InFlight {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::warn!(conversation = %self.conversation_id, "Query abandoned before the backend replied");

        if let Ok(mut state) = self.state.try_write() {
            finish_cycle(&mut state, &self.conversation_id, ABANDONED_REPLY);
            return;
        }

        // Lock is busy; finish from a task instead of blocking in drop
        let state = Arc::clone(&self.state);
        let conversation_id = std::mem::take(&mut self.conversation_id);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let mut state = state.write().await;
                    finish_cycle(&mut state, &conversation_id, ABANDONED_REPLY);
                });
            }
            Err(_) => {
                tracing::error!(conversation = %conversation_id, "No runtime to release the abandoned query");
            }
        }
    }
}
