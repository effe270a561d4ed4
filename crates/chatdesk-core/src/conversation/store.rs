use super::log::ConversationLog;
use super::repository::ConversationRepository;
use crate::error::{ChatdeskError, Result};
use chrono::NaiveDateTime;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Id given to the log created when nothing is active yet.
pub const DEFAULT_CONVERSATION_ID: &str = "default";

/// Default number of characters shown in history previews.
pub const DEFAULT_PREVIEW_LEN: usize = 20;

/// One row of the saved-conversation history listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub filename: String,
    pub saved_at: NaiveDateTime,
    pub preview: String,
}

/// Owns every in-memory conversation and the active-chat pointer.
///
/// `ConversationStore` is responsible for:
/// - Lazily creating the default conversation
/// - Tracking which logs changed since their last save/load
/// - Auto-saving the active conversation when a new chat is started
/// - Loading saved conversations and listing history for the sidebar
///
/// All durable I/O goes through the injected [`ConversationRepository`], which
/// makes the store the sole writer of persisted files.
pub struct ConversationStore {
    logs: HashMap<String, ConversationLog>,
    active_id: Option<String>,
    modified: HashSet<String>,
    repository: Arc<dyn ConversationRepository>,
    preview_len: usize,
    next_chat_number: usize,
}

impl ConversationStore {
    /// Creates an empty store backed by `repository`.
    pub fn new(repository: Arc<dyn ConversationRepository>) -> Self {
        Self {
            logs: HashMap::new(),
            active_id: None,
            modified: HashSet::new(),
            repository,
            preview_len: DEFAULT_PREVIEW_LEN,
            next_chat_number: 1,
        }
    }

    /// Sets how many characters `list_saved` previews keep.
    pub fn with_preview_len(mut self, preview_len: usize) -> Self {
        self.preview_len = preview_len;
        self
    }

    /// Returns the active conversation id, if one has been created yet.
    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// Returns the log registered under `id`.
    pub fn log(&self, id: &str) -> Option<&ConversationLog> {
        self.logs.get(id)
    }

    /// Returns the active log, creating the default one if nothing is active.
    pub fn get_active(&mut self) -> &ConversationLog {
        let id = self.ensure_active();
        &self.logs[&id]
    }

    /// Mutable access to the active log, creating the default one if needed.
    pub fn get_active_mut(&mut self) -> &mut ConversationLog {
        let id = self.ensure_active();
        self.logs
            .entry(id.clone())
            .or_insert_with(|| ConversationLog::new(id))
    }

    /// Mutable access to the log registered under `id`.
    pub fn log_mut(&mut self, id: &str) -> Option<&mut ConversationLog> {
        self.logs.get_mut(id)
    }

    /// Flags `id` as changed since its last save or load.
    pub fn mark_modified(&mut self, id: &str) {
        if self.logs.contains_key(id) {
            self.modified.insert(id.to_string());
        }
    }

    pub fn is_modified(&self, id: &str) -> bool {
        self.modified.contains(id)
    }

    /// Empties the active log in place and clears its modified flag.
    pub fn reset_active(&mut self) {
        let id = self.ensure_active();
        if let Some(log) = self.logs.get_mut(&id) {
            log.clear();
        }
        self.modified.remove(&id);
    }

    /// Starts a fresh conversation and makes it active.
    ///
    /// The current active log is saved first when it is non-empty and
    /// modified.
    ///
    /// # Errors
    ///
    /// Returns `WriteFailure` if that auto-save fails. The store is left
    /// unchanged in that case, so the unsaved conversation stays active.
    pub async fn new_conversation(&mut self) -> Result<String> {
        if let Some(active_id) = self.active_id.clone() {
            let needs_save = self.is_modified(&active_id)
                && self.logs.get(&active_id).is_some_and(|log| !log.is_empty());
            if needs_save {
                let filename = self.save(&active_id).await?;
                tracing::info!(conversation = %active_id, %filename, "Auto-saved conversation before new chat");
            }
        }

        let id = self.next_chat_id();
        self.logs.insert(id.clone(), ConversationLog::new(id.clone()));
        self.modified.remove(&id);
        self.active_id = Some(id.clone());

        tracing::debug!(conversation = %id, "Started new conversation");
        Ok(id)
    }

    /// Persists the log registered under `id` and returns the file name.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no log has that id
    /// - `WriteFailure` if the repository cannot write it; the log stays in
    ///   memory with its modified flag untouched
    pub async fn save(&mut self, id: &str) -> Result<String> {
        let repository = Arc::clone(&self.repository);
        let log = self
            .logs
            .get(id)
            .ok_or_else(|| ChatdeskError::not_found("conversation", id))?;

        let filename = repository.save(log).await.map_err(|e| match e {
            ChatdeskError::WriteFailure { .. } => e,
            other => ChatdeskError::write_failure(id, other.to_string()),
        })?;

        self.modified.remove(id);
        tracing::info!(conversation = %id, %filename, messages = log.len(), "Saved conversation");
        Ok(filename)
    }

    /// Loads a saved conversation, registers it and makes it active.
    ///
    /// The new id is the file stem, suffixed when that id is already taken.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the file does not exist
    /// - `CorruptData` if it is not a valid conversation
    pub async fn load(&mut self, filename: &str) -> Result<String> {
        let saved = self.repository.load(filename).await?;

        let id = self.unique_id(saved.log.id());
        let log = ConversationLog::from_messages(id.clone(), saved.log.messages().to_vec());

        self.logs.insert(id.clone(), log);
        self.modified.remove(&id);
        self.active_id = Some(id.clone());

        tracing::info!(conversation = %id, %filename, "Loaded conversation");
        Ok(id)
    }

    /// Lists saved conversations, most recent first.
    ///
    /// Unreadable files are skipped by the repository and never reach the
    /// caller.
    pub async fn list_saved(&self) -> Result<Vec<ConversationSummary>> {
        let mut summaries: Vec<ConversationSummary> = self
            .repository
            .list_all()
            .await?
            .into_iter()
            .map(|saved| ConversationSummary {
                preview: saved.log.preview(self.preview_len),
                filename: saved.filename,
                saved_at: saved.saved_at,
            })
            .collect();

        summaries.sort_by(|a, b| {
            b.saved_at
                .cmp(&a.saved_at)
                .then_with(|| b.filename.cmp(&a.filename))
        });

        Ok(summaries)
    }

    fn ensure_active(&mut self) -> String {
        if let Some(id) = &self.active_id {
            if self.logs.contains_key(id) {
                return id.clone();
            }
        }

        let id = DEFAULT_CONVERSATION_ID.to_string();
        self.logs
            .entry(id.clone())
            .or_insert_with(|| ConversationLog::new(id.clone()));
        self.active_id = Some(id.clone());
        id
    }

    fn next_chat_id(&mut self) -> String {
        loop {
            let id = format!("chat_{}", self.next_chat_number);
            self.next_chat_number += 1;
            if !self.logs.contains_key(&id) {
                return id;
            }
        }
    }

    fn unique_id(&self, base: &str) -> String {
        if !self.logs.contains_key(base) {
            return base.to_string();
        }

        (1..)
            .map(|n| format!("{}_{}", base, n))
            .find(|candidate| !self.logs.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}
