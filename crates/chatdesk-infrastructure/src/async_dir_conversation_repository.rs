//! Directory-of-JSON-files ConversationRepository implementation.
//!
//! Every save creates a new `conversation_<timestamp>.json` file. Files are
//! opened with `create_new`, so two saves in the same second (from this or
//! another process sharing the directory) never overwrite each other: the
//! loser retries with a `_1`, `_2`, ... suffix.

use crate::dto::{decode_conversation, encode_conversation};
use crate::paths::ChatdeskPaths;
use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use chatdesk_core::conversation::{
    ConversationLog, ConversationRepository, SavedConversation, current_timestamp,
};
use chatdesk_core::{ChatdeskError, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const FILE_PREFIX: &str = "conversation_";
const FILE_EXTENSION: &str = ".json";
const FILENAME_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Builds the file name for a save at `saved_at` with collision counter `n`.
pub fn conversation_file_name(saved_at: NaiveDateTime, n: usize) -> String {
    let stamp = saved_at.format(FILENAME_TIMESTAMP_FORMAT);
    if n == 0 {
        format!("{}{}{}", FILE_PREFIX, stamp, FILE_EXTENSION)
    } else {
        format!("{}{}_{}{}", FILE_PREFIX, stamp, n, FILE_EXTENSION)
    }
}

/// Recovers the save time encoded in a conversation file name.
pub fn parse_saved_at(filename: &str) -> Option<NaiveDateTime> {
    let stamp = filename
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_EXTENSION)?
        .get(..19)?;
    NaiveDateTime::parse_from_str(stamp, FILENAME_TIMESTAMP_FORMAT).ok()
}

/// Flat-file conversation repository.
///
/// Directory structure:
/// ```text
/// base_dir/
/// └── conversations/
///     ├── conversation_2025-01-01_12-00-00.json
///     └── conversation_2025-01-01_12-00-00_1.json
/// ```
pub struct AsyncDirConversationRepository {
    dir: PathBuf,
}

impl AsyncDirConversationRepository {
    /// Creates a repository at the default location (platform data dir).
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be determined or created.
    pub async fn default_location() -> AnyResult<Self> {
        let base_dir = ChatdeskPaths::data_dir()
            .map_err(|e| anyhow::anyhow!("Failed to get data directory: {}", e))?;
        Self::new(base_dir).await
    }

    /// Creates a repository storing files under `base_dir/conversations`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn new(base_dir: impl AsRef<Path>) -> AnyResult<Self> {
        let dir = ChatdeskPaths::conversations_dir(base_dir.as_ref());

        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create conversations directory {}", dir.display()))?;

        Ok(Self { dir })
    }

    /// Returns the directory conversation files live in.
    pub fn conversations_dir(&self) -> &Path {
        &self.dir
    }

    fn resolve(&self, filename: &str) -> Result<PathBuf> {
        // Only bare names inside the conversations directory are addressable
        let is_bare_name = Path::new(filename)
            .file_name()
            .is_some_and(|name| name == filename);
        if !is_bare_name {
            return Err(ChatdeskError::not_found("conversation file", filename));
        }
        Ok(self.dir.join(filename))
    }

    async fn write_new_file(&self, content: &str) -> Result<String> {
        // Recreate on demand in case the directory was removed after startup
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            ChatdeskError::write_failure(self.dir.display().to_string(), e.to_string())
        })?;

        let saved_at = Local::now().naive_local();

        for n in 0..MAX_NAME_ATTEMPTS {
            let filename = conversation_file_name(saved_at, n);
            let path = self.dir.join(&filename);

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!(%filename, "Conversation file name taken, trying next suffix");
                    continue;
                }
                Err(e) => return Err(ChatdeskError::write_failure(filename, e.to_string())),
            };

            let written = match file.write_all(content.as_bytes()).await {
                Ok(()) => file.sync_all().await,
                Err(e) => Err(e),
            };

            if let Err(e) = written {
                // Don't leave a truncated file behind for list_all to trip on
                let _ = fs::remove_file(&path).await;
                return Err(ChatdeskError::write_failure(filename, e.to_string()));
            }

            return Ok(filename);
        }

        Err(ChatdeskError::write_failure(
            conversation_file_name(saved_at, 0),
            format!("no free file name after {} attempts", MAX_NAME_ATTEMPTS),
        ))
    }

    async fn saved_at_for(&self, filename: &str, path: &Path) -> NaiveDateTime {
        if let Some(saved_at) = parse_saved_at(filename) {
            return saved_at;
        }

        match fs::metadata(path).await.and_then(|m| m.modified()) {
            Ok(modified) => DateTime::<Local>::from(modified).naive_local(),
            Err(_) => current_timestamp(),
        }
    }
}

#[async_trait]
impl ConversationRepository for AsyncDirConversationRepository {
    async fn save(&self, log: &ConversationLog) -> Result<String> {
        let content = encode_conversation(log)?;
        let filename = self.write_new_file(&content).await?;
        tracing::debug!(conversation = %log.id(), %filename, dir = %self.dir.display(), "Wrote conversation file");
        Ok(filename)
    }

    async fn load(&self, filename: &str) -> Result<SavedConversation> {
        let path = self.resolve(filename)?;

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ChatdeskError::not_found("conversation file", filename));
            }
            // Non-UTF-8 content is a corrupt file, not an I/O problem
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(ChatdeskError::corrupt(filename, e.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let saved_at = self.saved_at_for(filename, &path).await;
        let messages = decode_conversation(filename, &content, saved_at)?;
        let stem = filename.strip_suffix(FILE_EXTENSION).unwrap_or(filename);

        Ok(SavedConversation {
            filename: filename.to_string(),
            saved_at,
            log: ConversationLog::from_messages(stem, messages),
        })
    }

    async fn list_all(&self) -> Result<Vec<SavedConversation>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut conversations = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !filename.ends_with(FILE_EXTENSION) {
                continue;
            }

            match self.load(&filename).await {
                Ok(saved) => conversations.push(saved),
                Err(e) => {
                    tracing::warn!(%filename, error = %e, "Skipping unreadable conversation file");
                    // Continue loading other conversations
                }
            }
        }

        Ok(conversations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatdesk_core::conversation::{MessageKind, Sender};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_log() -> ConversationLog {
        let mut log = ConversationLog::new("default");
        log.append(Sender::User, "Hello", MessageKind::UserMessage);
        log.append(Sender::Assistant, "Hi there!", MessageKind::Response);
        log
    }

    #[test]
    fn test_file_name_round_trip() {
        let ts = NaiveDate::from_ymd_opt(2025, 2, 3)
            .unwrap()
            .and_hms_opt(4, 5, 6)
            .unwrap();

        assert_eq!(
            conversation_file_name(ts, 0),
            "conversation_2025-02-03_04-05-06.json"
        );
        assert_eq!(
            conversation_file_name(ts, 2),
            "conversation_2025-02-03_04-05-06_2.json"
        );
        assert_eq!(parse_saved_at("conversation_2025-02-03_04-05-06.json"), Some(ts));
        assert_eq!(parse_saved_at("conversation_2025-02-03_04-05-06_2.json"), Some(ts));
        assert_eq!(parse_saved_at("notes.json"), None);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let repository = AsyncDirConversationRepository::new(temp_dir.path())
            .await
            .unwrap();
        let log = create_test_log();

        let filename = repository.save(&log).await.unwrap();
        let loaded = repository.load(&filename).await.unwrap();

        assert_eq!(loaded.filename, filename);
        assert_eq!(loaded.log.messages(), log.messages());
        assert_eq!(loaded.log.id(), filename.trim_end_matches(".json"));
    }

    #[tokio::test]
    async fn test_same_second_saves_do_not_collide() {
        let temp_dir = TempDir::new().unwrap();
        let repository = AsyncDirConversationRepository::new(temp_dir.path())
            .await
            .unwrap();
        let log = create_test_log();

        let mut names = Vec::new();
        for _ in 0..5 {
            names.push(repository.save(&log).await.unwrap());
        }
        names.sort();
        names.dedup();

        assert_eq!(names.len(), 5);
        assert_eq!(repository.list_all().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_list_all_skips_corrupt_files() {
        let temp_dir = TempDir::new().unwrap();
        let repository = AsyncDirConversationRepository::new(temp_dir.path())
            .await
            .unwrap();
        repository.save(&create_test_log()).await.unwrap();

        let dir = repository.conversations_dir();
        std::fs::write(dir.join("conversation_2020-01-01_00-00-00.json"), "{ broken").unwrap();
        std::fs::write(dir.join("readme.txt"), "not a conversation").unwrap();

        let listed = repository.list_all().await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_and_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let repository = AsyncDirConversationRepository::new(temp_dir.path())
            .await
            .unwrap();
        std::fs::write(
            repository.conversations_dir().join("bad.json"),
            r#"{"default": 42}"#,
        )
        .unwrap();

        assert!(repository.load("nope.json").await.unwrap_err().is_not_found());
        assert!(repository.load("bad.json").await.unwrap_err().is_corrupt());
        assert!(repository
            .load("../escape.json")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_legacy_file_without_timestamp_uses_file_name_time() {
        let temp_dir = TempDir::new().unwrap();
        let repository = AsyncDirConversationRepository::new(temp_dir.path())
            .await
            .unwrap();
        let filename = "conversation_2023-05-06_07-08-09.json";
        std::fs::write(
            repository.conversations_dir().join(filename),
            r#"[{"sender": "User", "message": "old"}]"#,
        )
        .unwrap();

        let loaded = repository.load(filename).await.unwrap();

        let expected = NaiveDate::from_ymd_opt(2023, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        assert_eq!(loaded.saved_at, expected);
        assert_eq!(loaded.log.messages()[0].timestamp(), expected);
    }
}
