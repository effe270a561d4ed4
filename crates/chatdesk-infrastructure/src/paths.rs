//! Unified path management for chatdesk files.
//!
//! This ensures consistency across all platforms (Linux, macOS, Windows).

use std::path::{Path, PathBuf};

/// Name of the directory saved conversations are written into.
pub const CONVERSATIONS_DIR: &str = "conversations";

const APP_DIR: &str = "chatdesk";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for chatdesk.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/chatdesk/          # Config directory
/// └── config.toml              # Application configuration
///
/// ~/.local/share/chatdesk/     # Data directory
/// └── conversations/           # Saved conversations
///     └── conversation_YYYY-MM-DD_HH-MM-SS.json
/// ```
pub struct ChatdeskPaths;

impl ChatdeskPaths {
    /// Returns the chatdesk configuration directory (e.g., `~/.config/chatdesk/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the chatdesk data directory (e.g., `~/.local/share/chatdesk/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the conversations directory under `base_dir`.
    pub fn conversations_dir(base_dir: &Path) -> PathBuf {
        base_dir.join(CONVERSATIONS_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversations_dir() {
        let dir = ChatdeskPaths::conversations_dir(Path::new("/tmp/chatdesk"));
        assert_eq!(dir, PathBuf::from("/tmp/chatdesk/conversations"));
    }

    #[test]
    fn test_config_file() {
        // No home directory in some sandboxes; nothing to check then
        if let Ok(config_file) = ChatdeskPaths::config_file() {
            assert!(config_file.ends_with("config.toml"));
            let config_dir = ChatdeskPaths::config_dir().unwrap();
            assert!(config_file.starts_with(&config_dir));
            assert!(config_dir.ends_with("chatdesk"));
        }
    }
}
