//! Application configuration model.
//!
//! Loading lives in `chatdesk-infrastructure::config_service`; this module
//! only defines the shape and defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::conversation::DEFAULT_PREVIEW_LEN;

/// Which backend answers queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Long-lived local agent process spoken to over stdin/stdout.
    #[default]
    Stdio,
    /// Remote workflow engine reached through an HTTP webhook.
    Webhook,
}

/// Root configuration structure for config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatdeskConfig {
    pub backend: BackendKind,
    /// Webhook URL for the remote backend
    pub webhook_url: Option<String>,
    /// Path to the local agent's JSON config file
    pub agent_config: PathBuf,
    /// Base directory for saved conversations (None = platform data dir)
    pub data_dir: Option<PathBuf>,
    pub timeout_secs: u64,
    pub preview_len: usize,
}

impl Default for ChatdeskConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Stdio,
            webhook_url: None,
            agent_config: PathBuf::from("config.json"),
            data_dir: None,
            timeout_secs: 30,
            preview_len: DEFAULT_PREVIEW_LEN,
        }
    }
}

impl ChatdeskConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ChatdeskConfig = toml::from_str(
            r#"
backend = "webhook"
webhook_url = "http://localhost:5678/webhook/chat"
"#,
        )
        .unwrap();

        assert_eq!(config.backend, BackendKind::Webhook);
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("http://localhost:5678/webhook/chat")
        );
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.preview_len, DEFAULT_PREVIEW_LEN);
        assert_eq!(config.agent_config, PathBuf::from("config.json"));
    }
}
