//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the root configuration
//! from the configuration file (~/.config/chatdesk/config.toml) and applies
//! environment overrides on top.

use crate::paths::ChatdeskPaths;
use anyhow::{Context, Result};
use chatdesk_core::{BackendKind, ChatdeskConfig};
use std::path::{Path, PathBuf};

/// Webhook URL of the remote workflow engine; selects the webhook backend.
pub const ENV_WEBHOOK_URL: &str = "CHATDESK_WEBHOOK_URL";
/// Fallback name used by n8n deployments.
pub const ENV_N8N_WEBHOOK_URL: &str = "N8N_WEBHOOK_URL";
/// Explicit backend choice (`stdio` or `webhook`).
pub const ENV_BACKEND: &str = "CHATDESK_BACKEND";
/// Path to the local agent's JSON config file.
pub const ENV_AGENT_CONFIG: &str = "CHATDESK_AGENT_CONFIG";
/// Base directory for saved conversations.
pub const ENV_DATA_DIR: &str = "CHATDESK_DATA_DIR";
/// Backend timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "CHATDESK_TIMEOUT_SECS";

/// Loads [`ChatdeskConfig`] from a TOML file plus environment variables.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Uses the platform config file (`~/.config/chatdesk/config.toml`).
    pub fn default_location() -> Result<Self> {
        let path = ChatdeskPaths::config_file()
            .map_err(|e| anyhow::anyhow!("Failed to get config path: {}", e))?;
        Ok(Self { path })
    }

    /// Uses an explicit config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the config file; a missing file yields defaults.
    pub fn load_file(&self) -> Result<ChatdeskConfig> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(ChatdeskConfig::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config file {}", self.path.display()))?;
        let config: ChatdeskConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", self.path.display()))?;
        if config.timeout_secs == 0 {
            anyhow::bail!(
                "Invalid config file {}: timeout_secs must be at least 1",
                self.path.display()
            );
        }
        Ok(config)
    }

    /// Loads the file, then applies process environment overrides.
    pub fn load(&self) -> Result<ChatdeskConfig> {
        let config = self.load_file()?;
        Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
    }
}

/// Applies environment overrides using `lookup` to read variables.
///
/// A webhook URL switches the backend to `webhook` unless `CHATDESK_BACKEND`
/// says otherwise. Unparsable values are logged and ignored.
pub fn apply_env_overrides<F>(mut config: ChatdeskConfig, lookup: F) -> ChatdeskConfig
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = non_empty(ENV_WEBHOOK_URL).or_else(|| non_empty(ENV_N8N_WEBHOOK_URL)) {
        config.webhook_url = Some(url);
        config.backend = BackendKind::Webhook;
    }

    if let Some(backend) = non_empty(ENV_BACKEND) {
        match backend.trim().to_lowercase().as_str() {
            "stdio" => config.backend = BackendKind::Stdio,
            "webhook" => config.backend = BackendKind::Webhook,
            other => tracing::warn!(value = %other, "Ignoring unknown {}", ENV_BACKEND),
        }
    }

    if let Some(path) = non_empty(ENV_AGENT_CONFIG) {
        config.agent_config = PathBuf::from(path);
    }

    if let Some(dir) = non_empty(ENV_DATA_DIR) {
        config.data_dir = Some(PathBuf::from(dir));
    }

    if let Some(secs) = non_empty(ENV_TIMEOUT_SECS) {
        match secs.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => config.timeout_secs = secs,
            _ => tracing::warn!(value = %secs, "Ignoring invalid {}", ENV_TIMEOUT_SECS),
        }
    }

    config
}
