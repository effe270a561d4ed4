//! Wiring: configuration, repository, router, controller.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chatdesk_core::conversation::ConversationStore;
use chatdesk_core::session::SessionController;
use chatdesk_core::{BackendKind, ChatdeskConfig};
use chatdesk_infrastructure::{AsyncDirConversationRepository, ConfigService};
use chatdesk_interaction::{RouterConfig, build_router};

/// Command-line overrides, applied after the config file and environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub webhook_url: Option<String>,
    pub agent_config: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

pub fn load_config(overrides: &Overrides) -> Result<ChatdeskConfig> {
    let service = match &overrides.config_path {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::default_location()?,
    };
    let mut config = service.load()?;
    apply_overrides(&mut config, overrides);
    tracing::debug!(?config, path = %service.path().display(), "Loaded configuration");
    Ok(config)
}

fn apply_overrides(config: &mut ChatdeskConfig, overrides: &Overrides) {
    if let Some(dir) = &overrides.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if let Some(url) = &overrides.webhook_url {
        config.webhook_url = Some(url.clone());
        config.backend = BackendKind::Webhook;
    }
    if let Some(path) = &overrides.agent_config {
        config.agent_config = path.clone();
        config.backend = BackendKind::Stdio;
    }
    match overrides.timeout_secs {
        Some(0) => tracing::warn!("Ignoring zero timeout override"),
        Some(secs) => config.timeout_secs = secs,
        None => {}
    }
}

pub async fn build_store(config: &ChatdeskConfig) -> Result<ConversationStore> {
    let repository = match &config.data_dir {
        Some(dir) => AsyncDirConversationRepository::new(dir).await?,
        None => AsyncDirConversationRepository::default_location().await?,
    };
    tracing::debug!(dir = %repository.conversations_dir().display(), "Conversation directory");

    Ok(ConversationStore::new(Arc::new(repository)).with_preview_len(config.preview_len))
}

pub async fn build_controller(config: &ChatdeskConfig) -> Result<SessionController> {
    let store = build_store(config).await?;
    let router_config = RouterConfig::from_config(config)?;
    let router = build_router(&router_config).context("Failed to start backend")?;

    Ok(SessionController::new(store, router).with_timeout(config.timeout()))
}
