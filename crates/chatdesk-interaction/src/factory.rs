use crate::stdio_agent_router::StdioAgentRouter;
use crate::webhook_router::WebhookRouter;
use anyhow::{Result, bail};
use chatdesk_core::{BackendKind, ChatdeskConfig, QueryRouter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Which backend to build, and with what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterConfig {
    Webhook { url: String, timeout: Duration },
    Stdio { agent_config: PathBuf },
}

impl RouterConfig {
    /// Derives the router settings from the application config.
    pub fn from_config(config: &ChatdeskConfig) -> Result<Self> {
        match config.backend {
            BackendKind::Webhook => {
                let Some(url) = config
                    .webhook_url
                    .as_deref()
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                else {
                    bail!(
                        "Webhook backend selected but no webhook_url configured \
                         (set CHATDESK_WEBHOOK_URL or webhook_url in config.toml)"
                    );
                };
                Ok(RouterConfig::Webhook {
                    url: url.to_string(),
                    timeout: config.timeout(),
                })
            }
            BackendKind::Stdio => Ok(RouterConfig::Stdio {
                agent_config: config.agent_config.clone(),
            }),
        }
    }
}

/// Builds the router described by `config`.
///
/// The stdio backend spawns its process here, so this must run inside a
/// tokio runtime.
pub fn build_router(config: &RouterConfig) -> Result<Arc<dyn QueryRouter>> {
    match config {
        RouterConfig::Webhook { url, timeout } => {
            tracing::info!(%url, "Using webhook backend");
            Ok(Arc::new(WebhookRouter::new(url.clone(), *timeout)))
        }
        RouterConfig::Stdio { agent_config } => {
            tracing::info!(config = %agent_config.display(), "Using local agent backend");
            Ok(Arc::new(StdioAgentRouter::from_config_file(agent_config)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_requires_url() {
        let config = ChatdeskConfig {
            backend: BackendKind::Webhook,
            webhook_url: Some("   ".to_string()),
            ..ChatdeskConfig::default()
        };
        assert!(RouterConfig::from_config(&config).is_err());
    }

    #[test]
    fn test_from_config() {
        let config = ChatdeskConfig {
            backend: BackendKind::Webhook,
            webhook_url: Some("http://localhost:5678/webhook/chat".to_string()),
            timeout_secs: 7,
            ..ChatdeskConfig::default()
        };
        assert_eq!(
            RouterConfig::from_config(&config).unwrap(),
            RouterConfig::Webhook {
                url: "http://localhost:5678/webhook/chat".to_string(),
                timeout: Duration::from_secs(7),
            }
        );

        let stdio = RouterConfig::from_config(&ChatdeskConfig::default()).unwrap();
        assert_eq!(
            stdio,
            RouterConfig::Stdio {
                agent_config: PathBuf::from("config.json")
            }
        );
    }

    #[tokio::test]
    async fn test_build_webhook_router() {
        let router = build_router(&RouterConfig::Webhook {
            url: "http://localhost:1/hook".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(router.name(), "webhook");
    }

    #[tokio::test]
    async fn test_build_stdio_router_with_missing_config_fails() {
        let result = build_router(&RouterConfig::Stdio {
            agent_config: PathBuf::from("/nonexistent/chatdesk/config.json"),
        });
        assert!(result.is_err());
    }
}
