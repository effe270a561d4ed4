//! WebhookRouter - forwards queries to a remote workflow engine over HTTP.
//!
//! Each query is POSTed as
//! `{"sessionId": "<32 hex>", "action": "sendMessage", "chatInput": "<query>"}`;
//! the session id is fixed for the lifetime of the router so the workflow can
//! keep per-conversation memory.

use crate::reply::extract_reply;
use async_trait::async_trait;
use chatdesk_core::{QueryRouter, RouterError};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

const SEND_MESSAGE_ACTION: &str = "sendMessage";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookRequest<'a> {
    session_id: &'a str,
    action: &'a str,
    chat_input: &'a str,
}

/// Router that talks to an HTTP webhook (n8n and compatible engines).
#[derive(Clone)]
pub struct WebhookRouter {
    client: Client,
    url: String,
    session_id: String,
    timeout: Duration,
}

impl WebhookRouter {
    /// Creates a router posting to `url`, with a fresh session id.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            session_id: Uuid::new_v4().simple().to_string(),
            timeout,
        }
    }

    /// The id sent with every request from this router.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[async_trait]
impl QueryRouter for WebhookRouter {
    async fn send(&self, query: &str) -> Result<String, RouterError> {
        let request = WebhookRequest {
            session_id: &self.session_id,
            action: SEND_MESSAGE_ACTION,
            chat_input: query,
        };

        tracing::debug!(url = %self.url, session_id = %self.session_id, "Posting query to webhook");

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RouterError::Timeout(self.timeout)
                } else {
                    RouterError::BackendUnavailable(format!("Webhook request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, url = %self.url, "Webhook returned error status");
            return Err(RouterError::BackendUnavailable(format!(
                "Webhook error ({}): {}",
                status, body
            )));
        }

        let body = response.text().await.map_err(|e| {
            RouterError::BackendUnavailable(format!("Failed to read webhook response: {}", e))
        })?;

        extract_reply(&body)
    }

    fn name(&self) -> &str {
        "webhook"
    }
}
