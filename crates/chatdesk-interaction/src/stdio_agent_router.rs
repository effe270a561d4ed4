//! StdioAgentRouter - a long-lived local agent process spoken to over stdio.
//!
//! Protocol, one exchange per query:
//!
//! ```text
//! stdin  -> {"query": "<text>"}\n
//! stdout <- <reply line>\n
//! ```
//!
//! The reply line goes through [`extract_reply`], so agents may answer with
//! `{"output": ...}`, `{"response": ...}` or plain text. Anything the agent
//! writes to stderr is forwarded to `tracing::debug!`.

use crate::reply::extract_reply;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chatdesk_core::{QueryRouter, RouterError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

/// Local agent launch settings, read from the agent's JSON config file.
///
/// ```json
/// { "command": "python", "args": ["agent.py"], "env": {"MODEL": "deepseek"} }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProcessConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Added on top of the inherited environment.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl AgentProcessConfig {
    /// Reads the config from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read agent config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse agent config {}", path.display()))?;
        if config.command.trim().is_empty() {
            anyhow::bail!("Agent config {} has an empty command", path.display());
        }
        Ok(config)
    }
}

#[derive(Debug, Serialize)]
struct AgentRequest<'a> {
    query: &'a str,
}

struct AgentIo {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    /// Requests written whose reply has not been read yet. Non-zero only when
    /// a previous `send` was cancelled (e.g. by a timeout) mid-exchange.
    unanswered: usize,
}

impl AgentIo {
    /// Writes one request line. The request counts as unanswered once its
    /// bytes are written, so a send cancelled during flush still has its
    /// reply discarded later.
    async fn write_request(&mut self, line: &str) -> std::io::Result<()> {
        self.stdin.write_all(line.as_bytes()).await?;
        self.unanswered += 1;
        self.stdin.flush().await
    }

    async fn next_reply_line(&mut self) -> Result<String, RouterError> {
        loop {
            match self.stdout.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => return Ok(line),
                Ok(None) => {
                    return Err(RouterError::BackendUnavailable(
                        "agent process closed its output".to_string(),
                    ));
                }
                Err(e) => {
                    return Err(RouterError::BackendUnavailable(format!(
                        "Failed to read from agent: {}",
                        e
                    )));
                }
            }
        }
    }
}

/// Router backed by a child process that stays up for the whole session.
pub struct StdioAgentRouter {
    io: Mutex<AgentIo>,
    alive: Arc<AtomicBool>,
    child: Mutex<Child>,
    command: String,
}

impl StdioAgentRouter {
    /// Spawns the agent described by `config`.
    ///
    /// Must be called from within a tokio runtime (stderr is drained by a
    /// background task).
    pub fn spawn(config: &AgentProcessConfig) -> Result<Self> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().with_context(|| {
            format!(
                "Failed to spawn agent: {} {}",
                config.command,
                config.args.join(" ")
            )
        })?;

        let stdin = child.stdin.take().context("Failed to capture agent stdin")?;
        let stdout = child
            .stdout
            .take()
            .context("Failed to capture agent stdout")?;
        let stderr = child
            .stderr
            .take()
            .context("Failed to capture agent stderr")?;

        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    tracing::debug!(target: "agent_stderr", "{trimmed}");
                }
            }
        });

        tracing::info!(command = %config.command, pid = ?child.id(), "Spawned local agent");

        Ok(Self {
            io: Mutex::new(AgentIo {
                stdin,
                stdout: BufReader::new(stdout).lines(),
                unanswered: 0,
            }),
            alive: Arc::new(AtomicBool::new(true)),
            child: Mutex::new(child),
            command: config.command.clone(),
        })
    }

    /// Reads the JSON config at `path` and spawns the agent it describes.
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let config = AgentProcessConfig::load(path)?;
        Self::spawn(&config)
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Kills the agent process.
    pub async fn close(&self) {
        self.alive.store(false, Ordering::SeqCst);
        let mut child = self.child.lock().await;
        if let Err(e) = child.kill().await {
            tracing::debug!(command = %self.command, error = %e, "Agent already stopped");
        }
    }

    fn mark_dead(&self, error: RouterError) -> RouterError {
        self.alive.store(false, Ordering::SeqCst);
        tracing::warn!(command = %self.command, error = %error, "Local agent is gone");
        error
    }
}

#[async_trait]
impl QueryRouter for StdioAgentRouter {
    async fn send(&self, query: &str) -> Result<String, RouterError> {
        if !self.is_alive() {
            return Err(RouterError::BackendUnavailable(format!(
                "agent '{}' is not running",
                self.command
            )));
        }

        let mut io = self.io.lock().await;

        // Discard replies to cancelled requests so this one reads its own
        while io.unanswered > 0 {
            let stale = io.next_reply_line().await.map_err(|e| self.mark_dead(e))?;
            io.unanswered -= 1;
            tracing::debug!(reply_len = stale.len(), "Discarded stale agent reply");
        }

        let mut line = serde_json::to_string(&AgentRequest { query })
            .map_err(|e| RouterError::InvalidReply(format!("Failed to encode query: {}", e)))?;
        line.push('\n');

        if let Err(e) = io.write_request(&line).await {
            return Err(self.mark_dead(RouterError::BackendUnavailable(format!(
                "Failed to write to agent: {}",
                e
            ))));
        }

        let reply = io.next_reply_line().await.map_err(|e| self.mark_dead(e))?;
        io.unanswered -= 1;

        extract_reply(&reply)
    }

    fn name(&self) -> &str {
        "stdio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"command": "python", "args": ["agent.py"], "env": {"MODEL": "x"}}"#,
        )
        .unwrap();

        let config = AgentProcessConfig::load(&path).unwrap();

        assert_eq!(config.command, "python");
        assert_eq!(config.args, vec!["agent.py".to_string()]);
        assert_eq!(config.env.get("MODEL").map(String::as_str), Some("x"));
    }

    #[test]
    fn test_load_config_defaults_and_errors() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        std::fs::write(&path, r#"{"command": "agent"}"#).unwrap();
        let config = AgentProcessConfig::load(&path).unwrap();
        assert!(config.args.is_empty());
        assert!(config.env.is_empty());

        std::fs::write(&path, r#"{"command": "  "}"#).unwrap();
        assert!(AgentProcessConfig::load(&path).is_err());

        assert!(AgentProcessConfig::load(&temp_dir.path().join("missing.json")).is_err());
    }

    #[tokio::test]
    async fn test_written_request_counts_as_unanswered() {
        // Agent that reads queries and never replies
        let router = StdioAgentRouter::spawn(&AgentProcessConfig {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), "cat > /dev/null".to_string()],
            env: HashMap::new(),
        })
        .unwrap();

        let result =
            tokio::time::timeout(std::time::Duration::from_millis(200), router.send("hello"))
                .await;
        assert!(result.is_err());

        assert_eq!(router.io.lock().await.unanswered, 1);
        assert!(router.is_alive());
        router.close().await;
    }

    #[test]
    fn test_request_line() {
        let line = serde_json::to_string(&AgentRequest { query: "say \"hi\"" }).unwrap();
        assert_eq!(line, r#"{"query":"say \"hi\""}"#);
    }
}
