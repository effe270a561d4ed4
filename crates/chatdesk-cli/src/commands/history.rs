//! Non-interactive history commands.

use anyhow::Result;
use chatdesk_core::ChatdeskConfig;

use crate::app::build_store;
use crate::render;

/// Prints saved conversations, newest first.
pub async fn list(config: &ChatdeskConfig) -> Result<()> {
    let store = build_store(config).await?;
    let summaries = store.list_saved().await?;
    render::print_history(&summaries);
    Ok(())
}

/// Prints the transcript stored in `filename`.
pub async fn show(config: &ChatdeskConfig, filename: &str) -> Result<()> {
    let mut store = build_store(config).await?;
    let id = store.load(filename).await?;
    if let Some(log) = store.log(&id) {
        render::print_transcript(log);
    }
    Ok(())
}
