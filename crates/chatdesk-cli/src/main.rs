use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod app;
mod commands;
mod helper;
mod logging;
mod render;

use app::Overrides;

#[derive(Parser)]
#[command(name = "chatdesk")]
#[command(about = "Chatdesk - chat with a local agent or a workflow webhook, with saved history", long_about = None)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,

    /// Config file (default: ~/.config/chatdesk/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory holding the `conversations/` folder
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Use the webhook backend at this URL
    #[arg(long, global = true, value_name = "URL", conflicts_with = "agent_config")]
    webhook_url: Option<String>,

    /// Use the local agent described by this JSON file
    #[arg(long, global = true, value_name = "PATH")]
    agent_config: Option<PathBuf>,

    /// Backend timeout in seconds
    #[arg(long, global = true, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat (default)
    Chat,
    /// List saved conversations, newest first
    History,
    /// Print a saved conversation
    Show {
        /// File name as listed by `history`
        filename: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.debug);

    let overrides = Overrides {
        config_path: cli.config,
        data_dir: cli.data_dir,
        webhook_url: cli.webhook_url,
        agent_config: cli.agent_config,
        timeout_secs: cli.timeout,
    };
    let config = app::load_config(&overrides)?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let controller = app::build_controller(&config).await?;
            commands::repl::run(controller).await?
        }
        Commands::History => commands::history::list(&config).await?,
        Commands::Show { filename } => commands::history::show(&config, &filename).await?,
    }

    Ok(())
}
