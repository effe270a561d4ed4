//! Interactive chat loop.

use anyhow::Result;
use chatdesk_core::conversation::{ConversationSummary, Sender};
use chatdesk_core::session::{IgnoreReason, SessionController, SubmitOutcome};
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use super::slash::{self, LoadTarget, SlashCommand};
use crate::helper::CliHelper;
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Runs the REPL until `/exit`, Ctrl-D or a terminal error.
pub async fn run(controller: SessionController) -> Result<()> {
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Chatdesk ===".bright_magenta().bold());
    println!(
        "{}",
        format!(
            "Backend: {}. Type a message, '/help' for commands, 'quit' to clear the chat.",
            controller.router_name()
        )
        .bright_black()
    );
    println!();

    // Rows of the last /history listing, for `/load <n>`
    let mut last_listing: Vec<ConversationSummary> = Vec::new();

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                match slash::parse(trimmed) {
                    Some(Ok(command)) => {
                        if handle_command(&controller, command, &mut last_listing).await
                            == Flow::Exit
                        {
                            break;
                        }
                        if let Some(helper) = rl.helper_mut() {
                            helper.set_saved(&last_listing);
                        }
                    }
                    Some(Err(e)) => render::print_error(&e.to_string()),
                    None => submit(&controller, trimmed).await,
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/exit' to leave.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                render::print_error(&format!("Error: {:?}", err));
                break;
            }
        }
    }

    if controller.is_active_modified().await {
        render::print_info("Current chat has unsaved changes (not saved on exit).");
    }
    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

async fn submit(controller: &SessionController, query: &str) {
    render::print_info("...");

    match controller.submit(query).await {
        SubmitOutcome::Ignored(IgnoreReason::EmptyInput) => {}
        SubmitOutcome::Ignored(IgnoreReason::Busy) => {
            render::print_info("Still waiting for the previous reply; message dropped.");
        }
        SubmitOutcome::Reset => render::print_info("Conversation cleared."),
        SubmitOutcome::Replied { failed, .. } => {
            let log = controller.snapshot().await;
            let start = log.len().saturating_sub(2);
            for message in &log.messages()[start..] {
                if failed && message.sender() == Sender::Assistant {
                    render::print_error(&render::format_message(message));
                } else {
                    render::print_message(message);
                }
            }
        }
    }
}

async fn handle_command(
    controller: &SessionController,
    command: SlashCommand,
    last_listing: &mut Vec<ConversationSummary>,
) -> Flow {
    match command {
        SlashCommand::New => match controller.new_conversation().await {
            Ok(id) => render::print_info(&format!("Started {}", id)),
            Err(e) => render::print_error(&format!("Could not start a new chat: {}", e)),
        },
        SlashCommand::Save => match controller.save_active().await {
            Ok(filename) => render::print_info(&format!("Saved to {}", filename)),
            Err(e) => render::print_error(&format!("Save failed: {}", e)),
        },
        SlashCommand::History => match controller.list_saved().await {
            Ok(summaries) => {
                render::print_history(&summaries);
                *last_listing = summaries;
            }
            Err(e) => render::print_error(&format!("Could not list history: {}", e)),
        },
        SlashCommand::Load(target) => {
            let filename = match resolve_target(&target, last_listing) {
                Ok(filename) => filename,
                Err(message) => {
                    render::print_error(&message);
                    return Flow::Continue;
                }
            };
            match controller.load(&filename).await {
                Ok(_) => render::print_transcript(&controller.snapshot().await),
                Err(e) => render::print_error(&format!("Load failed: {}", e)),
            }
        }
        SlashCommand::Show => render::print_transcript(&controller.snapshot().await),
        SlashCommand::Help => println!("{}", slash::help_text()),
        SlashCommand::Exit => return Flow::Exit,
    }
    Flow::Continue
}

fn resolve_target(target: &LoadTarget, listing: &[ConversationSummary]) -> Result<String, String> {
    match target {
        LoadTarget::Filename(filename) => Ok(filename.clone()),
        LoadTarget::Index(index) => index
            .checked_sub(1)
            .and_then(|i| listing.get(i))
            .map(|summary| summary.filename.clone())
            .ok_or_else(|| format!("No history entry {}; run /history first", index)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn listing() -> Vec<ConversationSummary> {
        let saved_at = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        vec![ConversationSummary {
            filename: "conversation_2025-01-01_00-00-00.json".to_string(),
            saved_at,
            preview: "hi".to_string(),
        }]
    }

    #[test]
    fn test_resolve_target() {
        let listing = listing();

        assert_eq!(
            resolve_target(&LoadTarget::Index(1), &listing).unwrap(),
            "conversation_2025-01-01_00-00-00.json"
        );
        assert!(resolve_target(&LoadTarget::Index(0), &listing).is_err());
        assert!(resolve_target(&LoadTarget::Index(2), &listing).is_err());
        assert_eq!(
            resolve_target(&LoadTarget::Filename("x.json".to_string()), &[]).unwrap(),
            "x.json"
        );
    }
}
