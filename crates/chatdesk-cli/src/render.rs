//! Terminal rendering of transcripts and history listings.

use chatdesk_core::conversation::{ConversationLog, ConversationSummary, Message, Sender};
use colored::Colorize;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `[YYYY-MM-DD HH:MM:SS] Sender: text`, uncolored.
pub fn format_message(message: &Message) -> String {
    format!(
        "[{}] {}: {}",
        message.timestamp().format(TIMESTAMP_FORMAT),
        message.sender().as_str(),
        message.text()
    )
}

/// One history row: `<n>. <saved_at>  <filename>  <preview>`, uncolored.
pub fn format_summary(index: usize, summary: &ConversationSummary) -> String {
    format!(
        "{:>3}. {}  {}  {}",
        index + 1,
        summary.saved_at.format(TIMESTAMP_FORMAT),
        summary.filename,
        summary.preview
    )
}

pub fn print_message(message: &Message) {
    let line = format_message(message);
    match message.sender() {
        Sender::User => println!("{}", line.green()),
        Sender::Assistant => println!("{}", line.bright_blue()),
    }
}

pub fn print_transcript(log: &ConversationLog) {
    println!("{}", format!("--- {} ---", log.id()).bright_magenta());
    if log.is_empty() {
        println!("{}", "(empty conversation)".bright_black());
    }
    for message in log.messages() {
        print_message(message);
    }
}

pub fn print_history(summaries: &[ConversationSummary]) {
    if summaries.is_empty() {
        println!("{}", "No saved conversations found".bright_black());
        return;
    }
    println!("{}", "### History".bright_magenta());
    for (index, summary) in summaries.iter().enumerate() {
        println!("{}", format_summary(index, summary));
    }
}

pub fn print_info(text: &str) {
    println!("{}", text.bright_black());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red());
}
