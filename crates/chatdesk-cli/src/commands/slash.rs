//! REPL `/` commands.

/// Commands offered for completion, in display order.
pub const SLASH_COMMANDS: [&str; 7] = [
    "/new", "/save", "/history", "/load", "/show", "/help", "/exit",
];

/// Argument shape of `/load`, shown in errors and input hints.
pub const LOAD_USAGE: &str = "/load <number|filename>";

/// Reference to a saved conversation given to `/load`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadTarget {
    /// 1-based row number from the last `/history` listing.
    Index(usize),
    Filename(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    New,
    Save,
    History,
    Load(LoadTarget),
    Show,
    Help,
    Exit,
}

/// Why a `/` line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashError {
    Unknown(String),
    MissingArgument(&'static str),
}

impl std::fmt::Display for SlashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlashError::Unknown(name) => write!(f, "Unknown command: {} (try /help)", name),
            SlashError::MissingArgument(usage) => write!(f, "Usage: {}", usage),
        }
    }
}

/// Parses a REPL line.
///
/// Returns `None` for anything that is not a `/` command; those lines are
/// queries for the backend.
pub fn parse(line: &str) -> Option<Result<SlashCommand, SlashError>> {
    let line = line.trim();
    if !line.starts_with('/') {
        return None;
    }

    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (line, ""),
    };

    let command = match name.to_lowercase().as_str() {
        "/new" => Ok(SlashCommand::New),
        "/save" => Ok(SlashCommand::Save),
        "/history" => Ok(SlashCommand::History),
        "/show" => Ok(SlashCommand::Show),
        "/help" => Ok(SlashCommand::Help),
        "/exit" => Ok(SlashCommand::Exit),
        "/load" if arg.is_empty() => Err(SlashError::MissingArgument(LOAD_USAGE)),
        "/load" => Ok(SlashCommand::Load(match arg.parse::<usize>() {
            Ok(index) => LoadTarget::Index(index),
            Err(_) => LoadTarget::Filename(arg.to_string()),
        })),
        other => Err(SlashError::Unknown(other.to_string())),
    };

    Some(command)
}

pub fn help_text() -> &'static str {
    "\
/new                    Start a new chat (saves the current one if it changed)
/save                   Save the current chat
/history                List saved chats, newest first
/load <n|filename>      Load a saved chat by history number or file name
/show                   Print the current chat
/help                   Show this help
/exit                   Leave chatdesk
quit                    Clear the current chat"
}
