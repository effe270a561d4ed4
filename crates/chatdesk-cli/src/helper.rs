use std::borrow::Cow::{self, Borrowed, Owned};

use chatdesk_core::conversation::ConversationSummary;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use crate::commands::slash::{LOAD_USAGE, SLASH_COMMANDS};

/// rustyline helper for the chat prompt.
///
/// Completes `/` commands and, after `/load `, the file names from the last
/// `/history` listing. Hints show the rest of a command or the `/load` usage.
#[derive(Clone, Default)]
pub struct CliHelper {
    saved_files: Vec<String>,
}

impl CliHelper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remembers the file names of a `/history` listing for `/load` completion.
    pub fn set_saved(&mut self, listing: &[ConversationSummary]) {
        self.saved_files = listing.iter().map(|s| s.filename.clone()).collect();
    }

    /// Completion start offset and candidates for the text before the cursor.
    fn candidates(&self, line: &str) -> (usize, Vec<String>) {
        if !line.starts_with('/') {
            return (0, Vec::new());
        }

        match line.split_once(' ') {
            None => (
                0,
                SLASH_COMMANDS
                    .iter()
                    .filter(|cmd| cmd.starts_with(line))
                    .map(|cmd| cmd.to_string())
                    .collect(),
            ),
            Some(("/load", arg)) => {
                let arg = arg.trim_start();
                let start = line.len() - arg.len();
                let files = self
                    .saved_files
                    .iter()
                    .filter(|name| name.starts_with(arg))
                    .cloned()
                    .collect();
                (start, files)
            }
            Some(_) => (0, Vec::new()),
        }
    }

    /// Grey text shown after the cursor.
    fn hint_for(&self, line: &str) -> Option<String> {
        if line == "/load" || line == "/load " {
            let usage = LOAD_USAGE.trim_start_matches("/load");
            return Some(usage[line.len() - "/load".len()..].to_string());
        }

        let (start, candidates) = self.candidates(line);
        let typed = &line[start..];
        // Only hint when the completion is unambiguous
        match candidates.as_slice() {
            [only] if only.len() > typed.len() => Some(only[typed.len()..].to_string()),
            _ => None,
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, candidates) = self.candidates(&line[..pos]);
        let pairs = candidates
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, line: &str, _pos: usize, _forced: bool) -> bool {
        line.starts_with('/')
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        // Only hint at the end of the line
        if pos < line.len() {
            return None;
        }
        self.hint_for(line)
    }
}

impl Validator for CliHelper {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn helper_with_history(files: &[&str]) -> CliHelper {
        let saved_at = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let listing: Vec<ConversationSummary> = files
            .iter()
            .map(|name| ConversationSummary {
                filename: name.to_string(),
                saved_at,
                preview: String::new(),
            })
            .collect();
        let mut helper = CliHelper::new();
        helper.set_saved(&listing);
        helper
    }

    #[test]
    fn test_command_completion() {
        let helper = CliHelper::new();

        assert_eq!(helper.candidates("/s"), (0, vec!["/save".to_string(), "/show".to_string()]));
        assert_eq!(helper.candidates("/h").1, vec!["/history", "/help"]);
        assert_eq!(helper.candidates("hello"), (0, vec![]));
        assert_eq!(helper.candidates("/save now"), (0, vec![]));
    }

    #[test]
    fn test_load_completes_saved_files() {
        let helper = helper_with_history(&[
            "conversation_2025-01-02_10-00-00.json",
            "conversation_2025-01-01_09-30-00.json",
        ]);

        let (start, files) = helper.candidates("/load conversation_2025-01-02");
        assert_eq!(start, "/load ".len());
        assert_eq!(files, vec!["conversation_2025-01-02_10-00-00.json"]);

        let (start, files) = helper.candidates("/load  ");
        assert_eq!(start, "/load  ".len());
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_hints() {
        let helper = helper_with_history(&["conversation_2025-01-02_10-00-00.json"]);

        assert_eq!(helper.hint_for("/hi").as_deref(), Some("story"));
        // Ambiguous prefix: no hint
        assert_eq!(helper.hint_for("/s"), None);
        assert_eq!(helper.hint_for("/load").as_deref(), Some(" <number|filename>"));
        assert_eq!(helper.hint_for("/load ").as_deref(), Some("<number|filename>"));
        assert_eq!(
            helper.hint_for("/load conv").as_deref(),
            Some("ersation_2025-01-02_10-00-00.json")
        );
        assert_eq!(helper.hint_for("hello"), None);
    }
}
