//! Hinter for reedline - previews the best suggestion after the cursor

use std::path::PathBuf;
use std::sync::Arc;

use nu_ansi_term::{Color, Style};
use reedline::{Hinter, History};

use super::suggest_blocking;
use crate::runtime::SuggestionEngine;
use crate::utils::Shell;

/// Inline hint completing the in-progress word with the top candidate
pub struct SuggestionHinter {
    engine: Arc<SuggestionEngine>,
    cwd: PathBuf,
    shell: Shell,
    style: Style,
    current_hint: String,
}

impl SuggestionHinter {
    pub fn new(engine: Arc<SuggestionEngine>, cwd: PathBuf, shell: Shell) -> Self {
        Self {
            engine,
            cwd,
            shell,
            style: Style::new().italic().fg(Color::DarkGray),
            current_hint: String::new(),
        }
    }

    /// Remainder of the top candidate beyond what was already typed
    fn hint_for(&self, line: &str) -> Option<String> {
        let result = suggest_blocking(&self.engine, line, &self.cwd, self.shell)?;
        let top = result.suggestions.first()?;

        let typed_start = super::replace_start(line, result.characters_to_drop);
        let typed = &line[typed_start..];
        top.insert_value
            .strip_prefix(typed)
            .filter(|rest| !rest.is_empty())
            .map(str::to_string)
    }
}

impl Hinter for SuggestionHinter {
    fn handle(
        &mut self,
        line: &str,
        pos: usize,
        _history: &dyn History,
        use_ansi_coloring: bool,
        _cwd: &str,
    ) -> String {
        self.current_hint.clear();

        // Hints only make sense at the end of a word being typed
        if pos != line.len() || line.trim().is_empty() || line.ends_with(char::is_whitespace) {
            return String::new();
        }

        let Some(hint) = self.hint_for(line) else {
            return String::new();
        };
        self.current_hint = hint;

        if use_ansi_coloring {
            self.style.paint(&self.current_hint).to_string()
        } else {
            self.current_hint.clone()
        }
    }

    fn complete_hint(&self) -> String {
        self.current_hint.clone()
    }

    /// Hint text up to the next path separator, separator included
    fn next_hint_token(&self) -> String {
        let separators = self.shell.path_separators();
        match self.current_hint.find(separators) {
            Some(idx) => {
                let end = idx + self.current_hint[idx..].chars().next().map_or(0, char::len_utf8);
                self.current_hint[..end].to_string()
            }
            None => self.current_hint.clone(),
        }
    }
}
