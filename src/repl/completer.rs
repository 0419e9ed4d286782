//! Completer for reedline backed by the suggestion engine

use std::path::PathBuf;
use std::sync::Arc;

use reedline::{Completer, Span, Suggestion};

use super::{replace_start, suggest_blocking};
use crate::runtime::SuggestionEngine;
use crate::utils::Shell;

/// Tab completion for the interactive prompt
pub struct EngineCompleter {
    engine: Arc<SuggestionEngine>,
    cwd: PathBuf,
    shell: Shell,
}

impl EngineCompleter {
    pub fn new(engine: Arc<SuggestionEngine>, cwd: PathBuf, shell: Shell) -> Self {
        Self { engine, cwd, shell }
    }
}

impl Completer for EngineCompleter {
    /// Complete the text left of the cursor
    ///
    /// Each candidate replaces the trailing characters the engine reports
    /// as dropped, so the span ends at `pos`.
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let typed = &line[..pos];
        let Some(result) = suggest_blocking(&self.engine, typed, &self.cwd, self.shell) else {
            return Vec::new();
        };

        let start = replace_start(typed, result.characters_to_drop);
        let separators = self.shell.path_separators();
        result
            .suggestions
            .into_iter()
            .map(|candidate| Suggestion {
                append_whitespace: !candidate.insert_value.ends_with(separators),
                value: candidate.insert_value,
                description: candidate.description,
                span: Span::new(start, pos),
                ..Default::default()
            })
            .collect()
    }
}
