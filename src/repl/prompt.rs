//! Prompt showing the directory suggestions are computed for

use std::borrow::Cow;
use std::path::Path;

use reedline::{Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus};

pub struct SuggestPrompt {
    location: String,
}

impl SuggestPrompt {
    /// Prompt for `cwd`, with the home directory shortened to `~`
    pub fn new(cwd: &Path) -> Self {
        let location = match dirs::home_dir() {
            Some(home) => match cwd.strip_prefix(&home) {
                Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
                Ok(rest) => format!("~/{}", rest.display()),
                Err(_) => cwd.display().to_string(),
            },
            None => cwd.display().to_string(),
        };
        Self { location }
    }
}

impl Prompt for SuggestPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        format!("{}> ", self.location).into()
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        "".into()
    }

    fn render_prompt_indicator(&self, _prompt_mode: PromptEditMode) -> Cow<'_, str> {
        "".into()
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        "... ".into()
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };

        format!("({}reverse-search: {}) ", prefix, history_search.term).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_outside_home() {
        let prompt = SuggestPrompt::new(Path::new("/nonexistent-dir-for-tests/project"));
        assert_eq!(prompt.render_prompt_left(), "/nonexistent-dir-for-tests/project> ");
    }

    #[test]
    fn test_prompt_abbreviates_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let prompt = SuggestPrompt::new(&home.join("src"));
        assert_eq!(prompt.render_prompt_left(), "~/src> ");

        let prompt = SuggestPrompt::new(&home);
        assert_eq!(prompt.render_prompt_left(), "~> ");
    }

    #[test]
    fn test_right_prompt_and_indicator_empty() {
        let prompt = SuggestPrompt::new(Path::new("/tmp"));
        assert_eq!(prompt.render_prompt_right(), "");
        assert_eq!(prompt.render_prompt_indicator(PromptEditMode::Default), "");
        assert_eq!(prompt.render_prompt_multiline_indicator(), "... ");
    }
}
