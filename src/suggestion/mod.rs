//! Suggestion candidates and the builders that produce them
//!
//! The matcher decides *where* the cursor is in the grammar; a
//! [`RecommendationBuilder`] decides *what* to offer there.

mod recommender;

pub use recommender::DefaultRecommender;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::runtime::SuggestionContext;

/// Priority of candidates that do not declare one
pub const DEFAULT_PRIORITY: u8 = 50;

/// What a candidate stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Subcommand,
    Option,
    Argument,
    Path,
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SuggestionKind::Subcommand => "subcommand",
            SuggestionKind::Option => "option",
            SuggestionKind::Argument => "argument",
            SuggestionKind::Path => "path",
        };
        f.write_str(name)
    }
}

/// One completion candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Text shown to the user
    pub name: String,
    /// Text inserted in place of the dropped characters
    pub insert_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub kind: SuggestionKind,
    pub priority: u8,
}

impl Suggestion {
    pub fn new(name: impl Into<String>, kind: SuggestionKind) -> Self {
        let name = name.into();
        Self {
            insert_value: name.clone(),
            name,
            description: None,
            kind,
            priority: DEFAULT_PRIORITY,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_priority(mut self, priority: Option<u8>) -> Self {
        self.priority = priority.unwrap_or(DEFAULT_PRIORITY);
        self
    }
}

/// Final answer for one command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResult {
    pub suggestions: Vec<Suggestion>,
    /// Trailing characters of the input a chosen candidate replaces
    pub characters_to_drop: usize,
}

/// Turns a matcher context into ordered candidates
#[async_trait]
pub trait RecommendationBuilder: Send + Sync {
    /// `None` when nothing may follow at this position
    async fn build(&self, ctx: &SuggestionContext) -> Option<Vec<Suggestion>>;
}
