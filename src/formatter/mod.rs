//! Output formatting for suggestion results
//!
//! - JSON formatting (compact and pretty-printed)
//! - Table formatting for reading candidates in a terminal
//! - Plain formatting, one insertion value per line

mod json;
mod table;

pub use json::JsonFormatter;
pub use table::{TableFormatter, TableStyle};

use crate::config::{DisplayConfig, OutputFormat};
use crate::error::Result;
use crate::suggestion::SuggestionResult;

/// Main formatter for suggestion results
pub struct Formatter {
    format_type: OutputFormat,
    use_colors: bool,
    max_suggestions: usize,
}

impl Formatter {
    pub fn new(format_type: OutputFormat, use_colors: bool) -> Self {
        Self {
            format_type,
            use_colors,
            max_suggestions: usize::MAX,
        }
    }

    /// Formatter honoring the display section of the configuration
    pub fn from_config(config: &DisplayConfig) -> Self {
        Self {
            format_type: config.format,
            use_colors: config.color_output,
            max_suggestions: config.max_suggestions,
        }
    }

    /// Format a result, keeping at most `max_suggestions` candidates
    pub fn format(&self, result: &SuggestionResult) -> Result<String> {
        let truncated;
        let result = if result.suggestions.len() > self.max_suggestions {
            truncated = SuggestionResult {
                suggestions: result.suggestions[..self.max_suggestions].to_vec(),
                characters_to_drop: result.characters_to_drop,
            };
            &truncated
        } else {
            result
        };

        match self.format_type {
            OutputFormat::Json => JsonFormatter::new(false, false, 2).format(result),
            OutputFormat::JsonPretty => JsonFormatter::new(true, self.use_colors, 2).format(result),
            OutputFormat::Table => TableFormatter::with_colors(self.use_colors).format(result),
            OutputFormat::Plain => Ok(Self::format_plain(result)),
        }
    }

    fn format_plain(result: &SuggestionResult) -> String {
        result
            .suggestions
            .iter()
            .map(|s| s.insert_value.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn set_format(&mut self, format_type: OutputFormat) {
        self.format_type = format_type;
    }

    pub fn set_colors(&mut self, enabled: bool) {
        self.use_colors = enabled;
    }
}
