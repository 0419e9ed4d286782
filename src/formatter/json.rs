//! JSON rendering of suggestion results
//!
//! Compact output stays uncolored so it can be piped into a shell
//! integration; pretty output is colored when the terminal allows it.

use colored_json::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::suggestion::SuggestionResult;

/// JSON formatter with pretty printing support
pub struct JsonFormatter {
    /// Enable pretty printing
    pretty: bool,

    /// Indentation width for pretty output
    indent: usize,

    /// Enable colored output
    use_colors: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool, use_colors: bool, indent: usize) -> Self {
        Self {
            pretty,
            indent,
            use_colors,
        }
    }

    /// Format a suggestion result as a JSON object
    pub fn format(&self, result: &SuggestionResult) -> Result<String> {
        if !self.pretty {
            return Ok(serde_json::to_string(result)?);
        }

        let json_str = self.to_pretty_string(result)?;
        if self.use_colors {
            Ok(json_str.to_colored_json_auto().unwrap_or(json_str))
        } else {
            Ok(json_str)
        }
    }

    fn to_pretty_string<T: Serialize>(&self, value: &T) -> Result<String> {
        let mut buf = Vec::new();
        let indent = " ".repeat(self.indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new(true, false, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestion::{Suggestion, SuggestionKind};

    fn sample() -> SuggestionResult {
        SuggestionResult {
            suggestions: vec![
                Suggestion::new("checkout", SuggestionKind::Subcommand)
                    .with_description(Some("Switch branches".to_string())),
            ],
            characters_to_drop: 2,
        }
    }

    #[test]
    fn test_compact_is_single_line() {
        let output = JsonFormatter::new(false, true, 2).format(&sample()).unwrap();
        assert!(!output.contains('\n'));
        assert!(output.contains("\"charactersToDrop\":2"));
        assert!(output.contains("\"description\":\"Switch branches\""));
    }

    #[test]
    fn test_pretty_uses_indent() {
        let output = JsonFormatter::new(true, false, 4).format(&sample()).unwrap();
        assert!(output.contains("\n    \"suggestions\""));
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["suggestions"][0]["name"], "checkout");
    }
}
