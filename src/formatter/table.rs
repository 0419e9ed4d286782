//! Table formatting for suggestion lists using tabled

use tabled::{
    Table,
    builder::Builder,
    settings::{
        Alignment, Color, Modify, Style,
        object::{Columns, Rows},
        width::Width,
    },
};

use crate::error::Result;
use crate::suggestion::SuggestionResult;

/// Maximum width for the description column (characters)
const DEFAULT_MAX_DESCRIPTION_WIDTH: usize = 60;

const HEADER: [&str; 4] = ["name", "kind", "priority", "description"];

/// Table formatter for suggestion lists
pub struct TableFormatter {
    max_description_width: usize,
    style: TableStyle,
    use_colors: bool,
}

/// Available table styles
#[derive(Debug, Clone, Copy)]
pub enum TableStyle {
    Modern,
    Ascii,
    Psql,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self::with_colors(false)
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            max_description_width: DEFAULT_MAX_DESCRIPTION_WIDTH,
            style: TableStyle::Modern,
            use_colors,
        }
    }

    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_max_description_width(mut self, width: usize) -> Self {
        self.max_description_width = width;
        self
    }

    /// Render the candidates followed by a `charactersToDrop` footer
    pub fn format(&self, result: &SuggestionResult) -> Result<String> {
        let footer = format!("charactersToDrop: {}", result.characters_to_drop);
        if result.suggestions.is_empty() {
            return Ok(format!("(no suggestions)\n{footer}"));
        }

        let mut builder = Builder::default();
        builder.push_record(HEADER);
        for suggestion in &result.suggestions {
            builder.push_record([
                suggestion.name.clone(),
                suggestion.kind.to_string(),
                suggestion.priority.to_string(),
                suggestion.description.clone().unwrap_or_default(),
            ]);
        }

        let mut table = builder.build();
        self.apply_style(&mut table);
        table.with(
            Modify::new(Columns::new(3..=3)).with(Width::wrap(self.max_description_width)),
        );
        table.with(Modify::new(Rows::first()).with(Alignment::center()));
        if self.use_colors {
            table.modify(Rows::first(), Color::FG_CYAN | Color::BOLD);
        }

        Ok(format!("{table}\n{footer}"))
    }

    fn apply_style(&self, table: &mut Table) {
        match self.style {
            TableStyle::Modern => table.with(Style::modern()),
            TableStyle::Ascii => table.with(Style::ascii()),
            TableStyle::Psql => table.with(Style::psql()),
        };
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}
