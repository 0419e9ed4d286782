//! Shellsuggest Library
//!
//! Grammar-driven completion suggestions for partially typed shell command
//! lines. Given the text left of the cursor, the engine walks the command's
//! grammar (subcommands, options, argument slots) and returns ranked
//! candidates plus the number of trailing characters a chosen candidate
//! replaces.
//!
//! # Modules
//!
//! - `catalog`: Grammar sources, root command list and per-root cache
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `error`: Error types and handling
//! - `formatter`: Output formatting and display
//! - `parser`: Command-line tokenizer
//! - `repl`: Interactive prompt with engine-driven completion
//! - `runtime`: Grammar matcher and the suggestion engine
//! - `spec`: Grammar model, documents, generators and lazy resolution
//! - `suggestion`: Suggestion candidates and recommendation builders
//! - `utils`: Shell flavors, path resolution and the shell probe
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use shellsuggest::{Catalog, DirectorySource, Shell, SuggestionEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = DirectorySource::open("/usr/share/shellsuggest/specs").await?;
//!     let engine = SuggestionEngine::new(Arc::new(Catalog::new(Arc::new(source))));
//!
//!     if let Some(result) = engine.get_suggestions("git che", Path::new("."), Shell::Bash).await? {
//!         for suggestion in &result.suggestions {
//!             println!("{}", suggestion.name);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod formatter;
pub mod parser;
pub mod repl;
pub mod runtime;
pub mod spec;
pub mod suggestion;
pub mod utils;

// Re-export commonly used types
pub use catalog::{Catalog, DirectorySource, MemorySource, SpecSource};
pub use config::Config;
pub use error::{Result, SuggestError};
pub use formatter::Formatter;
pub use parser::{CommandLexer, Token};
pub use repl::ReplEngine;
pub use runtime::SuggestionEngine;
pub use suggestion::{Suggestion, SuggestionKind, SuggestionResult};
pub use utils::Shell;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
