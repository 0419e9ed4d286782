//! Error handling for suggestion operations.
//!
//! Failing to find a suggestion is not an error. The types here cover:
//! - Catalog loading failures (missing or malformed grammars)
//! - Configuration problems
//! - Shell probe failures
//! - Broken matcher invariants (`SuggestError::InvalidState`)

pub mod kinds;

// Re-export commonly used types
pub use kinds::{CatalogError, ConfigError, ProbeError, Result, SuggestError};
