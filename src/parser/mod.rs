//! Command-line parsing
//!
//! Only word splitting lives here; understanding what the words mean is the
//! job of the grammar matcher in [`crate::runtime`].

mod lexer;

pub use lexer::{CommandLexer, Token};
