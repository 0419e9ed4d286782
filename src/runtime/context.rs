//! Terminal matcher states handed to recommendation builders

use std::path::PathBuf;
use std::sync::Arc;

use crate::parser::Token;
use crate::spec::{ArgumentSlot, CommandOption, SubcommandNode};
use crate::utils::Shell;

/// What drove the matcher to stop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextKind {
    /// Positioned after a subcommand or a flag, expecting anything the node accepts
    Subcommand {
        /// Every positional slot of the node has been filled
        args_exhausted: bool,
        /// At least one positional argument of the node was consumed
        args_used: bool,
    },
    /// Positioned inside an argument list, expecting a value for `slot`
    Argument {
        slot: ArgumentSlot,
        /// Every remaining slot can be skipped, so children and options are valid too
        remaining_optional: bool,
    },
}

/// Everything known about the position being completed
#[derive(Debug, Clone)]
pub struct SuggestionContext {
    pub kind: ContextKind,
    /// Innermost subcommand reached
    pub node: Arc<SubcommandNode>,
    /// Options inherited from ancestors
    pub persistent_options: Vec<Arc<CommandOption>>,
    /// The word being typed, `None` when nothing is left to type
    pub partial: Option<Token>,
    /// Words consumed since the last subcommand boundary, plus persistent ones
    pub accepted: Vec<Token>,
    /// Directory path suggestions are listed from
    pub cwd: PathBuf,
    pub shell: Shell,
}

impl SuggestionContext {
    /// Text candidates are filtered against
    ///
    /// For path-like words only the final segment counts.
    pub fn prefix(&self) -> &str {
        match &self.partial {
            Some(token) if token.is_path && token.is_path_complete => "",
            Some(token) if token.is_path => self.shell.path_basename(&token.text),
            Some(token) => &token.text,
            None => "",
        }
    }

    /// Node options followed by inherited ones not shadowed by a node option
    ///
    /// Listing keeps the node's declaration so each of its names is offered;
    /// matching a typed option still resolves inherited ones first
    /// (see [`find_option`](super::persistent::find_option)).
    pub fn available_options(&self) -> Vec<Arc<CommandOption>> {
        let mut options = self.node.options.clone();
        for inherited in &self.persistent_options {
            if !options.iter().any(|o| o.shares_name(inherited)) {
                options.push(Arc::clone(inherited));
            }
        }
        options
    }

    /// Whether `option` was already typed since the last boundary
    pub fn is_used(&self, option: &CommandOption) -> bool {
        self.accepted.iter().any(|t| t.is_option && option.matches(&t.text))
    }
}
