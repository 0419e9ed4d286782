//! What survives a subcommand boundary
//!
//! Persistent options declared on an ancestor stay valid on every
//! descendant. Tokens consumed while matching such an option stay in the
//! accepted history; every other token is dropped when matching descends.

use std::sync::Arc;

use crate::parser::Token;
use crate::spec::CommandOption;

/// `current` plus every persistent option of `candidates` whose names are
/// not already taken
///
/// Options already in `current` win over later ones sharing an alias.
pub fn merge_persistent_options(
    current: &[Arc<CommandOption>],
    candidates: &[Arc<CommandOption>],
) -> Vec<Arc<CommandOption>> {
    let mut merged = current.to_vec();
    for option in candidates.iter().filter(|o| o.is_persistent) {
        if !merged.iter().any(|existing| existing.shares_name(option)) {
            merged.push(Arc::clone(option));
        }
    }
    merged
}

/// Tokens that were consumed as part of a persistent option
pub fn filter_persistent_tokens(tokens: Vec<Token>) -> Vec<Token> {
    tokens.into_iter().filter(|t| t.is_persistent).collect()
}

/// First option answering to `name`, inherited persistent options before node ones
pub fn find_option(
    name: &str,
    persistent: &[Arc<CommandOption>],
    local: &[Arc<CommandOption>],
) -> Option<Arc<CommandOption>> {
    persistent
        .iter()
        .chain(local)
        .find(|option| option.matches(name))
        .cloned()
}
