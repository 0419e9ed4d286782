//! Default recommendation builder
//!
//! Offers what the grammar allows at the matcher's stopping point:
//!
//! - **Subcommand position**: children, options not yet used, and values of
//!   the node's first argument slot
//! - **Argument position**: values of the current slot, plus children and
//!   options when every remaining slot may be skipped
//!
//! Slot values come from static suggestions, path templates (a listing of
//! the resolved working directory) and, for command slots, the catalog's
//! root commands.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashSet;

use super::{RecommendationBuilder, Suggestion, SuggestionKind};
use crate::runtime::{ContextKind, SuggestionContext};
use crate::spec::{ArgumentSlot, Template};

/// Builder driven purely by the grammar and the filesystem
#[derive(Debug, Clone, Default)]
pub struct DefaultRecommender {
    commands: Vec<String>,
}

impl DefaultRecommender {
    /// `commands` are offered for slots that name another command
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }

    fn children_and_options(&self, ctx: &SuggestionContext, prefix: &str) -> Vec<Suggestion> {
        let mut out = Vec::new();

        for child in ctx.node.children.iter().filter(|c| !c.hidden) {
            if let Some(name) = matching_name(&child.names, prefix) {
                out.push(
                    Suggestion::new(name, SuggestionKind::Subcommand)
                        .with_description(child.description.clone())
                        .with_priority(child.priority),
                );
            }
        }

        for option in ctx.available_options() {
            if option.hidden || (ctx.is_used(&option) && !option.is_repeatable) {
                continue;
            }
            if let Some(name) = matching_name(&option.names, prefix) {
                out.push(
                    Suggestion::new(name, SuggestionKind::Option)
                        .with_description(option.description.clone())
                        .with_priority(option.priority),
                );
            }
        }

        out
    }

    async fn slot_values(
        &self,
        ctx: &SuggestionContext,
        slot: &ArgumentSlot,
        prefix: &str,
    ) -> Vec<Suggestion> {
        let mut out: Vec<Suggestion> = slot
            .suggestions
            .iter()
            .filter(|s| s.name.starts_with(prefix))
            .map(|s| {
                Suggestion::new(s.name.as_str(), SuggestionKind::Argument)
                    .with_description(s.description.clone())
                    .with_priority(s.priority)
            })
            .collect();

        if slot.is_command {
            out.extend(
                self.commands
                    .iter()
                    .filter(|name| name.starts_with(prefix))
                    .map(|name| Suggestion::new(name.as_str(), SuggestionKind::Subcommand)),
            );
        }

        if !slot.templates.is_empty() {
            let folders_only = !slot.templates.contains(&Template::Filepaths);
            out.extend(list_directory(ctx, prefix, folders_only).await);
        }

        out
    }
}

#[async_trait]
impl RecommendationBuilder for DefaultRecommender {
    async fn build(&self, ctx: &SuggestionContext) -> Option<Vec<Suggestion>> {
        let prefix = ctx.prefix();
        let mut out = Vec::new();

        match &ctx.kind {
            ContextKind::Subcommand {
                args_exhausted,
                args_used,
            } => {
                if *args_exhausted && *args_used {
                    tracing::debug!(node = ctx.node.name(), "arguments exhausted, nothing to suggest");
                    return None;
                }
                if !args_used {
                    out.extend(self.children_and_options(ctx, prefix));
                }
                if !args_exhausted {
                    if let Some(slot) = ctx.node.args.first() {
                        out.extend(self.slot_values(ctx, slot, prefix).await);
                    }
                }
            }
            ContextKind::Argument {
                slot,
                remaining_optional,
            } => {
                out.extend(self.slot_values(ctx, slot, prefix).await);
                if *remaining_optional {
                    out.extend(self.children_and_options(ctx, prefix));
                }
            }
        }

        Some(rank(out, prefix))
    }
}

/// First alias starting with `prefix`
fn matching_name<'a>(names: &'a [String], prefix: &str) -> Option<&'a str> {
    names
        .iter()
        .find(|n| n.starts_with(prefix))
        .map(String::as_str)
}

async fn list_directory(
    ctx: &SuggestionContext,
    prefix: &str,
    folders_only: bool,
) -> Vec<Suggestion> {
    let mut entries = match tokio::fs::read_dir(&ctx.cwd).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %ctx.cwd.display(), error = %e, "cannot list directory");
            return Vec::new();
        }
    };

    let show_hidden = prefix.starts_with('.');
    let separator = ctx.shell.preferred_separator();
    let mut out = Vec::new();

    while let Ok(Some(entry)) = entries.next_entry().await {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !name.starts_with(prefix) || (name.starts_with('.') && !show_hidden) {
            continue;
        }
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        if folders_only && !is_dir {
            continue;
        }
        let name = if is_dir {
            format!("{name}{separator}")
        } else {
            name
        };
        out.push(Suggestion::new(name, SuggestionKind::Path));
    }

    out
}

/// Sort candidates and drop repeated insert values
///
/// Order: higher priority first, then an exact match of `prefix`, then
/// shorter names, then alphabetically.
fn rank(mut suggestions: Vec<Suggestion>, prefix: &str) -> Vec<Suggestion> {
    suggestions.sort_by(|a, b| {
        let by_priority = b.priority.cmp(&a.priority);
        if by_priority != Ordering::Equal {
            return by_priority;
        }

        if !prefix.is_empty() {
            let a_exact = a.name == prefix;
            let b_exact = b.name == prefix;
            if a_exact != b_exact {
                return if a_exact {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
            }
        }

        a.name
            .len()
            .cmp(&b.name.len())
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut seen = HashSet::new();
    suggestions.retain(|s| seen.insert(s.insert_value.clone()));
    suggestions
}
