//! Suggestion runtime
//!
//! [`SuggestionEngine`] ties the pieces together: it tokenizes the input,
//! picks the grammar to match against, runs the [`Matcher`] and hands the
//! resulting context to a recommendation builder. It also works out how many
//! trailing characters a chosen candidate replaces.

mod context;
mod matcher;
mod persistent;

pub use context::{ContextKind, SuggestionContext};
pub use matcher::Matcher;
pub use persistent::{filter_persistent_tokens, find_option, merge_persistent_options};

use std::path::Path;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::parser::{CommandLexer, Token};
use crate::suggestion::{DefaultRecommender, RecommendationBuilder, SuggestionResult};
use crate::utils::{Shell, resolve_cwd};

/// Entry point for computing suggestions
pub struct SuggestionEngine {
    catalog: Arc<Catalog>,
    recommender: Arc<dyn RecommendationBuilder>,
}

impl SuggestionEngine {
    /// Engine using the [`DefaultRecommender`] over the catalog's root commands
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let recommender = Arc::new(DefaultRecommender::new(catalog.root_names().to_vec()));
        Self {
            catalog,
            recommender,
        }
    }

    pub fn with_recommender(mut self, recommender: Arc<dyn RecommendationBuilder>) -> Self {
        self.recommender = recommender;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Suggestions for the command line `input` typed in `cwd`
    ///
    /// `Ok(None)` means there is nothing to suggest.
    ///
    /// # Arguments
    /// * `input` - Text left of the cursor
    /// * `cwd` - Directory relative paths are resolved against
    /// * `shell` - Shell whose quoting and path syntax apply
    ///
    /// # Returns
    /// * `Result<Option<SuggestionResult>>` - Candidates and the characters they replace
    pub async fn get_suggestions(
        &self,
        input: &str,
        cwd: &Path,
        shell: Shell,
    ) -> Result<Option<SuggestionResult>> {
        let mut tokens = CommandLexer::tokenize(input, shell);
        if tokens.is_empty() {
            tracing::debug!("empty command line");
            return Ok(None);
        }

        let ready_for_next = tokens.last().is_some_and(|t| t.complete);
        if ready_for_next {
            tokens.push(Token::empty_at(input.len()));
        }
        let mut characters_to_drop = tokens
            .last()
            .map(|t| if t.complete { 0 } else { t.raw_len(input) })
            .unwrap_or(0);

        let root = if tokens[0].complete {
            self.catalog.load_root(&tokens[0].text).await
        } else {
            tracing::debug!("command name still being typed");
            None
        };

        let ctx = match root {
            Some(root) => {
                let last = tokens.last().map(|t| t.text.clone());
                let resolution = resolve_cwd(last.as_deref(), cwd, shell).await;
                if resolution.is_path {
                    if let Some(token) = tokens.last_mut() {
                        token.is_path = true;
                        token.is_path_complete = resolution.is_path_complete;
                        characters_to_drop = if token.is_path_complete {
                            0
                        } else {
                            shell.path_basename(&token.text).chars().count()
                        };
                    }
                    tracing::debug!(characters_to_drop, "last word is a path");
                }
                Matcher::new(&self.catalog, resolution.cwd, shell)
                    .run(tokens[1..].to_vec(), root)
                    .await?
            }
            None if ready_for_next => {
                tracing::debug!("unknown command, suggesting file paths");
                Matcher::new(&self.catalog, cwd, shell)
                    .run(tokens, self.catalog.filepath_spec())
                    .await?
            }
            None => {
                tracing::debug!("unknown command, suggesting command names");
                Matcher::new(&self.catalog, cwd, shell)
                    .run(tokens, self.catalog.root_spec())
                    .await?
            }
        };

        let Some(ctx) = ctx else {
            return Ok(None);
        };
        let Some(suggestions) = self.recommender.build(&ctx).await else {
            return Ok(None);
        };

        tracing::debug!(count = suggestions.len(), characters_to_drop, "suggestions ready");
        Ok(Some(SuggestionResult {
            suggestions,
            characters_to_drop,
        }))
    }
}
