//! Grammar matcher
//!
//! Walks the complete words of a command line against a grammar tree and
//! stops at the first position where nothing is left to decide
//! deterministically: the word being typed, or the end of input. The walk is
//! a state machine over three steps:
//!
//! - `Subcommand`: the next word is an option, a child subcommand, or the
//!   start of the node's positional arguments
//! - `Argument`: the next word fills a positional slot
//! - `Option`: the next word is a flag, possibly followed by its own arguments
//!
//! Matching never backtracks. A word that fits nowhere ends the walk without
//! a result.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, trace};

use super::context::{ContextKind, SuggestionContext};
use super::persistent::{filter_persistent_tokens, find_option, merge_persistent_options};
use crate::catalog::Catalog;
use crate::error::{Result, SuggestError};
use crate::parser::Token;
use crate::spec::{ArgumentSlot, CommandOption, SpecResolver, SubcommandNode};
use crate::utils::Shell;

/// Matcher steps
#[derive(Debug, Clone)]
enum Step {
    Subcommand {
        args_exhausted: bool,
        args_used: bool,
    },
    Argument {
        slots: Vec<ArgumentSlot>,
        /// The slots belong to an option rather than the subcommand
        from_option: bool,
        /// The first slot is variadic and already took a word
        from_variadic: bool,
        /// Consumed words belong to a persistent option
        persist: bool,
    },
    Option(Arc<CommandOption>),
}

/// Outcome of one step
enum Transition {
    Next(Step),
    Suggest(SuggestionContext),
    NoMatch,
}

/// Mutable part of a walk
struct Walk {
    tokens: Vec<Token>,
    pos: usize,
    node: Arc<SubcommandNode>,
    persistent: Vec<Arc<CommandOption>>,
    accepted: Vec<Token>,
}

impl Walk {
    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn has_more_after_current(&self) -> bool {
        self.pos + 1 < self.tokens.len()
    }

    /// Move past the current word, recording it as accepted
    fn accept(&mut self, persist: bool) {
        if let Some(token) = self.tokens.get(self.pos) {
            let token = if persist {
                token.persistent(true)
            } else {
                token.clone()
            };
            self.accepted.push(token);
        }
        self.pos += 1;
    }

    /// Move into `child`, keeping only what persists across the boundary
    fn descend(&mut self, child: Arc<SubcommandNode>) {
        self.accept(false);
        self.persistent = merge_persistent_options(&self.persistent, &self.node.options);
        self.accepted = filter_persistent_tokens(std::mem::take(&mut self.accepted));
        self.node = child;
    }
}

/// Whether every slot may be skipped
///
/// A variadic first slot that already took a word counts as satisfied.
fn all_optional(slots: &[ArgumentSlot], from_variadic: bool) -> bool {
    slots
        .iter()
        .enumerate()
        .all(|(idx, slot)| slot.is_optional || (idx == 0 && slot.is_variadic && from_variadic))
}

/// Matches command lines against grammars of one catalog
pub struct Matcher<'a> {
    catalog: &'a Catalog,
    cwd: PathBuf,
    shell: Shell,
}

impl<'a> Matcher<'a> {
    pub fn new(catalog: &'a Catalog, cwd: impl Into<PathBuf>, shell: Shell) -> Self {
        Self {
            catalog,
            cwd: cwd.into(),
            shell,
        }
    }

    /// Match `tokens` (the words after the command name) against `root`
    ///
    /// `Ok(None)` means the input does not fit the grammar. An error means a
    /// broken internal invariant, never a user mistake.
    ///
    /// # Arguments
    /// * `tokens` - Words after the command name; the last one is in progress
    /// * `root` - Concrete grammar of the command
    ///
    /// # Returns
    /// * `Result<Option<SuggestionContext>>` - Where the cursor sits in the grammar
    pub async fn run(
        &self,
        tokens: Vec<Token>,
        root: Arc<SubcommandNode>,
    ) -> Result<Option<SuggestionContext>> {
        let mut walk = Walk {
            tokens,
            pos: 0,
            node: root,
            persistent: Vec::new(),
            accepted: Vec::new(),
        };
        let mut step = Step::Subcommand {
            args_exhausted: false,
            args_used: false,
        };

        loop {
            trace!(node = walk.node.name(), pos = walk.pos, ?step, "matcher step");
            let transition = match step {
                Step::Subcommand {
                    args_exhausted,
                    args_used,
                } => self.match_subcommand(&mut walk, args_exhausted, args_used).await,
                Step::Argument {
                    slots,
                    from_option,
                    from_variadic,
                    persist,
                } => {
                    self.match_argument(&mut walk, slots, from_option, from_variadic, persist)
                        .await
                }
                Step::Option(option) => self.match_option(&mut walk, option)?,
            };

            match transition {
                Transition::Next(next) => step = next,
                Transition::Suggest(ctx) => {
                    debug!(node = ctx.node.name(), kind = ?ctx.kind, "matcher produced context");
                    return Ok(Some(ctx));
                }
                Transition::NoMatch => return Ok(None),
            }
        }
    }

    async fn match_subcommand(
        &self,
        walk: &mut Walk,
        args_exhausted: bool,
        args_used: bool,
    ) -> Transition {
        let kind = ContextKind::Subcommand {
            args_exhausted,
            args_used,
        };
        let token = match walk.current() {
            None => return Transition::Suggest(self.context(walk, kind, None)),
            Some(token) if !token.complete => {
                let partial = Some(token.clone());
                return Transition::Suggest(self.context(walk, kind, partial));
            }
            Some(token) => token.clone(),
        };

        if token.is_option {
            return match find_option(&token.text, &walk.persistent, &walk.node.options) {
                Some(option) => Transition::Next(Step::Option(option)),
                None => {
                    debug!(option = %token.text, "unknown option");
                    Transition::NoMatch
                }
            };
        }

        if let Some(child) = SpecResolver::new(self.catalog)
            .resolve_child(&walk.node, &token.text)
            .await
        {
            walk.descend(child);
            return Transition::Next(Step::Subcommand {
                args_exhausted: false,
                args_used: false,
            });
        }

        if walk.node.args.is_empty() {
            debug!(word = %token.text, node = walk.node.name(), "word fits nowhere");
            return Transition::NoMatch;
        }

        Transition::Next(Step::Argument {
            slots: walk.node.args.clone(),
            from_option: false,
            from_variadic: false,
            persist: false,
        })
    }

    async fn match_argument(
        &self,
        walk: &mut Walk,
        slots: Vec<ArgumentSlot>,
        from_option: bool,
        from_variadic: bool,
        persist: bool,
    ) -> Transition {
        let Some(slot) = slots.first() else {
            return Transition::Next(Step::Subcommand {
                args_exhausted: true,
                args_used: !from_option,
            });
        };

        let remaining_optional = all_optional(&slots, from_variadic);
        let kind = ContextKind::Argument {
            slot: slot.clone(),
            remaining_optional,
        };
        let token = match walk.current() {
            None => return Transition::Suggest(self.context(walk, kind, None)),
            Some(token) if !token.complete => {
                let partial = Some(token.clone());
                return Transition::Suggest(self.context(walk, kind, partial));
            }
            Some(token) => token.clone(),
        };

        if remaining_optional {
            if token.is_option {
                return match find_option(&token.text, &walk.persistent, &walk.node.options) {
                    Some(option) => Transition::Next(Step::Option(option)),
                    None => {
                        debug!(option = %token.text, "unknown option");
                        Transition::NoMatch
                    }
                };
            }
            if let Some(child) = SpecResolver::new(self.catalog)
                .resolve_child(&walk.node, &token.text)
                .await
            {
                walk.descend(child);
                return Transition::Next(Step::Subcommand {
                    args_exhausted: false,
                    args_used: false,
                });
            }
        }

        if slot.is_variadic {
            walk.accept(persist);
            return Transition::Next(Step::Argument {
                slots,
                from_option,
                from_variadic: true,
                persist,
            });
        }

        if slot.is_command {
            if !walk.has_more_after_current() {
                return Transition::NoMatch;
            }
            let Some(root) = self.catalog.load_root(&token.text).await else {
                debug!(command = %token.text, "no grammar for delegated command");
                return Transition::NoMatch;
            };
            debug!(command = %token.text, "delegating to command grammar");
            walk.pos += 1;
            walk.node = root;
            walk.persistent.clear();
            walk.accepted.clear();
            return Transition::Next(Step::Subcommand {
                args_exhausted: false,
                args_used: false,
            });
        }

        walk.accept(persist);
        Transition::Next(Step::Argument {
            slots: slots[1..].to_vec(),
            from_option,
            from_variadic: false,
            persist,
        })
    }

    fn match_option(&self, walk: &mut Walk, option: Arc<CommandOption>) -> Result<Transition> {
        if walk.current().is_none() {
            return Err(SuggestError::InvalidState(format!(
                "option {:?} expected but no words are left",
                option.names
            )));
        }

        let persist =
            option.is_persistent || walk.persistent.iter().any(|p| p.shares_name(&option));
        walk.accept(persist);

        if option.args.is_empty() {
            return Ok(Transition::Next(Step::Subcommand {
                args_exhausted: false,
                args_used: false,
            }));
        }
        Ok(Transition::Next(Step::Argument {
            slots: option.args.clone(),
            from_option: true,
            from_variadic: false,
            persist,
        }))
    }

    fn context(&self, walk: &Walk, kind: ContextKind, partial: Option<Token>) -> SuggestionContext {
        SuggestionContext {
            kind,
            node: Arc::clone(&walk.node),
            persistent_options: walk.persistent.clone(),
            partial,
            accepted: walk.accepted.clone(),
            cwd: self.cwd.clone(),
            shell: self.shell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemorySource;
    use crate::parser::CommandLexer;

    const GIT: &str = r#"{
        "name": "git",
        "options": [
            { "name": "-C", "args": { "name": "path" }, "isPersistent": true },
            { "name": "--bare" }
        ],
        "subcommands": [
            {
                "name": ["checkout", "co"],
                "options": [{ "name": ["-b"], "args": { "name": "branch" } }],
                "args": [{ "name": "branch" }, { "name": "paths", "isOptional": true, "isVariadic": true }]
            },
            {
                "name": "remote",
                "options": [{ "name": "-v" }],
                "args": { "name": "names", "isOptional": true, "isVariadic": true },
                "subcommands": [
                    { "name": "add", "args": [{ "name": "name" }, { "name": "url" }] }
                ]
            },
            { "name": "commit", "options": [{ "name": ["-m", "--message"], "args": { "name": "msg" } }] }
        ]
    }"#;

    const RM: &str = r#"{
        "name": "rm",
        "options": [{ "name": "-f" }],
        "args": { "name": "files", "isVariadic": true, "template": "filepaths" }
    }"#;

    const SUDO: &str = r#"{ "name": "sudo", "args": { "name": "command", "isCommand": true } }"#;

    fn catalog() -> Catalog {
        let source = MemorySource::new()
            .with_json("git", GIT)
            .unwrap()
            .with_json("rm", RM)
            .unwrap()
            .with_json("sudo", SUDO)
            .unwrap();
        Catalog::new(Arc::new(source))
    }

    /// Tokenize `input` the way the engine does and match it against its root
    async fn run(catalog: &Catalog, input: &str) -> Result<Option<SuggestionContext>> {
        let mut tokens = CommandLexer::tokenize(input, Shell::Bash);
        if tokens.last().is_some_and(|t| t.complete) {
            tokens.push(Token::empty_at(input.len()));
        }
        let root = catalog.load_root(&tokens[0].text).await.unwrap();
        Matcher::new(catalog, "/", Shell::Bash)
            .run(tokens[1..].to_vec(), root)
            .await
    }

    fn accepted(ctx: &SuggestionContext) -> Vec<&str> {
        ctx.accepted.iter().map(|t| t.text.as_str()).collect()
    }

    #[tokio::test]
    async fn test_root_position() {
        let catalog = catalog();
        let ctx = run(&catalog, "git ").await.unwrap().unwrap();
        assert_eq!(ctx.node.name(), "git");
        assert_eq!(ctx.prefix(), "");
        assert!(matches!(
            ctx.kind,
            ContextKind::Subcommand {
                args_exhausted: false,
                args_used: false
            }
        ));
    }

    #[tokio::test]
    async fn test_partial_subcommand() {
        let catalog = catalog();
        let ctx = run(&catalog, "git che").await.unwrap().unwrap();
        assert_eq!(ctx.node.name(), "git");
        assert_eq!(ctx.prefix(), "che");
    }

    #[tokio::test]
    async fn test_descends_by_alias() {
        let catalog = catalog();
        let ctx = run(&catalog, "git co ").await.unwrap().unwrap();
        assert_eq!(ctx.node.name(), "checkout");
        assert!(accepted(&ctx).is_empty());
    }

    #[tokio::test]
    async fn test_unknown_option_halts() {
        let catalog = catalog();
        assert!(run(&catalog, "git --nope ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unconsumable_word_halts() {
        let catalog = catalog();
        assert!(run(&catalog, "git commit bogus ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_option_argument_position() {
        let catalog = catalog();
        let ctx = run(&catalog, "git commit -m ").await.unwrap().unwrap();
        match &ctx.kind {
            ContextKind::Argument {
                slot,
                remaining_optional,
            } => {
                assert_eq!(slot.name, "msg");
                assert!(!remaining_optional);
            }
            other => panic!("Expected argument context, got {other:?}"),
        }
        assert_eq!(accepted(&ctx), vec!["-m"]);
    }

    #[tokio::test]
    async fn test_option_arguments_do_not_count_as_used() {
        let catalog = catalog();
        let ctx = run(&catalog, "git commit -m msg ").await.unwrap().unwrap();
        assert!(matches!(
            ctx.kind,
            ContextKind::Subcommand {
                args_exhausted: true,
                args_used: false
            }
        ));
    }

    #[tokio::test]
    async fn test_positional_arguments_exhausted() {
        let catalog = catalog();
        let ctx = run(&catalog, "git remote add origin url ")
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            ctx.kind,
            ContextKind::Subcommand {
                args_exhausted: true,
                args_used: true
            }
        ));
        assert_eq!(accepted(&ctx), vec!["origin", "url"]);
    }

    #[tokio::test]
    async fn test_persistent_option_tokens_survive_descent() {
        let catalog = catalog();
        let ctx = run(&catalog, "git -C /tmp remote add ").await.unwrap().unwrap();
        assert_eq!(ctx.node.name(), "add");
        assert_eq!(accepted(&ctx), vec!["-C", "/tmp"]);
        assert!(ctx.accepted.iter().all(|t| t.is_persistent));
        assert_eq!(ctx.persistent_options.len(), 1);
    }

    #[tokio::test]
    async fn test_plain_tokens_reset_at_boundary() {
        let catalog = catalog();
        let ctx = run(&catalog, "git remote -v add ").await.unwrap().unwrap();
        assert_eq!(ctx.node.name(), "add");
        assert!(accepted(&ctx).is_empty());
    }

    #[tokio::test]
    async fn test_persistent_option_used_deeper() {
        let catalog = catalog();
        let ctx = run(&catalog, "git remote -C /tmp ").await.unwrap().unwrap();
        assert_eq!(ctx.node.name(), "remote");
        assert_eq!(accepted(&ctx), vec!["-C", "/tmp"]);
        assert!(ctx.accepted[0].is_persistent);
    }

    #[tokio::test]
    async fn test_sibling_options_are_not_inherited() {
        let catalog = catalog();
        assert!(run(&catalog, "git remote -b ").await.unwrap().is_none());
        assert!(run(&catalog, "git remote --bare ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_variadic_slot_keeps_consuming() {
        let catalog = catalog();
        let ctx = run(&catalog, "rm a b c ").await.unwrap().unwrap();
        match &ctx.kind {
            ContextKind::Argument {
                slot,
                remaining_optional,
            } => {
                assert_eq!(slot.name, "files");
                assert!(remaining_optional);
            }
            other => panic!("Expected argument context, got {other:?}"),
        }
        assert_eq!(accepted(&ctx), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_variadic_slot_abandoned_for_option() {
        let catalog = catalog();
        let ctx = run(&catalog, "rm a -f ").await.unwrap().unwrap();
        assert!(matches!(ctx.kind, ContextKind::Subcommand { .. }));
        assert_eq!(accepted(&ctx), vec!["a", "-f"]);
    }

    #[tokio::test]
    async fn test_optional_slot_abandoned_for_child() {
        let catalog = catalog();
        let ctx = run(&catalog, "git remote origin add ").await.unwrap().unwrap();
        assert_eq!(ctx.node.name(), "add");
        assert!(accepted(&ctx).is_empty());
    }

    #[tokio::test]
    async fn test_optional_variadic_consumes_other_words() {
        let catalog = catalog();
        let ctx = run(&catalog, "git checkout main src ").await.unwrap().unwrap();
        match &ctx.kind {
            ContextKind::Argument { slot, .. } => assert_eq!(slot.name, "paths"),
            other => panic!("Expected argument context, got {other:?}"),
        }
        assert_eq!(accepted(&ctx), vec!["main", "src"]);
    }

    #[tokio::test]
    async fn test_command_slot_delegates() {
        let catalog = catalog();
        let ctx = run(&catalog, "sudo git remote ").await.unwrap().unwrap();
        assert_eq!(ctx.node.name(), "remote");
        assert!(accepted(&ctx).is_empty());
    }

    #[tokio::test]
    async fn test_command_slot_unknown_command() {
        let catalog = catalog();
        assert!(run(&catalog, "sudo hg ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_command_slot_without_following_words() {
        let catalog = catalog();
        let root = catalog.load_root("sudo").await.unwrap();
        let ctx = Matcher::new(&catalog, "/", Shell::Bash)
            .run(vec![Token::new("git", true)], root)
            .await
            .unwrap();
        assert!(ctx.is_none());
    }

    #[tokio::test]
    async fn test_option_without_word_is_invalid_state() {
        let catalog = catalog();
        let matcher = Matcher::new(&catalog, "/", Shell::Bash);
        let mut walk = Walk {
            tokens: Vec::new(),
            pos: 0,
            node: catalog.load_root("git").await.unwrap(),
            persistent: Vec::new(),
            accepted: Vec::new(),
        };
        let option = Arc::new(CommandOption::new(["--bare"]));
        let err = matcher.match_option(&mut walk, option).err().unwrap();
        assert!(matches!(err, SuggestError::InvalidState(_)));
    }

    #[test]
    fn test_all_optional() {
        let required = ArgumentSlot::new("a");
        let optional = ArgumentSlot::new("b").optional();
        let variadic = ArgumentSlot::new("c").variadic();

        assert!(all_optional(&[], false));
        assert!(all_optional(&[optional.clone()], false));
        assert!(!all_optional(&[required, optional.clone()], false));
        assert!(!all_optional(&[variadic.clone()], false));
        assert!(all_optional(&[variadic, optional], true));
    }
}
