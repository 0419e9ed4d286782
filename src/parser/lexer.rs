//! Command-line lexer for error-tolerant tokenization
//!
//! Splits the text typed so far into words the way the selected shell would,
//! while remembering whether the cursor is still inside the last word.
//!
//! - **Never panic** - unterminated quotes and trailing escapes are accepted
//! - **Quote aware** - quotes group words; the escape character follows the
//!   shell (`\` for POSIX shells, `` ` `` for PowerShell, `^` for cmd)
//! - **Completeness** - only a word followed by unquoted whitespace is complete

use serde::Serialize;
use std::ops::Range;

use crate::utils::Shell;

/// A word of the command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Unquoted text of the word
    pub text: String,
    /// False only for the last word when the cursor is still inside it
    pub complete: bool,
    /// Starts with `-` and is more than a bare dash
    pub is_option: bool,
    /// Accepted while matching a persistent option
    pub is_persistent: bool,
    /// Names a location under an existing directory
    pub is_path: bool,
    /// Path ends in a separator
    pub is_path_complete: bool,
    /// Any part of the word was quoted
    pub is_quoted: bool,
    /// Byte range of the raw word in the input
    #[serde(skip)]
    pub span: Range<usize>,
}

impl Token {
    /// Create a token from its unquoted text
    pub fn new(text: impl Into<String>, complete: bool) -> Self {
        let text = text.into();
        let is_option = is_option_text(&text);
        let len = text.len();
        Self {
            text,
            complete,
            is_option,
            is_persistent: false,
            is_path: false,
            is_path_complete: false,
            is_quoted: false,
            span: 0..len,
        }
    }

    /// Empty in-progress token standing for "ready for the next word"
    pub fn empty_at(offset: usize) -> Self {
        Self {
            span: offset..offset,
            ..Self::new("", false)
        }
    }

    /// Copy of this token flagged as persistent
    pub fn persistent(&self, is_persistent: bool) -> Self {
        Self {
            is_persistent,
            ..self.clone()
        }
    }

    /// Number of characters the raw word occupies in `input`
    pub fn raw_len(&self, input: &str) -> usize {
        input
            .get(self.span.clone())
            .map(|raw| raw.chars().count())
            .unwrap_or_else(|| self.text.chars().count())
    }
}

fn is_option_text(text: &str) -> bool {
    text.len() > 1 && text.starts_with('-')
}

/// Command-line lexer
pub struct CommandLexer<'a> {
    input: &'a str,
    shell: Shell,
    tokens: Vec<Token>,
    buffer: String,
    start: Option<usize>,
    quote: Option<char>,
    quoted: bool,
    escape: bool,
}

impl<'a> CommandLexer<'a> {
    /// Create a new lexer over `input` using the quoting rules of `shell`
    pub fn new(input: &'a str, shell: Shell) -> Self {
        Self {
            input,
            shell,
            tokens: Vec::new(),
            buffer: String::new(),
            start: None,
            quote: None,
            quoted: false,
            escape: false,
        }
    }

    /// Tokenize the entire input
    ///
    /// # Arguments
    /// * `input` - Command line typed so far
    /// * `shell` - Shell whose quoting and escape rules apply
    ///
    /// # Returns
    /// * `Vec<Token>` - Words in order; only the last may be incomplete
    pub fn tokenize(input: &str, shell: Shell) -> Vec<Token> {
        CommandLexer::new(input, shell).run()
    }

    fn run(mut self) -> Vec<Token> {
        let escape = self.shell.escape_char();
        for (idx, ch) in self.input.char_indices() {
            if self.escape {
                self.escape = false;
                self.buffer.push(ch);
                continue;
            }

            if let Some(q) = self.quote {
                if ch == q {
                    self.quote = None;
                } else if ch == escape && q == '"' && self.shell.escapes_in_double_quotes() {
                    self.escape = true;
                } else {
                    self.buffer.push(ch);
                }
                continue;
            }

            if ch.is_whitespace() {
                self.finish(idx, true);
                continue;
            }

            if self.start.is_none() {
                self.start = Some(idx);
            }
            if ch == '"' || (ch == '\'' && self.shell.has_single_quotes()) {
                self.quote = Some(ch);
                self.quoted = true;
            } else if ch == escape {
                self.escape = true;
            } else {
                self.buffer.push(ch);
            }
        }

        self.finish(self.input.len(), false);
        self.tokens
    }

    /// Close the word being built, if any
    fn finish(&mut self, end: usize, complete: bool) {
        let Some(start) = self.start.take() else {
            return;
        };
        let text = std::mem::take(&mut self.buffer);
        let quoted = std::mem::replace(&mut self.quoted, false);
        self.tokens.push(Token {
            is_option: !quoted && is_option_text(&text),
            is_quoted: quoted,
            span: start..end,
            ..Token::new(text, complete)
        });
    }
}
