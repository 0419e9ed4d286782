//! Interactive prompt with engine-driven completion
//!
//! The line editor never runs what is typed. Tab opens a completion menu fed
//! by the suggestion engine, the best candidate is previewed inline, and an
//! accepted line prints the suggestion result for that line.

mod completer;
mod hinter;
mod prompt;

pub use completer::EngineCompleter;
pub use hinter::SuggestionHinter;
pub use prompt::SuggestPrompt;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reedline::{
    ColumnarMenu, Emacs, KeyCode, KeyModifiers, MenuBuilder, Reedline, ReedlineEvent, ReedlineMenu,
    Signal, default_emacs_keybindings,
};

use crate::error::Result;
use crate::formatter::Formatter;
use crate::runtime::SuggestionEngine;
use crate::suggestion::SuggestionResult;
use crate::utils::Shell;

const COMPLETION_MENU: &str = "completion_menu";

/// REPL engine for interactive suggestion browsing
pub struct ReplEngine {
    editor: Reedline,
    prompt: SuggestPrompt,
    engine: Arc<SuggestionEngine>,
    formatter: Formatter,
    cwd: PathBuf,
    shell: Shell,
    running: bool,
}

impl ReplEngine {
    pub fn new(
        engine: Arc<SuggestionEngine>,
        formatter: Formatter,
        cwd: PathBuf,
        shell: Shell,
    ) -> Self {
        let completer = EngineCompleter::new(engine.clone(), cwd.clone(), shell);
        let hinter = SuggestionHinter::new(engine.clone(), cwd.clone(), shell);
        let completion_menu = ColumnarMenu::default().with_name(COMPLETION_MENU);

        let mut keybindings = default_emacs_keybindings();
        keybindings.add_binding(
            KeyModifiers::NONE,
            KeyCode::Tab,
            ReedlineEvent::UntilFound(vec![
                ReedlineEvent::Menu(COMPLETION_MENU.to_string()),
                ReedlineEvent::MenuNext,
            ]),
        );

        let editor = Reedline::create()
            .with_completer(Box::new(completer))
            .with_hinter(Box::new(hinter))
            .with_menu(ReedlineMenu::EngineCompleter(Box::new(completion_menu)))
            .with_edit_mode(Box::new(Emacs::new(keybindings)));

        Self {
            editor,
            prompt: SuggestPrompt::new(&cwd),
            engine,
            formatter,
            cwd,
            shell,
            running: true,
        }
    }

    /// Read a single line of input
    ///
    /// `None` on Ctrl-D; Ctrl-C clears the line and yields an empty one.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        match self.editor.read_line(&self.prompt)? {
            Signal::Success(line) => Ok(Some(line)),
            Signal::CtrlC => Ok(Some(String::new())),
            _ => Ok(None),
        }
    }

    /// Run until end of input or `exit`
    pub async fn run(&mut self) -> Result<()> {
        while self.running {
            let line = match self.read_line()? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => line,
                None => break,
            };

            if matches!(line.trim(), "exit" | "quit") {
                self.stop();
                break;
            }

            match self.engine.get_suggestions(&line, &self.cwd, self.shell).await {
                Ok(Some(result)) => match self.formatter.format(&result) {
                    Ok(output) => println!("{}", output),
                    Err(e) => eprintln!("Format error: {}", e),
                },
                Ok(None) => println!("(no suggestions)"),
                Err(e) => eprintln!("{}", e),
            }
        }

        Ok(())
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Compute suggestions from synchronous editor callbacks
///
/// Needs a multi-threaded tokio runtime; outside of one, or on engine
/// failure, there is nothing to suggest.
fn suggest_blocking(
    engine: &SuggestionEngine,
    line: &str,
    cwd: &Path,
    shell: Shell,
) -> Option<SuggestionResult> {
    let handle = tokio::runtime::Handle::try_current().ok()?;
    let result =
        tokio::task::block_in_place(|| handle.block_on(engine.get_suggestions(line, cwd, shell)));
    match result {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(error = %e, "completion failed");
            None
        }
    }
}

/// Byte offset where the last `characters_to_drop` characters of `line` begin
fn replace_start(line: &str, characters_to_drop: usize) -> usize {
    if characters_to_drop == 0 {
        return line.len();
    }
    line.char_indices()
        .rev()
        .nth(characters_to_drop - 1)
        .map_or(0, |(idx, _)| idx)
}
