//! Shellsuggest
//!
//! Command-line front end for the suggestion engine.
//!
//! # Usage
//!
//! ```bash
//! # One-shot suggestions as JSON
//! shellsuggest suggest "git che"
//!
//! # Interactive prompt with Tab completion
//! shellsuggest
//! ```

use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use shellsuggest::Result;
use shellsuggest::cli::CliInterface;
use shellsuggest::formatter::Formatter;
use shellsuggest::repl::ReplEngine;

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments
/// 2. Load configuration
/// 3. Initialize logging
/// 4. Handle subcommands or start the interactive prompt
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    if cli.handle_subcommand().await? {
        return Ok(());
    }

    run_interactive_mode(&cli).await
}

/// Run the interactive prompt in the current directory
async fn run_interactive_mode(cli: &CliInterface) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let engine = cli.build_engine(&cwd).await?;
    let formatter = Formatter::from_config(&cli.config().display);

    println!(
        "shellsuggest {} - Tab to complete, Enter to list suggestions, Ctrl-D to quit",
        shellsuggest::version()
    );

    let mut repl = ReplEngine::new(
        Arc::new(engine),
        formatter,
        cwd,
        cli.config().engine.default_shell,
    );
    repl.run().await?;

    println!("Goodbye!");
    Ok(())
}

/// Initialize logging system based on verbosity level
///
/// `-v`/`--vv` win over `RUST_LOG`, which wins over the configured level.
/// Logs go to stderr so suggestion output on stdout stays machine-readable.
fn initialize_logging(cli: &CliInterface) {
    let flag_level = if cli.args().very_verbose {
        Some(Level::TRACE)
    } else if cli.args().verbose {
        Some(Level::DEBUG)
    } else {
        None
    };
    let filter = log_filter(
        flag_level,
        std::env::var("RUST_LOG").ok().as_deref(),
        cli.config().logging.level.to_tracing_level(),
    );

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}

/// Pick the log filter; unparsable `RUST_LOG` directives fall back to config
fn log_filter(flag_level: Option<Level>, rust_log: Option<&str>, configured: Level) -> EnvFilter {
    if let Some(level) = flag_level {
        return EnvFilter::new(level.to_string());
    }
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(configured.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_verbose_flag_overrides_rust_log() {
        let filter = log_filter(Some(Level::DEBUG), Some("error"), Level::WARN);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_rust_log_overrides_config() {
        let filter = log_filter(None, Some("trace"), Level::WARN);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn test_config_level_when_rust_log_unset_or_invalid() {
        let filter = log_filter(None, None, Level::INFO);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));

        let filter = log_filter(None, Some("shellsuggest=notalevel"), Level::INFO);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }
}
