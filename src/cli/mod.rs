//! Command-line interface for shellsuggest
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading, environment overrides and validation
//! - Building the grammar catalog and suggestion engine
//! - One-shot subcommands (suggest, specs, completion, config)

pub mod completion;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::{Catalog, DirectorySource};
use crate::config::{Config, LogLevel, OutputFormat};
use crate::error::Result;
use crate::formatter::Formatter;
use crate::runtime::SuggestionEngine;
use crate::spec::{CommandGenerator, DirectoryLocations};
use crate::utils::{ProcessProbe, Shell};

/// Grammar-driven command-line suggestions
#[derive(Parser, Debug)]
#[command(
    name = "shellsuggest",
    version,
    about = "Command-line completion suggestions driven by command grammars",
    long_about = "Computes completion candidates for a partially typed shell command line
from a catalog of JSON command grammars. Run without a subcommand to start an
interactive prompt with Tab completion."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Directory holding grammar documents
    #[arg(long, value_name = "DIR", global = true)]
    pub spec_dir: Option<PathBuf>,

    /// Output format (json, json-pretty, table, plain)
    #[arg(short = 'f', long, value_name = "FORMAT", global = true)]
    pub format: Option<String>,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Verbose mode (debug logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv", global = true)]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands for shellsuggest
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print suggestions for a command line
    Suggest {
        /// The command line typed so far
        #[arg(value_name = "INPUT", allow_hyphen_values = true)]
        input: String,

        /// Directory the command line is typed in
        #[arg(long, value_name = "DIR")]
        cwd: Option<PathBuf>,

        /// Shell syntax for path handling
        #[arg(long, value_enum)]
        shell: Option<Shell>,
    },

    /// List command names known to the catalog
    Specs {
        /// Only list names starting with this prefix
        #[arg(value_name = "PREFIX")]
        prefix: Option<String>,
    },

    /// Start an interactive prompt with Tab completion
    Repl,

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        #[arg(value_name = "SHELL")]
        shell: String,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },
}

/// CLI interface handler
pub struct CliInterface {
    args: CliArgs,
    config: Config,
}

impl CliInterface {
    /// Parse the process arguments and load configuration
    pub fn new() -> Result<Self> {
        let args = CliArgs::parse();
        let config = Self::load_config(&args)?;

        Ok(Self { args, config })
    }

    /// Load configuration from file, environment and arguments
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load_from_file(args.config_file.as_deref())?;

        if let Err(e) = config.apply_env() {
            eprintln!("Warning: Ignoring environment override: {}", e);
        }

        if let Err(e) = config.validate() {
            eprintln!("Warning: Configuration validation failed: {}", e);
            eprintln!("Using default configuration instead.");
            config = Config::default();
        }

        Self::apply_args_to_config(&mut config, args);

        Ok(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Apply CLI arguments to configuration
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        Self::apply_catalog_args(config, args);
        Self::apply_display_args(config, args);
        Self::apply_logging_args(config, args);
    }

    fn apply_catalog_args(config: &mut Config, args: &CliArgs) {
        if let Some(dir) = &args.spec_dir {
            config.catalog.spec_dir = dir.clone();
        }
    }

    fn apply_display_args(config: &mut Config, args: &CliArgs) {
        if let Some(format_str) = &args.format {
            config.display.format = Self::parse_output_format(format_str);
        }

        if args.no_color {
            config.display.color_output = false;
        }
    }

    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else {
            config.logging.level
        };
    }

    /// Parse output format string, falling back to compact JSON
    fn parse_output_format(format_str: &str) -> OutputFormat {
        format_str.parse().unwrap_or_else(|_| {
            eprintln!("Warning: Unknown format '{}', using json", format_str);
            OutputFormat::Json
        })
    }

    /// Build the suggestion engine over the configured catalog
    ///
    /// Generator probes run from `cwd`.
    pub async fn build_engine(&self, cwd: &Path) -> Result<SuggestionEngine> {
        let catalog_config = &self.config.catalog;
        let source = DirectorySource::open(&catalog_config.spec_dir).await?;
        let probe = ProcessProbe::new(self.config.probe_timeout()).with_cwd(cwd);

        let mut catalog = Catalog::new(Arc::new(source)).with_probe(Arc::new(probe));
        if let Some(dir) = &catalog_config.location_dir {
            catalog = catalog.with_locations(Arc::new(DirectoryLocations::new(dir)));
        }
        for (name, generator) in &self.config.generators {
            catalog = catalog.with_generator(
                name.clone(),
                Arc::new(CommandGenerator::new(
                    generator.command.clone(),
                    generator.args.clone(),
                )),
            );
        }

        tracing::debug!(
            spec_dir = %catalog_config.spec_dir.display(),
            commands = catalog.root_names().len(),
            generators = self.config.generators.len(),
            "engine ready"
        );
        Ok(SuggestionEngine::new(Arc::new(catalog)))
    }

    /// Handle subcommands
    ///
    /// # Returns
    /// * `Result<bool>` - True if subcommand was handled, false to start the REPL
    pub async fn handle_subcommand(&self) -> Result<bool> {
        match &self.args.command {
            Some(Commands::Suggest { input, cwd, shell }) => {
                let cwd = match cwd {
                    Some(cwd) => cwd.clone(),
                    None => std::env::current_dir()?,
                };
                let shell = shell.unwrap_or(self.config.engine.default_shell);
                if let Some(output) = self.suggest_output(input, &cwd, shell).await? {
                    println!("{}", output);
                }
                Ok(true)
            }
            Some(Commands::Specs { prefix }) => {
                for name in self.spec_names(prefix.as_deref()).await? {
                    println!("{}", name);
                }
                Ok(true)
            }
            Some(Commands::Completion { shell }) => {
                print!("{}", completion::generate_completion(shell)?);
                Ok(true)
            }
            Some(Commands::Config { show, validate }) => {
                self.handle_config_command(*show, *validate)?;
                Ok(true)
            }
            Some(Commands::Repl) | None => Ok(false),
        }
    }

    /// Formatted suggestions for `input`, `None` when there are none
    pub async fn suggest_output(
        &self,
        input: &str,
        cwd: &Path,
        shell: Shell,
    ) -> Result<Option<String>> {
        let engine = self.build_engine(cwd).await?;
        let Some(result) = engine.get_suggestions(input, cwd, shell).await? else {
            return Ok(None);
        };
        let formatter = Formatter::from_config(&self.config.display);
        formatter.format(&result).map(Some)
    }

    /// Root command names, optionally filtered by prefix
    pub async fn spec_names(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let source = DirectorySource::open(&self.config.catalog.spec_dir).await?;
        let catalog = Catalog::new(Arc::new(source));
        let prefix = prefix.unwrap_or_default();
        Ok(catalog
            .root_names()
            .iter()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn handle_config_command(&self, show: bool, validate: bool) -> Result<()> {
        if validate {
            self.validate_config_file()?;
        }

        if show {
            self.show_config()?;
        }

        Ok(())
    }

    /// Validate configuration file
    fn validate_config_file(&self) -> Result<()> {
        let path = self.get_config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("❌ Configuration file does not exist");
            return Ok(());
        }

        match Config::from_file(&path) {
            Ok(config) => match config.validate() {
                Ok(_) => println!("✅ Configuration is valid"),
                Err(e) => println!("❌ Configuration validation failed: {}", e),
            },
            Err(e) => println!("❌ Failed to load configuration: {}", e),
        }

        Ok(())
    }

    /// Show effective configuration
    fn show_config(&self) -> Result<()> {
        let path = self.get_config_path();
        println!("Configuration file: {}", path.display());
        println!();
        println!("=== Effective Configuration ===");
        println!();

        match self.config.to_toml_string() {
            Ok(toml_str) => println!("{}", toml_str),
            Err(e) => {
                eprintln!("Error formatting configuration: {}", e);
                println!("{:#?}", self.config);
            }
        }

        Ok(())
    }

    /// Get configuration file path (from args or default)
    fn get_config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_config_path)
    }
}
