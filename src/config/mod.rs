//! Configuration management for shellsuggest
//!
//! Settings come from several sources:
//! - Configuration file (TOML, `~/.shellsuggest/config.toml` by default)
//! - Environment variables prefixed with `SHELLSUGGEST_`
//! - Command-line arguments
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, Result, SuggestError};
use crate::utils::{DEFAULT_PROBE_TIMEOUT, Shell};

/// Environment variable overriding `catalog.spec_dir`
pub const ENV_SPEC_DIR: &str = "SHELLSUGGEST_SPEC_DIR";
/// Environment variable overriding `logging.level`
pub const ENV_LOG_LEVEL: &str = "SHELLSUGGEST_LOG_LEVEL";
/// Environment variable overriding `engine.default_shell`
pub const ENV_SHELL: &str = "SHELLSUGGEST_SHELL";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Named generators backed by external commands
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub generators: BTreeMap<String, GeneratorConfig>,
}

/// Matching engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Time budget for generator shell probes, in milliseconds
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Shell assumed when none is given on the command line
    #[serde(default)]
    pub default_shell: Shell,
}

/// Where grammars are loaded from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory holding `<command>.json` grammar documents
    #[serde(default = "default_spec_dir")]
    pub spec_dir: PathBuf,

    /// Base directory for local spec locations; unset disables them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_dir: Option<PathBuf>,
}

/// External command whose output lines become subcommands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,
}

/// Display and output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Output format (json, json-pretty, table, plain)
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Enable colored output
    #[serde(default = "default_color_output")]
    pub color_output: bool,

    /// Upper bound on printed suggestions
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

/// Output format options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Single-line JSON, suited for piping into a shell integration
    Json,

    /// Indented JSON, colored when color output is on
    JsonPretty,

    /// ASCII table of the candidates
    Table,

    /// One insertion value per line
    Plain,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_probe_timeout_ms() -> u64 {
    DEFAULT_PROBE_TIMEOUT.as_millis() as u64
}

fn default_spec_dir() -> PathBuf {
    Config::base_dir().join("specs")
}

fn default_format() -> OutputFormat {
    OutputFormat::Json
}

fn default_color_output() -> bool {
    true
}

fn default_max_suggestions() -> usize {
    50
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    false
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_probe_timeout_ms(),
            default_shell: Shell::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            spec_dir: default_spec_dir(),
            location_dir: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            color_output: default_color_output(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// `~/.shellsuggest`, or `./.shellsuggest` without a home directory
    fn base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".shellsuggest")
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> PathBuf {
        Self::base_dir().join("config.toml")
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SuggestError::Config(ConfigError::FileNotFound(path.display().to_string()))
            } else {
                SuggestError::Io(e)
            }
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ConfigError::InvalidFormat(e.message().to_string()).into())
    }

    /// Load configuration from `path`, or from the default location
    ///
    /// A missing default file yields the defaults; a missing explicit file
    /// is an error.
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    tracing::debug!(path = %default_path.display(), "no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply `SHELLSUGGEST_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_SPEC_DIR).filter(|v| !v.is_empty()) {
            self.catalog.spec_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.is_empty()) {
            self.logging.level = level.parse()?;
        }
        if let Some(shell) = lookup(ENV_SHELL).filter(|v| !v.is_empty()) {
            self.engine.default_shell = shell.parse()?;
        }
        Ok(())
    }

    /// Save configuration to a file, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.engine.probe_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.probe_timeout_ms".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if let Some((name, _)) = self
            .generators
            .iter()
            .find(|(_, generator)| generator.command.trim().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: format!("generators.{name}.command"),
                value: String::new(),
            }
            .into());
        }
        if self.display.max_suggestions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "display.max_suggestions".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Generator probe budget as Duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.engine.probe_timeout_ms)
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl FromStr for LogLevel {
    type Err = SuggestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: s.to_string(),
            }
            .into()),
        }
    }
}

impl OutputFormat {
    /// Check if format is JSON-based
    pub fn is_json(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::JsonPretty)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Json => "json",
            OutputFormat::JsonPretty => "json-pretty",
            OutputFormat::Table => "table",
            OutputFormat::Plain => "plain",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = SuggestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "pretty" => Ok(OutputFormat::JsonPretty),
            "table" => Ok(OutputFormat::Table),
            "plain" | "text" => Ok(OutputFormat::Plain),
            _ => Err(ConfigError::InvalidValue {
                field: "display.format".to_string(),
                value: s.to_string(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.probe_timeout_ms, 5000);
        assert_eq!(config.engine.default_shell, Shell::Bash);
        assert_eq!(config.display.format, OutputFormat::Json);
        assert!(config.catalog.spec_dir.ends_with(".shellsuggest/specs"));
        assert!(config.catalog.location_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = Config::from_toml_str(
            r#"
            [engine]
            default_shell = "zsh"

            [display]
            format = "json-pretty"
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.default_shell, Shell::Zsh);
        assert_eq!(config.engine.probe_timeout_ms, 5000);
        assert_eq!(config.display.format, OutputFormat::JsonPretty);
        assert_eq!(config.display.max_suggestions, 50);
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_generators_table() {
        let config = Config::from_toml_str(
            r#"
            [generators.npm-scripts]
            command = "npm"
            args = ["run", "--parseable"]

            [generators.empty]
            command = " "
            "#,
        )
        .unwrap();
        let npm = &config.generators["npm-scripts"];
        assert_eq!(npm.command, "npm");
        assert_eq!(npm.args, vec!["run", "--parseable"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml_str("[engine\nprobe_timeout_ms = ").unwrap_err();
        assert!(matches!(err, SuggestError::Config(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::load_from_file(Some(&missing)).unwrap_err();
        assert!(matches!(err, SuggestError::Config(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.catalog.location_dir = Some(dir.path().join("locations"));
        config.display.format = OutputFormat::Table;
        config.generators.insert(
            "remotes".to_string(),
            GeneratorConfig {
                command: "git".to_string(),
                args: vec!["remote".to_string()],
            },
        );
        config.save(&path).unwrap();

        let loaded = Config::load_from_file(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::default();
        config.engine.probe_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.display.max_suggestions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_SPEC_DIR, "/opt/specs"),
            (ENV_LOG_LEVEL, "debug"),
            (ENV_SHELL, "fish"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env_with(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.catalog.spec_dir, PathBuf::from("/opt/specs"));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.engine.default_shell, Shell::Fish);
    }

    #[test]
    fn test_env_rejects_unknown_shell() {
        let mut config = Config::default();
        let result = config.apply_env_with(|key| (key == ENV_SHELL).then(|| "tcsh".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json-pretty".parse::<OutputFormat>().unwrap(), OutputFormat::JsonPretty);
        assert_eq!("PLAIN".parse::<OutputFormat>().unwrap(), OutputFormat::Plain);
        assert!("yaml".parse::<OutputFormat>().is_err());
        assert!(OutputFormat::Json.is_json());
        assert!(!OutputFormat::Table.is_json());
    }

    #[test]
    fn test_probe_timeout() {
        let config = Config::default();
        assert_eq!(config.probe_timeout(), Duration::from_secs(5));
    }
}
