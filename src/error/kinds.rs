use std::{fmt, io};

/// Crate-wide `Result` type using [`SuggestError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, SuggestError>;

/// Top-level error type for suggestion operations.
///
/// "No suggestion" is never an error; this type only carries collaborator
/// failures and broken matcher invariants.
#[derive(Debug)]
pub enum SuggestError {
    /// Grammar catalog errors.
    Catalog(CatalogError),

    /// Configuration errors.
    Config(ConfigError),

    /// Shell probe errors.
    Probe(ProbeError),

    /// I/O errors.
    Io(io::Error),

    /// JSON decoding errors.
    Json(serde_json::Error),

    /// The matcher reached a state its callers guarantee cannot happen.
    InvalidState(String),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Catalog-specific errors.
#[derive(Debug)]
pub enum CatalogError {
    /// No grammar exists under the key.
    SpecNotFound(String),

    /// A grammar document could not be decoded.
    MalformedSpec { key: String, reason: String },

    /// A generator loader names a generator nobody registered.
    UnknownGenerator(String),

    /// A spec location cannot be loaded by the configured resolver.
    UnsupportedLocation(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/// Shell probe errors.
#[derive(Debug)]
pub enum ProbeError {
    /// The probe process could not be started.
    SpawnFailed { command: String, reason: String },

    /// The probe process exceeded its time budget.
    Timeout { command: String, millis: u64 },
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for SuggestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestError::Catalog(e) => write!(f, "Catalog error: {e}"),
            SuggestError::Config(e) => write!(f, "Configuration error: {e}"),
            SuggestError::Probe(e) => write!(f, "Probe error: {e}"),
            SuggestError::Io(e) => write!(f, "I/O error: {e}"),
            SuggestError::Json(e) => write!(f, "JSON error: {e}"),
            SuggestError::InvalidState(msg) => write!(f, "Invalid matcher state: {msg}"),
            SuggestError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::SpecNotFound(key) => write!(f, "No spec found for '{key}'"),
            CatalogError::MalformedSpec { key, reason } => {
                write!(f, "Malformed spec '{key}': {reason}")
            }
            CatalogError::UnknownGenerator(name) => {
                write!(f, "No generator registered as '{name}'")
            }
            CatalogError::UnsupportedLocation(loc) => {
                write!(f, "Spec location not supported: {loc}")
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::SpawnFailed { command, reason } => {
                write!(f, "Failed to run '{command}': {reason}")
            }
            ProbeError::Timeout { command, millis } => {
                write!(f, "'{command}' did not finish within {millis}ms")
            }
        }
    }
}

impl std::error::Error for SuggestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SuggestError::Io(e) => Some(e),
            SuggestError::Json(e) => Some(e),
            _ => None,
        }
    }
}
impl std::error::Error for CatalogError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for ProbeError {}

/* ========================= Conversions to SuggestError ========================= */

impl From<io::Error> for SuggestError {
    fn from(err: io::Error) -> Self {
        SuggestError::Io(err)
    }
}

impl From<serde_json::Error> for SuggestError {
    fn from(err: serde_json::Error) -> Self {
        SuggestError::Json(err)
    }
}

impl From<CatalogError> for SuggestError {
    fn from(err: CatalogError) -> Self {
        SuggestError::Catalog(err)
    }
}

impl From<ConfigError> for SuggestError {
    fn from(err: ConfigError) -> Self {
        SuggestError::Config(err)
    }
}

impl From<ProbeError> for SuggestError {
    fn from(err: ProbeError) -> Self {
        SuggestError::Probe(err)
    }
}

impl From<String> for SuggestError {
    fn from(msg: String) -> Self {
        SuggestError::Generic(msg)
    }
}

impl From<&str> for SuggestError {
    fn from(msg: &str) -> Self {
        SuggestError::Generic(msg.to_owned())
    }
}
