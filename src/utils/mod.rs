//! Utility functions and helpers
//!
//! - `shell`: shell flavors, path separators and path-aware cwd resolution
//! - `probe`: bounded external command execution for grammar generators

pub mod probe;
pub mod shell;

pub use probe::{DEFAULT_PROBE_TIMEOUT, ProbeOutput, ProcessProbe, ShellProbe};
pub use shell::{PathResolution, Shell, resolve_cwd};
