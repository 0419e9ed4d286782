//! Shell flavors and path awareness for the in-progress token

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ConfigError, SuggestError};

/// Shell syntax selector
///
/// Decides which characters separate path components when deciding whether
/// a token is a filesystem path.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Shell {
    #[default]
    Bash,
    Zsh,
    Fish,
    Pwsh,
    Powershell,
    Cmd,
    Nu,
    Xonsh,
}

impl Shell {
    /// Path separators understood by this shell, preferred one first
    pub fn path_separators(self) -> &'static [char] {
        match self {
            Shell::Cmd => &['\\', '/'],
            Shell::Pwsh | Shell::Powershell => &['/', '\\'],
            _ => &['/'],
        }
    }

    /// Separator used when appending to a directory suggestion
    pub fn preferred_separator(self) -> char {
        self.path_separators()[0]
    }

    /// Character that makes the next one literal outside single quotes
    pub fn escape_char(self) -> char {
        match self {
            Shell::Cmd => '^',
            Shell::Pwsh | Shell::Powershell => '`',
            _ => '\\',
        }
    }

    /// cmd treats everything between double quotes literally
    pub fn escapes_in_double_quotes(self) -> bool {
        self != Shell::Cmd
    }

    /// cmd has no single-quote strings
    pub fn has_single_quotes(self) -> bool {
        self != Shell::Cmd
    }

    /// Name as accepted on the command line and in config files
    pub fn as_str(self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
            Shell::Fish => "fish",
            Shell::Pwsh => "pwsh",
            Shell::Powershell => "powershell",
            Shell::Cmd => "cmd",
            Shell::Nu => "nu",
            Shell::Xonsh => "xonsh",
        }
    }

    /// Final path component of `text`, everything after the last separator
    pub fn path_basename(self, text: &str) -> &str {
        match text.rfind(self.path_separators()) {
            Some(idx) => &text[idx + 1..],
            None => text,
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shell {
    type Err = SuggestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bash" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            "fish" => Ok(Shell::Fish),
            "pwsh" => Ok(Shell::Pwsh),
            "powershell" => Ok(Shell::Powershell),
            "cmd" => Ok(Shell::Cmd),
            "nu" | "nushell" => Ok(Shell::Nu),
            "xonsh" => Ok(Shell::Xonsh),
            other => Err(ConfigError::InvalidValue {
                field: "shell".to_string(),
                value: other.to_string(),
            }
            .into()),
        }
    }
}

/// Outcome of checking whether a token names a location on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolution {
    /// Directory suggestions should be drawn from
    pub cwd: PathBuf,
    /// The token contains a directory part that exists
    pub is_path: bool,
    /// The token ends in a separator, so no final segment is being typed
    pub is_path_complete: bool,
}

impl PathResolution {
    fn plain(cwd: &Path) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            is_path: false,
            is_path_complete: false,
        }
    }
}

/// Resolve the directory a path-like token points into
///
/// A token is path-like when it contains a separator of `shell` and its
/// directory part exists relative to `cwd` (or absolutely, or under `~`).
pub async fn resolve_cwd(token: Option<&str>, cwd: &Path, shell: Shell) -> PathResolution {
    let Some(text) = token else {
        return PathResolution::plain(cwd);
    };
    let separators = shell.path_separators();
    let Some(last_sep) = text.rfind(separators) else {
        return PathResolution::plain(cwd);
    };

    let is_path_complete = last_sep + 1 == text.len();
    let dir_part = native_separators(&text[..=last_sep], separators);
    let candidate = expand_home(&dir_part);
    let resolved = if candidate.is_absolute() {
        candidate
    } else {
        cwd.join(candidate)
    };

    match tokio::fs::metadata(&resolved).await {
        Ok(meta) if meta.is_dir() => PathResolution {
            cwd: resolved,
            is_path: true,
            is_path_complete,
        },
        _ => {
            tracing::trace!(dir = %resolved.display(), "path-like token does not resolve");
            PathResolution::plain(cwd)
        }
    }
}

/// Rewrite the shell's separators to the host's so the path can be probed
fn native_separators(path: &str, separators: &[char]) -> String {
    path.split(separators)
        .collect::<Vec<_>>()
        .join(std::path::MAIN_SEPARATOR_STR)
}

/// Expand a leading `~` to the home directory
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            let rest = rest.trim_start_matches(['/', '\\']);
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
