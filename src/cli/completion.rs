//! Shell completion generation for shellsuggest
//!
//! The generated scripts complete the tool's own flags and subcommands. For
//! bash, zsh and fish the `specs` subcommand additionally completes the
//! command names known to the catalog.

use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::cli::CliArgs;
use crate::error::{ConfigError, Result};

const BIN_NAME: &str = "shellsuggest";

/// Build the completion script for `shell_name`
pub fn generate_completion(shell_name: &str) -> Result<String> {
    let shell = parse_shell(shell_name)?;
    let base = base_completion(shell);

    let script = match shell {
        Shell::Bash => format!(
            r#"{base}
_shellsuggest_specs() {{
    local cur="${{COMP_WORDS[COMP_CWORD]}}"
    if [[ "${{COMP_WORDS[1]}}" == "specs" && $COMP_CWORD -eq 2 ]]; then
        COMPREPLY=($(compgen -W "$(shellsuggest specs 2>/dev/null)" -- "$cur"))
        return 0
    fi
    _shellsuggest "$@"
}}
complete -F _shellsuggest_specs -o bashdefault -o default shellsuggest
"#
        ),
        Shell::Zsh => format!(
            r#"{base}
_shellsuggest_specs() {{
    if [[ ${{words[2]}} == "specs" && $CURRENT -eq 3 ]]; then
        local -a names
        names=($(shellsuggest specs 2>/dev/null))
        _describe 'commands' names
        return 0
    fi
    _shellsuggest "$@"
}}
compdef _shellsuggest_specs shellsuggest
"#
        ),
        Shell::Fish => format!(
            r#"{base}
complete -c shellsuggest -n "__fish_seen_subcommand_from specs" -f -a "(shellsuggest specs 2>/dev/null)" -d "Catalog command"
"#
        ),
        _ => base,
    };

    Ok(script)
}

fn base_completion(shell: Shell) -> String {
    let mut cmd = CliArgs::command();
    let mut buffer = Vec::new();
    generate(shell, &mut cmd, BIN_NAME, &mut buffer);
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Parse shell name string to clap_complete's Shell
fn parse_shell(shell_name: &str) -> Result<Shell> {
    match shell_name.to_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        "powershell" | "pwsh" => Ok(Shell::PowerShell),
        "elvish" => Ok(Shell::Elvish),
        _ => Err(ConfigError::InvalidValue {
            field: "shell".to_string(),
            value: shell_name.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shell() {
        assert!(matches!(parse_shell("bash"), Ok(Shell::Bash)));
        assert!(matches!(parse_shell("ZSH"), Ok(Shell::Zsh)));
        assert!(matches!(parse_shell("pwsh"), Ok(Shell::PowerShell)));
        assert!(parse_shell("tcsh").is_err());
    }

    #[test]
    fn test_bash_script_completes_catalog_names() {
        let script = generate_completion("bash").unwrap();
        assert!(script.contains("_shellsuggest"));
        assert!(script.contains("shellsuggest specs"));
    }

    #[test]
    fn test_powershell_is_plain_clap_output() {
        let script = generate_completion("powershell").unwrap();
        assert!(script.contains("shellsuggest"));
        assert!(!script.contains("_shellsuggest_specs"));
    }
}
