//! Grammar generators and spec locations
//!
//! A generator computes a node's grammar when the user types the node's name.
//! It may hand back a fragment directly, or point at one or more external
//! spec locations that must be loaded in turn.

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::document::parse_document;
use super::model::SubcommandNode;
use crate::error::{CatalogError, Result};
use crate::utils::ShellProbe;

/// A grammar value as handed out by catalogs and locations
///
/// Either a ready node or a zero-argument factory producing one.
pub enum SpecValue {
    Node(SubcommandNode),
    Factory(Arc<dyn Fn() -> SubcommandNode + Send + Sync>),
}

impl fmt::Debug for SpecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecValue::Node(node) => f.debug_tuple("Node").field(node).finish(),
            SpecValue::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Pointer to a grammar stored outside the catalog
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SpecLocation {
    /// Document on the local machine, relative to the location base directory
    Local {
        #[serde(default)]
        path: Option<String>,
        name: String,
    },
    /// Document in the catalog itself
    Global { name: String },
}

impl fmt::Display for SpecLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecLocation::Local {
                path: Some(path),
                name,
            } => write!(f, "local:{path}/{name}"),
            SpecLocation::Local { path: None, name } => write!(f, "local:{name}"),
            SpecLocation::Global { name } => write!(f, "global:{name}"),
        }
    }
}

/// What a generator produced
#[derive(Debug)]
pub enum GeneratedSpec {
    /// Fields to merge into the node directly
    Fragment(SubcommandNode),
    /// A single external document
    Location(SpecLocation),
    /// Several external documents, one of which is named like the typed word
    Locations(Vec<SpecLocation>),
}

/// Computes grammar for a deferred node on demand
#[async_trait]
pub trait SpecGenerator: Send + Sync {
    /// Produce grammar for the node the user typed as `token`
    async fn generate(&self, token: &str, probe: &dyn ShellProbe) -> Result<GeneratedSpec>;
}

/// Loads [`SpecLocation::Local`] documents
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve_local(&self, path: Option<&str>, name: &str) -> Result<Option<SpecValue>>;
}

/// Resolver for setups without local spec locations
///
/// Every lookup fails with [`CatalogError::UnsupportedLocation`], which the
/// spec resolver turns into "no node".
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedLocations;

#[async_trait]
impl LocationResolver for UnsupportedLocations {
    async fn resolve_local(&self, path: Option<&str>, name: &str) -> Result<Option<SpecValue>> {
        let location = SpecLocation::Local {
            path: path.map(str::to_string),
            name: name.to_string(),
        };
        Err(CatalogError::UnsupportedLocation(location.to_string()).into())
    }
}

/// Resolver reading `<base>/<path>/<name>.json`
#[derive(Debug, Clone)]
pub struct DirectoryLocations {
    base: PathBuf,
}

impl DirectoryLocations {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

#[async_trait]
impl LocationResolver for DirectoryLocations {
    async fn resolve_local(&self, path: Option<&str>, name: &str) -> Result<Option<SpecValue>> {
        let mut file = self.base.clone();
        if let Some(path) = path {
            file.push(path.trim_matches('/'));
        }
        file.push(format!("{name}.json"));

        let json = match tokio::fs::read_to_string(&file).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(file = %file.display(), "spec location missing");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let spec = parse_document(name, &json)?;
        Ok(Some(SpecValue::Node(spec.into())))
    }
}

/// Generator listing subcommands from an external command's output
///
/// Every non-empty stdout line becomes a child; text after a tab is its
/// description. A failing command yields an empty fragment.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    command: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

#[async_trait]
impl SpecGenerator for CommandGenerator {
    async fn generate(&self, token: &str, probe: &dyn ShellProbe) -> Result<GeneratedSpec> {
        let output = probe.execute(&self.command, &self.args).await?;
        if !output.success() {
            tracing::debug!(
                command = %self.command,
                status = ?output.status,
                token,
                "generator command failed"
            );
            return Ok(GeneratedSpec::Fragment(SubcommandNode::fragment()));
        }

        let fragment = output
            .stdout
            .lines()
            .filter_map(|line| {
                let (name, description) = match line.split_once('\t') {
                    Some((name, description)) => (name.trim(), Some(description.trim())),
                    None => (line.trim(), None),
                };
                if name.is_empty() {
                    return None;
                }
                let node = SubcommandNode::new([name]);
                Some(match description.filter(|d| !d.is_empty()) {
                    Some(description) => node.with_description(description),
                    None => node,
                })
            })
            .fold(SubcommandNode::fragment(), SubcommandNode::with_child);
        Ok(GeneratedSpec::Fragment(fragment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SuggestError;
    use crate::utils::ProbeOutput;

    struct FixedProbe(ProbeOutput);

    #[async_trait]
    impl ShellProbe for FixedProbe {
        async fn execute(&self, _command: &str, _args: &[String]) -> Result<ProbeOutput> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_command_generator_lines_become_children() {
        let probe = FixedProbe(ProbeOutput {
            stdout: "build\tCompile the project\n\ntest\n".to_string(),
            stderr: String::new(),
            status: Some(0),
        });
        let generated = CommandGenerator::new("npm", vec!["run".to_string()])
            .generate("run", &probe)
            .await
            .unwrap();
        match generated {
            GeneratedSpec::Fragment(node) => {
                assert_eq!(node.children.len(), 2);
                assert_eq!(node.children[0].name(), "build");
                assert_eq!(
                    node.children[0].description.as_deref(),
                    Some("Compile the project")
                );
                assert_eq!(node.children[1].name(), "test");
            }
            other => panic!("Expected fragment, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_command_generator_failure_is_empty() {
        let probe = FixedProbe(ProbeOutput {
            stdout: "junk".to_string(),
            stderr: "boom".to_string(),
            status: Some(1),
        });
        let generated = CommandGenerator::new("false", Vec::new())
            .generate("x", &probe)
            .await
            .unwrap();
        assert!(matches!(generated, GeneratedSpec::Fragment(node) if node.children.is_empty()));
    }

    #[test]
    fn test_location_deserialize() {
        let loc: SpecLocation =
            serde_json::from_str(r#"{ "type": "local", "path": "plugins", "name": "foo" }"#).unwrap();
        assert_eq!(
            loc,
            SpecLocation::Local {
                path: Some("plugins".to_string()),
                name: "foo".to_string()
            }
        );
        assert_eq!(loc.to_string(), "local:plugins/foo");

        let loc: SpecLocation = serde_json::from_str(r#"{ "type": "global", "name": "git" }"#).unwrap();
        assert_eq!(loc.to_string(), "global:git");
    }

    #[tokio::test]
    async fn test_unsupported_locations() {
        let err = UnsupportedLocations
            .resolve_local(None, "foo")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SuggestError::Catalog(CatalogError::UnsupportedLocation(_))
        ));
    }

    #[tokio::test]
    async fn test_directory_locations() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("plugins")).unwrap();
        std::fs::write(
            dir.path().join("plugins").join("deploy.json"),
            r#"{ "name": "deploy", "subcommands": [{ "name": "prod" }] }"#,
        )
        .unwrap();

        let resolver = DirectoryLocations::new(dir.path());
        let value = resolver
            .resolve_local(Some("plugins"), "deploy")
            .await
            .unwrap();
        match value {
            Some(SpecValue::Node(node)) => {
                assert_eq!(node.name(), "deploy");
                assert_eq!(node.children[0].name(), "prod");
            }
            other => panic!("Expected node, got {other:?}"),
        }

        assert!(resolver.resolve_local(None, "missing").await.unwrap().is_none());
    }
}
