//! On-disk grammar documents
//!
//! Grammars are stored as JSON, one document per catalog key. Field names
//! follow the camelCase convention of completion spec files:
//!
//! ```json
//! {
//!   "name": "git",
//!   "subcommands": [
//!     { "name": ["checkout", "co"], "args": { "name": "branch" } },
//!     { "name": "remote", "loadSpec": { "kind": "reference", "key": "git/remote" } }
//!   ],
//!   "options": [{ "name": ["-C"], "args": { "name": "path", "template": "folders" }, "isPersistent": true }]
//! }
//! ```
//!
//! `loadSpec` is always an explicitly tagged object, so a loader's variant is
//! known from the document and never guessed from its shape.

use serde::Deserialize;
use std::sync::Arc;

use super::model::{
    ArgumentSlot, CommandOption, Loader, StaticSuggestion, SubcommandNode, Template,
};
use crate::error::{CatalogError, Result};

/// A single value or a list of values
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

fn into_vec<T>(value: Option<OneOrMany<T>>) -> Vec<T> {
    value.map(OneOrMany::into_vec).unwrap_or_default()
}

/// Subcommand as written in a grammar document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubcommandSpec {
    pub name: Option<OneOrMany<String>>,
    pub description: Option<String>,
    pub subcommands: Vec<SubcommandSpec>,
    pub options: Vec<OptionSpec>,
    pub args: Option<OneOrMany<ArgSpec>>,
    pub load_spec: Option<LoaderSpec>,
    pub hidden: bool,
    pub priority: Option<u8>,
}

/// Option as written in a grammar document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionSpec {
    pub name: Option<OneOrMany<String>>,
    pub description: Option<String>,
    pub args: Option<OneOrMany<ArgSpec>>,
    pub is_persistent: bool,
    pub is_repeatable: bool,
    pub hidden: bool,
    pub priority: Option<u8>,
}

/// Argument slot as written in a grammar document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArgSpec {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_variadic: bool,
    pub is_optional: bool,
    pub is_command: bool,
    pub template: Option<OneOrMany<String>>,
    pub suggestions: Vec<SuggestionSpec>,
}

/// Static argument suggestion, either a bare string or a described entry
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SuggestionSpec {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        priority: Option<u8>,
    },
}

/// Deferred loader as written in a grammar document
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoaderSpec {
    Inline { spec: Box<SubcommandSpec> },
    Reference { key: String },
    Generator { name: String },
}

/// Decode a grammar document stored under `key`
pub fn parse_document(key: &str, json: &str) -> Result<SubcommandSpec> {
    serde_json::from_str(json).map_err(|e| {
        CatalogError::MalformedSpec {
            key: key.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

impl From<SubcommandSpec> for SubcommandNode {
    fn from(spec: SubcommandSpec) -> Self {
        let node = SubcommandNode {
            names: into_vec(spec.name),
            description: spec.description,
            children: spec
                .subcommands
                .into_iter()
                .map(|child| Arc::new(child.into()))
                .collect(),
            options: spec
                .options
                .into_iter()
                .map(|option| Arc::new(option.into()))
                .collect(),
            args: into_vec(spec.args).into_iter().map(Into::into).collect(),
            hidden: spec.hidden,
            priority: spec.priority,
            ..SubcommandNode::fragment()
        };
        match spec.load_spec {
            Some(loader) => node.with_loader(loader.into()),
            None => node,
        }
    }
}

impl From<OptionSpec> for CommandOption {
    fn from(spec: OptionSpec) -> Self {
        CommandOption {
            names: into_vec(spec.name),
            description: spec.description,
            args: into_vec(spec.args).into_iter().map(Into::into).collect(),
            is_persistent: spec.is_persistent,
            is_repeatable: spec.is_repeatable,
            hidden: spec.hidden,
            priority: spec.priority,
        }
    }
}

impl From<ArgSpec> for ArgumentSlot {
    fn from(spec: ArgSpec) -> Self {
        let templates = into_vec(spec.template)
            .into_iter()
            .filter_map(|name| match name.as_str() {
                "filepaths" => Some(Template::Filepaths),
                "folders" => Some(Template::Folders),
                other => {
                    tracing::trace!(template = other, "ignoring unsupported template");
                    None
                }
            })
            .collect();

        ArgumentSlot {
            name: spec.name.unwrap_or_default(),
            description: spec.description,
            is_variadic: spec.is_variadic,
            is_optional: spec.is_optional,
            is_command: spec.is_command,
            templates,
            suggestions: spec.suggestions.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<SuggestionSpec> for StaticSuggestion {
    fn from(spec: SuggestionSpec) -> Self {
        match spec {
            SuggestionSpec::Name(name) => StaticSuggestion::new(name),
            SuggestionSpec::Detailed {
                name,
                description,
                priority,
            } => StaticSuggestion {
                name,
                description,
                priority,
            },
        }
    }
}

impl From<LoaderSpec> for Loader {
    fn from(spec: LoaderSpec) -> Self {
        match spec {
            LoaderSpec::Inline { spec } => Loader::Inline(Arc::new((*spec).into())),
            LoaderSpec::Reference { key } => Loader::Reference(key),
            LoaderSpec::Generator { name } => Loader::Generator(name),
        }
    }
}
