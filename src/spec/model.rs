//! Runtime grammar tree
//!
//! A command grammar is a tree of [`SubcommandNode`]s. Nodes may be
//! *deferred*: they carry only their names plus a [`Loader`] describing where
//! the rest of their grammar comes from. The loader runs at most once per node
//! and its outcome is remembered on the node itself (see [`Definition`]).

use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Built-in value sources for an argument slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Files and directories under the working directory
    Filepaths,
    /// Directories under the working directory
    Folders,
}

/// Fixed value offered for an argument slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSuggestion {
    pub name: String,
    pub description: Option<String>,
    pub priority: Option<u8>,
}

impl StaticSuggestion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            priority: None,
        }
    }
}

/// A positional value expected by a subcommand or an option
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentSlot {
    pub name: String,
    pub description: Option<String>,
    /// Consumes any number of consecutive words
    pub is_variadic: bool,
    pub is_optional: bool,
    /// The value names another command whose grammar takes over
    pub is_command: bool,
    pub templates: Vec<Template>,
    pub suggestions: Vec<StaticSuggestion>,
}

impl ArgumentSlot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn variadic(mut self) -> Self {
        self.is_variadic = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    pub fn command(mut self) -> Self {
        self.is_command = true;
        self
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.templates.push(template);
        self
    }

    pub fn with_suggestions<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions
            .extend(values.into_iter().map(StaticSuggestion::new));
        self
    }
}

/// A flag, possibly with its own arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOption {
    /// Aliases, e.g. `["-v", "--verbose"]`
    pub names: Vec<String>,
    pub description: Option<String>,
    pub args: Vec<ArgumentSlot>,
    /// Valid on the declaring subcommand and all of its descendants
    pub is_persistent: bool,
    /// May be suggested again after it was already typed
    pub is_repeatable: bool,
    pub hidden: bool,
    pub priority: Option<u8>,
}

impl CommandOption {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn persistent(mut self) -> Self {
        self.is_persistent = true;
        self
    }

    pub fn with_arg(mut self, slot: ArgumentSlot) -> Self {
        self.args.push(slot);
        self
    }

    /// Exact alias match
    pub fn matches(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Whether any alias of `self` is also an alias of `other`
    pub fn shares_name(&self, other: &CommandOption) -> bool {
        self.names.iter().any(|n| other.matches(n))
    }
}

/// Where a deferred node's grammar comes from
#[derive(Debug, Clone)]
pub enum Loader {
    /// Grammar fragment carried inline
    Inline(Arc<SubcommandNode>),
    /// Catalog key of another grammar document, e.g. `git/remote`
    Reference(String),
    /// Name of a generator registered with the catalog
    Generator(String),
}

/// Resolution state of a node
#[derive(Debug)]
pub enum Definition {
    /// The node's own fields are its whole grammar
    Concrete,
    /// The grammar must be loaded before matching past this node
    Unresolved(Loader),
    /// The loader ran: the merged node, or `None` when it produced nothing
    Resolved(Option<Arc<SubcommandNode>>),
}

/// A command or subcommand in a grammar tree
pub struct SubcommandNode {
    pub names: Vec<String>,
    pub description: Option<String>,
    pub children: Vec<Arc<SubcommandNode>>,
    pub options: Vec<Arc<CommandOption>>,
    pub args: Vec<ArgumentSlot>,
    pub hidden: bool,
    pub priority: Option<u8>,
    pub(crate) definition: Mutex<Definition>,
}

impl SubcommandNode {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            description: None,
            children: Vec::new(),
            options: Vec::new(),
            args: Vec::new(),
            hidden: false,
            priority: None,
            definition: Mutex::new(Definition::Concrete),
        }
    }

    /// A nameless node, used for inline and generated fragments
    pub fn fragment() -> Self {
        Self::new(Vec::<String>::new())
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_child(mut self, child: SubcommandNode) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    pub fn with_option(mut self, option: CommandOption) -> Self {
        self.options.push(Arc::new(option));
        self
    }

    pub fn with_arg(mut self, slot: ArgumentSlot) -> Self {
        self.args.push(slot);
        self
    }

    pub fn with_loader(self, loader: Loader) -> Self {
        Self {
            definition: Mutex::new(Definition::Unresolved(loader)),
            ..self
        }
    }

    /// Primary name, empty for fragments
    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or("")
    }

    pub fn has_name(&self) -> bool {
        !self.names.is_empty()
    }

    /// First child answering to `name` by exact alias equality
    pub fn find_child(&self, name: &str) -> Option<&Arc<SubcommandNode>> {
        self.children
            .iter()
            .find(|child| child.names.iter().any(|n| n == name))
    }

    /// Whether the node is still waiting for its loader to run
    pub async fn is_deferred(&self) -> bool {
        matches!(*self.definition.lock().await, Definition::Unresolved(_))
    }

    /// New concrete node with `fragment`'s populated fields laid over this one
    ///
    /// Empty fields of the fragment leave the corresponding field untouched.
    pub fn overlay(&self, fragment: &SubcommandNode) -> SubcommandNode {
        fn pick<T: Clone>(over: &[T], base: &[T]) -> Vec<T> {
            if over.is_empty() {
                base.to_vec()
            } else {
                over.to_vec()
            }
        }

        SubcommandNode {
            names: pick(&fragment.names, &self.names),
            description: fragment
                .description
                .clone()
                .or_else(|| self.description.clone()),
            children: pick(&fragment.children, &self.children),
            options: pick(&fragment.options, &self.options),
            args: pick(&fragment.args, &self.args),
            hidden: self.hidden,
            priority: fragment.priority.or(self.priority),
            definition: Mutex::new(Definition::Concrete),
        }
    }
}

impl fmt::Debug for SubcommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubcommandNode")
            .field("names", &self.names)
            .field("children", &self.children.len())
            .field("options", &self.options.len())
            .field("args", &self.args.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_aliases() {
        let verbose = CommandOption::new(["-v", "--verbose"]);
        assert!(verbose.matches("-v"));
        assert!(verbose.matches("--verbose"));
        assert!(!verbose.matches("--verb"));

        let other = CommandOption::new(["--verbose", "-V"]);
        assert!(verbose.shares_name(&other));
        assert!(!verbose.shares_name(&CommandOption::new(["-q"])));
    }

    #[test]
    fn test_find_child_by_alias() {
        let node = SubcommandNode::new(["git"])
            .with_child(SubcommandNode::new(["checkout", "co"]))
            .with_child(SubcommandNode::new(["commit"]));

        assert_eq!(node.find_child("co").unwrap().name(), "checkout");
        assert_eq!(node.find_child("commit").unwrap().name(), "commit");
        assert!(node.find_child("che").is_none());
    }

    #[test]
    fn test_overlay_keeps_unset_fields() {
        let base = SubcommandNode::new(["remote"])
            .with_description("Manage remotes")
            .with_option(CommandOption::new(["-v"]));
        let fragment = SubcommandNode::fragment().with_child(SubcommandNode::new(["add"]));

        let merged = base.overlay(&fragment);
        assert_eq!(merged.names, vec!["remote"]);
        assert_eq!(merged.description.as_deref(), Some("Manage remotes"));
        assert_eq!(merged.children.len(), 1);
        assert_eq!(merged.options.len(), 1);
    }

    #[test]
    fn test_overlay_replaces_names_when_given() {
        let base = SubcommandNode::new(["rm"]);
        let fragment = SubcommandNode::new(["remove"]);
        assert_eq!(base.overlay(&fragment).names, vec!["remove"]);
    }

    #[tokio::test]
    async fn test_deferred_flag() {
        let node = SubcommandNode::new(["remote"]).with_loader(Loader::Reference("git/remote".into()));
        assert!(node.is_deferred().await);
        assert!(!SubcommandNode::new(["x"]).is_deferred().await);
    }
}
