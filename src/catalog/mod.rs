//! Grammar catalog
//!
//! The catalog owns the set of known root commands and everything needed to
//! turn their grammars into concrete trees: the document source, the
//! per-root cache, registered generators, the spec-location resolver and the
//! shell probe generators may use.

mod source;

pub use source::{DirectorySource, MemorySource, SpecSource};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

use crate::error::{CatalogError, Result, SuggestError};
use crate::spec::{
    ArgumentSlot, Loader, LocationResolver, SpecGenerator, SpecLocation, SpecResolver, SpecValue,
    SubcommandNode, Template, UnsupportedLocations, normalize,
};
use crate::utils::{ProcessProbe, ShellProbe};

type RootCell = Arc<OnceCell<Arc<SubcommandNode>>>;

/// Known grammars and the capabilities needed to load them
pub struct Catalog {
    source: Arc<dyn SpecSource>,
    roots: Vec<String>,
    cache: Mutex<HashMap<String, RootCell>>,
    generators: HashMap<String, Arc<dyn SpecGenerator>>,
    locations: Arc<dyn LocationResolver>,
    probe: Arc<dyn ShellProbe>,
    root_spec: Arc<SubcommandNode>,
    filepath_spec: Arc<SubcommandNode>,
}

impl Catalog {
    /// Build a catalog over `source`
    ///
    /// Root commands are the source keys that are neither nested (`git/remote`)
    /// nor scoped (`@scope/tool`). The list is fixed from here on.
    pub fn new(source: Arc<dyn SpecSource>) -> Self {
        let roots: Vec<String> = source
            .keys()
            .into_iter()
            .filter(|key| !key.contains('/') && !key.contains('@'))
            .collect();

        let root_spec = roots.iter().fold(SubcommandNode::new(["root"]), |node, name| {
            node.with_child(
                SubcommandNode::new([name.as_str()]).with_loader(Loader::Reference(name.clone())),
            )
        });
        let filepath_spec = SubcommandNode::new(["filepaths"]).with_arg(
            ArgumentSlot::new("filepaths")
                .variadic()
                .with_template(Template::Filepaths),
        );

        tracing::debug!(roots = roots.len(), "catalog created");
        Self {
            source,
            roots,
            cache: Mutex::new(HashMap::new()),
            generators: HashMap::new(),
            locations: Arc::new(UnsupportedLocations),
            probe: Arc::new(ProcessProbe::default()),
            root_spec: Arc::new(root_spec),
            filepath_spec: Arc::new(filepath_spec),
        }
    }

    /// Register a generator under the name used by `generator` loaders
    pub fn with_generator(mut self, name: impl Into<String>, generator: Arc<dyn SpecGenerator>) -> Self {
        self.generators.insert(name.into(), generator);
        self
    }

    pub fn with_locations(mut self, locations: Arc<dyn LocationResolver>) -> Self {
        self.locations = locations;
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn ShellProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Root command names in source order
    pub fn root_names(&self) -> &[String] {
        &self.roots
    }

    pub fn has_root(&self, name: &str) -> bool {
        self.roots.iter().any(|root| root == name)
    }

    /// Concrete grammar of the root command `name`
    ///
    /// Loaded once per root and kept for the catalog's lifetime. Concurrent
    /// first requests for the same root share a single load. Failures are
    /// logged and not cached.
    ///
    /// # Arguments
    /// * `name` - Command name as typed, e.g. `git`
    ///
    /// # Returns
    /// * `Option<Arc<SubcommandNode>>` - The grammar, or `None` if unknown or unloadable
    pub async fn load_root(&self, name: &str) -> Option<Arc<SubcommandNode>> {
        if !self.has_root(name) {
            tracing::debug!(name, "no spec for root command");
            return None;
        }

        let cell = {
            let mut cache = self.cache.lock().await;
            Arc::clone(cache.entry(name.to_string()).or_default())
        };
        if let Some(node) = cell.get() {
            tracing::trace!(name, "root spec cache hit");
            return Some(Arc::clone(node));
        }

        let loaded = cell
            .get_or_try_init(|| async {
                tracing::debug!(name, "loading root spec");
                let value = self
                    .source
                    .load(name)
                    .await?
                    .ok_or_else(|| CatalogError::SpecNotFound(name.to_string()))?;
                let node = normalize(value).ok_or_else(|| CatalogError::MalformedSpec {
                    key: name.to_string(),
                    reason: "grammar has no name".to_string(),
                })?;
                let node = SpecResolver::new(self)
                    .resolve_node(&Arc::new(node), name)
                    .await
                    .ok_or_else(|| CatalogError::SpecNotFound(name.to_string()))?;
                Ok::<_, SuggestError>(node)
            })
            .await;

        match loaded {
            Ok(node) => Some(Arc::clone(node)),
            Err(e) => {
                tracing::warn!(name, error = %e, "failed to load root spec");
                None
            }
        }
    }

    /// Load the document stored under `key`, bypassing the root cache
    pub async fn load_reference(&self, key: &str) -> Result<Option<SpecValue>> {
        self.source.load(key).await
    }

    /// Load the grammar an external location points at
    pub async fn load_location(&self, location: &SpecLocation) -> Result<Option<SpecValue>> {
        match location {
            SpecLocation::Global { name } => self.source.load(name).await,
            SpecLocation::Local { path, name } => {
                self.locations.resolve_local(path.as_deref(), name).await
            }
        }
    }

    pub fn generator(&self, name: &str) -> Result<Arc<dyn SpecGenerator>> {
        self.generators
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownGenerator(name.to_string()).into())
    }

    pub fn probe(&self) -> &dyn ShellProbe {
        self.probe.as_ref()
    }

    /// Grammar whose children are all root commands
    pub fn root_spec(&self) -> Arc<SubcommandNode> {
        Arc::clone(&self.root_spec)
    }

    /// Grammar accepting any number of file paths
    pub fn filepath_spec(&self) -> Arc<SubcommandNode> {
        Arc::clone(&self.filepath_spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn source() -> MemorySource {
        MemorySource::new()
            .with_json("git", r#"{ "name": "git", "subcommands": [{ "name": "checkout" }] }"#)
            .unwrap()
            .with_json("git/remote", r#"{ "name": "remote" }"#)
            .unwrap()
            .with_json("@withfig/tool", r#"{ "name": "tool" }"#)
            .unwrap()
            .with_json("cd", r#"{ "name": "cd" }"#)
            .unwrap()
    }

    #[test]
    fn test_root_names_exclude_nested_and_scoped() {
        let catalog = Catalog::new(Arc::new(source()));
        assert_eq!(catalog.root_names(), ["git", "cd"]);
        assert!(catalog.has_root("git"));
        assert!(!catalog.has_root("git/remote"));

        let root = catalog.root_spec();
        let names: Vec<&str> = root.children.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["git", "cd"]);
        assert!(catalog.filepath_spec().args[0].is_variadic);
    }

    #[tokio::test]
    async fn test_load_root_is_cached() {
        let catalog = Catalog::new(Arc::new(source()));
        let first = catalog.load_root("git").await.unwrap();
        let second = catalog.load_root("git").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.children[0].name(), "checkout");
        assert!(catalog.load_root("hg").await.is_none());
    }

    #[tokio::test]
    async fn test_load_root_runs_factory_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let source = MemorySource::new().with_factory("make", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            SubcommandNode::new(["make"])
        });
        let catalog = Catalog::new(Arc::new(source));

        let (a, b) = tokio::join!(catalog.load_root("make"), catalog.load_root("make"));
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_deferred_root_document_is_resolved() {
        let source = MemorySource::new()
            .with_json(
                "kubectl",
                r#"{ "name": "kubectl", "loadSpec": { "kind": "reference", "key": "kubectl/v1" } }"#,
            )
            .unwrap()
            .with_json("kubectl/v1", r#"{ "name": "kubectl", "subcommands": [{ "name": "get" }] }"#)
            .unwrap();
        let catalog = Catalog::new(Arc::new(source));

        let root = catalog.load_root("kubectl").await.unwrap();
        assert_eq!(root.children[0].name(), "get");
    }

    #[tokio::test]
    async fn test_global_location_reads_source() {
        let catalog = Catalog::new(Arc::new(source()));
        let value = catalog
            .load_location(&SpecLocation::Global {
                name: "git/remote".to_string(),
            })
            .await
            .unwrap();
        assert!(value.is_some());

        let err = catalog
            .load_location(&SpecLocation::Local {
                path: None,
                name: "x".to_string(),
            })
            .await;
        assert!(err.is_err());
    }

    #[test]
    fn test_unknown_generator() {
        let catalog = Catalog::new(Arc::new(source()));
        assert!(catalog.generator("nope").is_err());
    }
}
