//! Resolution of deferred grammar nodes
//!
//! A child found by name may still be deferred. Its loader runs while the
//! node's definition lock is held, so concurrent lookups of the same node wait
//! for the first one and then reuse its outcome. The outcome (merged node or
//! nothing) replaces the loader on the node.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use super::generator::{GeneratedSpec, SpecLocation, SpecValue};
use super::model::{Definition, Loader, SubcommandNode};
use crate::catalog::Catalog;

/// Turn a grammar value into a node, invoking its factory if needed
///
/// Returns `None` when the produced node has no name.
pub fn normalize(value: SpecValue) -> Option<SubcommandNode> {
    let node = match value {
        SpecValue::Node(node) => node,
        SpecValue::Factory(factory) => factory(),
    };
    if node.has_name() {
        Some(node)
    } else {
        debug!("grammar value has no name");
        None
    }
}

/// Resolves children of grammar nodes against a catalog
#[derive(Clone, Copy)]
pub struct SpecResolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> SpecResolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Find the child of `parent` named `token` and make sure it is concrete
    ///
    /// Returns `None` when no child has that name, or when its loader yields
    /// no usable grammar.
    ///
    /// # Arguments
    /// * `parent` - Node whose children are searched
    /// * `token` - Word naming the child
    pub async fn resolve_child(
        &self,
        parent: &SubcommandNode,
        token: &str,
    ) -> Option<Arc<SubcommandNode>> {
        let child = parent.find_child(token)?;
        self.resolve_node(child, token).await
    }

    /// Make sure `node` is concrete, running its loader if it has not run yet
    pub async fn resolve_node(
        &self,
        node: &Arc<SubcommandNode>,
        token: &str,
    ) -> Option<Arc<SubcommandNode>> {
        let mut definition = node.definition.lock().await;

        let loader = match std::mem::replace(&mut *definition, Definition::Resolved(None)) {
            Definition::Unresolved(loader) => loader,
            Definition::Concrete => {
                *definition = Definition::Concrete;
                return Some(Arc::clone(node));
            }
            Definition::Resolved(resolved) => {
                *definition = Definition::Resolved(resolved.clone());
                return resolved;
            }
        };

        debug!(token, ?loader, "resolving deferred subcommand");
        let resolved = self.load(node, loader, token).await.map(Arc::new);
        *definition = Definition::Resolved(resolved.clone());
        resolved
    }

    async fn load(
        &self,
        child: &SubcommandNode,
        loader: Loader,
        token: &str,
    ) -> Option<SubcommandNode> {
        match loader {
            Loader::Inline(fragment) => Some(child.overlay(&fragment)),
            Loader::Reference(key) => {
                let value = match self.catalog.load_reference(&key).await {
                    Ok(Some(value)) => value,
                    Ok(None) => {
                        debug!(key = %key, "referenced spec not found");
                        return None;
                    }
                    Err(e) => {
                        warn!(key = %key, error = %e, "failed to load referenced spec");
                        return None;
                    }
                };
                normalize(value).map(|loaded| child.overlay(&loaded))
            }
            Loader::Generator(name) => {
                let generated = match self.catalog.generator(&name) {
                    Ok(generator) => generator.generate(token, self.catalog.probe()).await,
                    Err(e) => Err(e),
                };
                match generated {
                    Ok(spec) => self.merge_generated(child, spec, token).await,
                    Err(e) => {
                        warn!(generator = %name, error = %e, "spec generator failed");
                        None
                    }
                }
            }
        }
    }

    async fn merge_generated(
        &self,
        child: &SubcommandNode,
        generated: GeneratedSpec,
        token: &str,
    ) -> Option<SubcommandNode> {
        match generated {
            GeneratedSpec::Fragment(fragment) => Some(child.overlay(&fragment)),
            GeneratedSpec::Location(location) => self
                .load_location(&location)
                .await
                .map(|loaded| child.overlay(&loaded)),
            GeneratedSpec::Locations(locations) => {
                let loaded = join_all(locations.iter().map(|loc| self.load_location(loc))).await;
                loaded
                    .into_iter()
                    .flatten()
                    .find(|node| node.names.iter().any(|n| n == token))
                    .map(|matching| child.overlay(&matching))
            }
        }
    }

    async fn load_location(&self, location: &SpecLocation) -> Option<SubcommandNode> {
        match self.catalog.load_location(location).await {
            Ok(Some(value)) => normalize(value),
            Ok(None) => {
                debug!(%location, "spec location not found");
                None
            }
            Err(e) => {
                debug!(%location, error = %e, "spec location not loaded");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemorySource;
    use crate::error::Result;
    use crate::spec::generator::{DirectoryLocations, SpecGenerator};
    use crate::utils::ShellProbe;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGenerator {
        calls: Arc<AtomicUsize>,
        output: fn() -> GeneratedSpec,
    }

    #[async_trait]
    impl SpecGenerator for CountingGenerator {
        async fn generate(&self, _token: &str, _probe: &dyn ShellProbe) -> Result<GeneratedSpec> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((self.output)())
        }
    }

    fn plugin_fragment() -> GeneratedSpec {
        GeneratedSpec::Fragment(
            SubcommandNode::fragment().with_child(SubcommandNode::new(["install"])),
        )
    }

    fn catalog_with(generator: Option<CountingGenerator>) -> Catalog {
        let source = MemorySource::new()
            .with_json("tool/sub", r#"{ "name": "sub", "subcommands": [{ "name": "deep" }] }"#)
            .unwrap();
        let catalog = Catalog::new(Arc::new(source));
        match generator {
            Some(generator) => catalog.with_generator("plugins", Arc::new(generator)),
            None => catalog,
        }
    }

    #[test]
    fn test_normalize_factory() {
        let value = SpecValue::Factory(Arc::new(|| SubcommandNode::new(["made"])));
        assert_eq!(normalize(value).unwrap().name(), "made");

        let nameless = SpecValue::Factory(Arc::new(SubcommandNode::fragment));
        assert!(normalize(nameless).is_none());
    }

    #[tokio::test]
    async fn test_resolve_concrete_child() {
        let catalog = catalog_with(None);
        let parent = SubcommandNode::new(["tool"]).with_child(SubcommandNode::new(["run", "r"]));

        let child = SpecResolver::new(&catalog).resolve_child(&parent, "r").await.unwrap();
        assert_eq!(child.name(), "run");
        assert!(
            SpecResolver::new(&catalog)
                .resolve_child(&parent, "missing")
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_resolve_inline_loader() {
        let catalog = catalog_with(None);
        let fragment = SubcommandNode::fragment().with_child(SubcommandNode::new(["pop"]));
        let parent = SubcommandNode::new(["git"])
            .with_child(SubcommandNode::new(["stash"]).with_loader(Loader::Inline(Arc::new(fragment))));

        let stash = SpecResolver::new(&catalog)
            .resolve_child(&parent, "stash")
            .await
            .unwrap();
        assert_eq!(stash.name(), "stash");
        assert_eq!(stash.children[0].name(), "pop");
        assert!(!parent.children[0].is_deferred().await);
    }

    #[tokio::test]
    async fn test_resolve_reference_loader() {
        let catalog = catalog_with(None);
        let parent = SubcommandNode::new(["tool"]).with_child(
            SubcommandNode::new(["sub"]).with_loader(Loader::Reference("tool/sub".into())),
        );

        let sub = SpecResolver::new(&catalog)
            .resolve_child(&parent, "sub")
            .await
            .unwrap();
        assert_eq!(sub.children[0].name(), "deep");
    }

    #[tokio::test]
    async fn test_missing_reference_yields_none() {
        let catalog = catalog_with(None);
        let parent = SubcommandNode::new(["tool"]).with_child(
            SubcommandNode::new(["gone"]).with_loader(Loader::Reference("tool/gone".into())),
        );

        let resolver = SpecResolver::new(&catalog);
        assert!(resolver.resolve_child(&parent, "gone").await.is_none());
        assert!(resolver.resolve_child(&parent, "gone").await.is_none());
    }

    #[tokio::test]
    async fn test_generator_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let catalog = catalog_with(Some(CountingGenerator {
            calls: calls.clone(),
            output: plugin_fragment,
        }));
        let parent = SubcommandNode::new(["tool"]).with_child(
            SubcommandNode::new(["plugin"]).with_loader(Loader::Generator("plugins".into())),
        );

        let resolver = SpecResolver::new(&catalog);
        let first = resolver.resolve_child(&parent, "plugin").await.unwrap();
        let second = resolver.resolve_child(&parent, "plugin").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.children[0].name(), "install");
    }

    #[tokio::test]
    async fn test_concurrent_resolution_runs_loader_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let catalog = catalog_with(Some(CountingGenerator {
            calls: calls.clone(),
            output: plugin_fragment,
        }));
        let parent = SubcommandNode::new(["tool"]).with_child(
            SubcommandNode::new(["plugin"]).with_loader(Loader::Generator("plugins".into())),
        );

        let resolver = SpecResolver::new(&catalog);
        let (a, b) = tokio::join!(
            resolver.resolve_child(&parent, "plugin"),
            resolver.resolve_child(&parent, "plugin")
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    }

    #[tokio::test]
    async fn test_unknown_generator_yields_none() {
        let catalog = catalog_with(None);
        let parent = SubcommandNode::new(["tool"]).with_child(
            SubcommandNode::new(["plugin"]).with_loader(Loader::Generator("nobody".into())),
        );
        assert!(
            SpecResolver::new(&catalog)
                .resolve_child(&parent, "plugin")
                .await
                .is_none()
        );
    }

    fn local_location() -> GeneratedSpec {
        GeneratedSpec::Location(SpecLocation::Local {
            path: None,
            name: "deploy".to_string(),
        })
    }

    fn location_list() -> GeneratedSpec {
        GeneratedSpec::Locations(vec![
            SpecLocation::Global {
                name: "missing".to_string(),
            },
            SpecLocation::Local {
                path: None,
                name: "deploy".to_string(),
            },
        ])
    }

    #[tokio::test]
    async fn test_unsupported_location_yields_none() {
        let catalog = catalog_with(Some(CountingGenerator {
            calls: Arc::new(AtomicUsize::new(0)),
            output: local_location,
        }));
        let parent = SubcommandNode::new(["tool"]).with_child(
            SubcommandNode::new(["deploy"]).with_loader(Loader::Generator("plugins".into())),
        );
        assert!(
            SpecResolver::new(&catalog)
                .resolve_child(&parent, "deploy")
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_location_list_picks_matching_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("deploy.json"),
            r#"{ "name": "deploy", "args": { "name": "target" } }"#,
        )
        .unwrap();

        let catalog = catalog_with(Some(CountingGenerator {
            calls: Arc::new(AtomicUsize::new(0)),
            output: location_list,
        }))
        .with_locations(Arc::new(DirectoryLocations::new(dir.path())));
        let parent = SubcommandNode::new(["tool"]).with_child(
            SubcommandNode::new(["deploy"]).with_loader(Loader::Generator("plugins".into())),
        );

        let deploy = SpecResolver::new(&catalog)
            .resolve_child(&parent, "deploy")
            .await
            .unwrap();
        assert_eq!(deploy.args[0].name, "target");
    }
}
