//! Backing stores for grammar documents

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::spec::{SpecValue, SubcommandNode, SubcommandSpec, parse_document};

/// Ordered store of grammar documents addressed by key
///
/// Keys look like `git`, `git/remote` or `@scope/tool`.
#[async_trait]
pub trait SpecSource: Send + Sync {
    /// Every key the source can load, in a stable order
    fn keys(&self) -> Vec<String>;

    /// Load the grammar stored under `key`, `None` when there is none
    async fn load(&self, key: &str) -> Result<Option<SpecValue>>;
}

/// Grammar documents stored as `<dir>/**/*.json`
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    keys: Vec<String>,
}

impl DirectorySource {
    /// Index every JSON document under `dir`
    ///
    /// A missing directory yields an empty source.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let mut keys = Vec::new();

        if !tokio::fs::try_exists(&dir).await? {
            tracing::warn!(dir = %dir.display(), "spec directory does not exist");
            return Ok(Self { dir, keys });
        }

        let mut pending = vec![dir.clone()];
        while let Some(current) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&current).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if path.extension().is_some_and(|ext| ext == "json") {
                    if let Some(key) = key_for(&dir, &path) {
                        keys.push(key);
                    }
                }
            }
        }

        keys.sort();
        tracing::debug!(dir = %dir.display(), count = keys.len(), "indexed spec directory");
        Ok(Self { dir, keys })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut path = self.dir.clone();
        path.extend(key.split('/'));
        path.set_extension("json");
        path
    }
}

/// `git/remote` for `<dir>/git/remote.json`
fn key_for(dir: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(dir).ok()?.with_extension("");
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

#[async_trait]
impl SpecSource for DirectorySource {
    fn keys(&self) -> Vec<String> {
        self.keys.clone()
    }

    async fn load(&self, key: &str) -> Result<Option<SpecValue>> {
        if !self.keys.iter().any(|k| k == key) {
            return Ok(None);
        }
        let path = self.path_for(key);
        tracing::debug!(key, file = %path.display(), "reading spec document");
        let json = tokio::fs::read_to_string(&path).await?;
        let spec = parse_document(key, &json)?;
        Ok(Some(SpecValue::Node(spec.into())))
    }
}

type Factory = Arc<dyn Fn() -> SubcommandNode + Send + Sync>;

enum Entry {
    Document(SubcommandSpec),
    Factory(Factory),
}

/// In-memory grammar store
///
/// Holds decoded documents and node factories. Every load hands out a fresh
/// tree, so deferred nodes start unresolved for each catalog using it.
#[derive(Default)]
pub struct MemorySource {
    keys: Vec<String>,
    entries: HashMap<String, Entry>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, key: impl Into<String>, spec: SubcommandSpec) -> Self {
        self.insert(key.into(), Entry::Document(spec));
        self
    }

    /// Decode and add a JSON grammar document
    pub fn with_json(self, key: impl Into<String>, json: &str) -> Result<Self> {
        let key = key.into();
        let spec = parse_document(&key, json)?;
        Ok(self.with_document(key, spec))
    }

    /// Add a grammar produced on every load by `factory`
    pub fn with_factory<F>(mut self, key: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> SubcommandNode + Send + Sync + 'static,
    {
        self.insert(key.into(), Entry::Factory(Arc::new(factory)));
        self
    }

    fn insert(&mut self, key: String, entry: Entry) {
        if self.entries.insert(key.clone(), entry).is_none() {
            self.keys.push(key);
        }
    }
}

#[async_trait]
impl SpecSource for MemorySource {
    fn keys(&self) -> Vec<String> {
        self.keys.clone()
    }

    async fn load(&self, key: &str) -> Result<Option<SpecValue>> {
        Ok(self.entries.get(key).map(|entry| match entry {
            Entry::Document(spec) => SpecValue::Node(spec.clone().into()),
            Entry::Factory(factory) => SpecValue::Factory(Arc::clone(factory)),
        }))
    }
}
