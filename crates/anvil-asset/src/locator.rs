//! Namespace-aware model file lookup

use crate::types::ModelRef;
use anvil_core::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolves model references to files under `<assets_root>/<namespace>/models/`.
///
/// Lookup order for a reference:
/// 1. its explicit namespace, when it has one
/// 2. every known namespace, in sorted order
/// 3. the fallback namespace (usually `minecraft`)
///
/// The locator holds no mutable state, so concurrent lookups are safe.
#[derive(Debug, Clone)]
pub struct AssetLocator {
    assets_root: PathBuf,
    namespaces: Vec<String>,
    fallback_namespace: String,
}

impl AssetLocator {
    /// Create a locator with an explicit namespace list
    pub fn new<P: AsRef<Path>>(
        assets_root: P,
        namespaces: Vec<String>,
        fallback_namespace: &str,
    ) -> Self {
        let mut namespaces = namespaces;
        namespaces.sort();
        namespaces.dedup();
        Self {
            assets_root: assets_root.as_ref().to_path_buf(),
            namespaces,
            fallback_namespace: fallback_namespace.to_string(),
        }
    }

    /// Create a locator from the namespace directories directly under
    /// `assets_root`. Only that one directory level is listed.
    pub fn discover<P: AsRef<Path>>(assets_root: P, fallback_namespace: &str) -> Result<Self> {
        let root = assets_root.as_ref();
        let mut namespaces = Vec::new();

        if root.is_dir() {
            for entry in fs::read_dir(root)? {
                let entry = entry?;
                if entry.file_type()?.is_dir() {
                    if let Some(name) = entry.file_name().to_str() {
                        namespaces.push(name.to_string());
                    }
                }
            }
        } else {
            tracing::warn!(root = %root.display(), "Assets root does not exist");
        }

        tracing::debug!(count = namespaces.len(), "Discovered asset namespaces");
        Ok(Self::new(root, namespaces, fallback_namespace))
    }

    pub fn assets_root(&self) -> &Path {
        &self.assets_root
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn fallback_namespace(&self) -> &str {
        &self.fallback_namespace
    }

    /// Path a model would have inside the given namespace
    pub fn model_path(&self, namespace: &str, model: &ModelRef) -> PathBuf {
        let mut path = self.assets_root.join(namespace).join("models");
        for segment in model.segments() {
            path.push(segment);
        }
        let mut file = path.into_os_string();
        file.push(".json");
        PathBuf::from(file)
    }

    /// Find the file for a model reference, or `None` if no candidate exists
    pub fn locate(&self, model: &ModelRef) -> Option<PathBuf> {
        self.candidates(model).into_iter().find(|p| p.is_file())
    }

    /// Candidate files in lookup order, without touching the filesystem
    pub fn candidates(&self, model: &ModelRef) -> Vec<PathBuf> {
        let mut out = Vec::with_capacity(self.namespaces.len() + 2);
        if let Some(ns) = &model.namespace {
            out.push(self.model_path(ns, model));
        }
        for ns in &self.namespaces {
            if model.namespace.as_deref() != Some(ns.as_str()) {
                out.push(self.model_path(ns, model));
            }
        }
        let fallback = self.model_path(&self.fallback_namespace, model);
        if !out.contains(&fallback) {
            out.push(fallback);
        }
        out
    }
}
