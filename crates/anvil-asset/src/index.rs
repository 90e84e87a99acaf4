//! Pre-resolved model path index for a batch

use crate::locator::AssetLocator;
use crate::types::ModelRef;
use anvil_core::{AnvilError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Model references resolved once, up front, for one batch.
///
/// Only referenced models are looked up, so building the index costs one
/// locator query per distinct reference no matter how large the pack is.
/// The index is never mutated after `build`, which lets workers share it
/// behind an `Arc` without locking.
#[derive(Debug, Default)]
pub struct PathIndex {
    entries: BTreeMap<ModelRef, Option<PathBuf>>,
}

impl PathIndex {
    /// Resolve every distinct reference through the locator
    pub fn build<'a, I>(locator: &AssetLocator, refs: I) -> Self
    where
        I: IntoIterator<Item = &'a ModelRef>,
    {
        let mut entries = BTreeMap::new();
        for model in refs {
            if entries.contains_key(model) {
                continue;
            }
            let found = locator.locate(model);
            if found.is_none() {
                tracing::warn!(model = %model, "Model not found in any namespace");
            }
            entries.insert(model.clone(), found);
        }

        let index = Self { entries };
        tracing::debug!(
            referenced = index.len(),
            missing = index.missing().len(),
            "Built model path index"
        );
        index
    }

    /// Look up a reference that was part of the build set
    pub fn get(&self, model: &ModelRef) -> Option<&Path> {
        self.entries.get(model).and_then(|p| p.as_deref())
    }

    /// Like `get`, but an unknown or unresolved reference is a resolution error
    pub fn resolve(&self, model: &ModelRef) -> Result<PathBuf> {
        self.get(model)
            .map(Path::to_path_buf)
            .ok_or_else(|| AnvilError::Resolution(format!("Model not found: {}", model)))
    }

    /// References that did not resolve to a file
    pub fn missing(&self) -> Vec<&ModelRef> {
        self.entries
            .iter()
            .filter(|(_, path)| path.is_none())
            .map(|(model, _)| model)
            .collect()
    }

    /// Number of distinct references in the index
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
