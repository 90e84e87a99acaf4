//! Turning item definitions into conversion jobs
//!
//! An item definition maps custom-model-data thresholds to model references.
//! Each entry becomes one job named `<item>_cmd<threshold>`. Model paths are
//! resolved through a `PathIndex` built once over exactly the referenced
//! models, so planning never walks the pack.

use crate::job::{ConversionJob, JobFailure};
use anvil_asset::{AssetLocator, ModelRef, PathIndex};
use anvil_core::{AnvilError, FailureKind, Result};
use anvil_import::load_model;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Threshold assigned to an item's fallback model
pub const FALLBACK_THRESHOLD: i64 = -1;

/// A parsed item definition
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemDefinition {
    pub model: ModelSelector,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelSelector {
    #[serde(default)]
    pub entries: Vec<ThresholdEntry>,
    #[serde(default)]
    pub fallback: Option<ModelPointer>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThresholdEntry {
    #[serde(default)]
    pub threshold: i64,
    #[serde(default)]
    pub model: Option<ModelPointer>,
}

/// Either `{"model": "ns:path"}` or a bare `"ns:path"` string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ModelPointer {
    Bare(String),
    Wrapped {
        #[serde(default)]
        model: Option<String>,
    },
}

impl ModelPointer {
    pub fn reference(&self) -> Option<&str> {
        match self {
            ModelPointer::Bare(r) => Some(r.as_str()),
            ModelPointer::Wrapped { model } => model.as_deref(),
        }
        .filter(|r| !r.trim().is_empty())
    }
}

impl ItemDefinition {
    /// Item definitions are JSON only; YAML sources are not read
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// `(threshold, model reference)` pairs; the fallback comes last with
    /// threshold -1. Entries without a reference are skipped.
    pub fn model_entries(&self) -> Vec<(i64, &str)> {
        let mut out: Vec<(i64, &str)> = self
            .model
            .entries
            .iter()
            .filter_map(|e| {
                let reference = e.model.as_ref().and_then(ModelPointer::reference);
                if reference.is_none() {
                    tracing::debug!(threshold = e.threshold, "Entry without a model reference skipped");
                }
                reference.map(|r| (e.threshold, r))
            })
            .collect();
        if let Some(reference) = self.model.fallback.as_ref().and_then(ModelPointer::reference) {
            out.push((FALLBACK_THRESHOLD, reference));
        }
        out
    }
}

/// Lowercase, with spaces and dashes turned into underscores
pub fn normalize_item_name(name: &str) -> String {
    name.replace([' ', '-'], "_").to_lowercase()
}

/// Output name for one threshold of an item
pub fn output_name(item: &str, threshold: i64) -> String {
    format!("{}_cmd{}", normalize_item_name(item), threshold)
}

/// Texture key for a model: its primary texture with a leading `item/`
/// dropped from the path, or the model's own path when it names none.
pub fn texture_key_for(model_path: &Path, model: &ModelRef) -> String {
    let primary = match load_model(model_path) {
        Ok(parsed) => parsed.primary_texture().map(str::to_string),
        Err(e) => {
            tracing::warn!(model = %model, error = %e, "Could not read textures");
            None
        }
    };

    match primary {
        Some(reference) => {
            let (namespace, path) = match reference.split_once(':') {
                Some((ns, path)) => (Some(ns), path),
                None => (None, reference.as_str()),
            };
            let path = path.strip_prefix("item/").unwrap_or(path);
            match namespace {
                Some(ns) if !ns.is_empty() => format!("{}:{}", ns, path),
                _ => path.to_string(),
            }
        }
        None => model.path.clone(),
    }
}

/// Jobs ready for the orchestrator plus the entries that could not be planned
#[derive(Debug, Default)]
pub struct JobPlan {
    pub jobs: Vec<ConversionJob>,
    pub failures: Vec<JobFailure>,
}

/// Plan one job per model entry of every item
pub fn plan_jobs(items: &[(String, ItemDefinition)], locator: &AssetLocator) -> JobPlan {
    let mut planned: Vec<(String, std::result::Result<ModelRef, (String, AnvilError)>)> = Vec::new();

    for (item, definition) in items {
        for (threshold, reference) in definition.model_entries() {
            let name = output_name(item, threshold);
            let parsed = ModelRef::parse(reference).map_err(|e| (reference.to_string(), e));
            planned.push((name, parsed));
        }
    }

    let index = PathIndex::build(
        locator,
        planned.iter().filter_map(|(_, r)| r.as_ref().ok()),
    );

    let mut plan = JobPlan::default();
    for (name, parsed) in planned {
        let model = match parsed {
            Ok(model) => model,
            Err((reference, err)) => {
                plan.failures
                    .push(unplanned(&name, PathBuf::from(reference), err.kind(), err.to_string()));
                continue;
            }
        };
        match index.resolve(&model) {
            Ok(path) => {
                let texture_key = texture_key_for(&path, &model);
                plan.jobs.push(ConversionJob::new(name, path, texture_key));
            }
            Err(err) => {
                plan.failures.push(unplanned(
                    &name,
                    PathBuf::from(model.to_string()),
                    err.kind(),
                    err.to_string(),
                ));
            }
        }
    }

    tracing::info!(
        jobs = plan.jobs.len(),
        unresolved = plan.failures.len(),
        "Planned conversion jobs"
    );
    plan
}

fn unplanned(name: &str, source: PathBuf, kind: FailureKind, message: String) -> JobFailure {
    JobFailure {
        source,
        output_name: name.to_string(),
        kind,
        message,
    }
}
