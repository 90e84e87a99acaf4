//! Per-job conversion work
//!
//! The orchestrator only knows the `JobExecutor` seam. The real executor
//! runs parse, transform, write geometry, write render-binding, in that
//! order, touching only the job's own source and output files. Both
//! artifacts are staged next to their final paths and only published once
//! the job commits against its `CancelToken`, so an abandoned job leaves
//! neither file behind.

use crate::job::{ConversionJob, JobArtifacts};
use crate::layout::OutputLayout;
use anvil_core::{AnvilError, ContentHash, Result};
use anvil_geo::{convert, ConvertRequest, EngineOptions};
use anvil_import::load_model;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

const RUNNING: u8 = 0;
const COMMITTED: u8 = 1;
const CANCELLED: u8 = 2;

/// Shared between the orchestrator and one running job.
///
/// Exactly one side wins: either the job commits its writes, or the
/// orchestrator cancels it once its deadline passes.
#[derive(Debug, Clone)]
pub struct CancelToken {
    state: Arc<AtomicU8>,
    limit: Duration,
}

impl CancelToken {
    /// `limit` is the timeout reported when the job is cancelled
    pub fn new(limit: Duration) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(RUNNING)),
            limit,
        }
    }

    /// Returns false if the job already committed its writes
    pub fn cancel(&self) -> bool {
        match self
            .state
            .compare_exchange(RUNNING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => true,
            Err(current) => current == CANCELLED,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::SeqCst) == CANCELLED
    }

    /// `Timeout` once cancelled
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(AnvilError::Timeout(self.limit))
        } else {
            Ok(())
        }
    }

    /// Claim the right to publish output. Fails with `Timeout` if the
    /// orchestrator cancelled first.
    pub fn commit(&self) -> Result<()> {
        match self
            .state
            .compare_exchange(RUNNING, COMMITTED, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => Ok(()),
            Err(COMMITTED) => Ok(()),
            Err(_) => Err(AnvilError::Timeout(self.limit)),
        }
    }
}

/// Work performed for one job on a worker thread
pub trait JobExecutor: Send + Sync + 'static {
    /// Implementations must not publish output unless `cancel.commit()` succeeds
    fn execute(&self, job: &ConversionJob, cancel: &CancelToken) -> Result<JobArtifacts>;
}

/// Converts a source model and writes both artifacts into an `OutputLayout`
#[derive(Debug, Clone)]
pub struct GeometryJobExecutor {
    layout: OutputLayout,
    options: EngineOptions,
}

impl GeometryJobExecutor {
    pub fn new(layout: OutputLayout, options: EngineOptions) -> Self {
        Self { layout, options }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }
}

impl JobExecutor for GeometryJobExecutor {
    fn execute(&self, job: &ConversionJob, cancel: &CancelToken) -> Result<JobArtifacts> {
        let model = load_model(&job.source)?;
        cancel.check()?;

        let request = ConvertRequest {
            name: job.output_name.clone(),
            texture_ref: job.texture_key.clone(),
            options: self.options.clone(),
        };
        let conversion = convert(&model, &request)?;
        let (geometry_bytes, controller_bytes) = conversion.to_bytes()?;
        cancel.check()?;

        let geometry_path = self.layout.geometry_path(&job.output_name);
        let render_controller_path = self.layout.render_controller_path(&job.output_name);

        let geometry_staged = stage_artifact(&geometry_path, &geometry_bytes)?;
        let controller_staged = match stage_artifact(&render_controller_path, &controller_bytes) {
            Ok(staged) => staged,
            Err(e) => {
                discard(&[&geometry_staged]);
                return Err(e);
            }
        };

        if let Err(e) = cancel.commit() {
            tracing::debug!(output = %job.output_name, "Cancelled before publishing");
            discard(&[&geometry_staged, &controller_staged]);
            return Err(e);
        }

        publish(&geometry_staged, &geometry_path)?;
        publish(&controller_staged, &render_controller_path)?;

        let geometry_hash = ContentHash::from_bytes(&geometry_bytes);
        let render_controller_hash = ContentHash::from_bytes(&controller_bytes);
        tracing::debug!(
            output = %job.output_name,
            geometry = %geometry_hash,
            "Wrote conversion artifacts"
        );

        Ok(JobArtifacts {
            geometry_path,
            geometry_hash,
            render_controller_path,
            render_controller_hash,
        })
    }
}

/// Sibling of `path` that holds bytes until they are published
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

fn stage_artifact(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| AnvilError::write(parent, e))?;
    }
    let staged = staging_path(path);
    fs::write(&staged, bytes).map_err(|e| AnvilError::write(&staged, e))?;
    Ok(staged)
}

fn publish(staged: &Path, path: &Path) -> Result<()> {
    fs::rename(staged, path).map_err(|e| AnvilError::write(path, e))
}

fn discard(staged: &[&Path]) {
    for path in staged {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "Could not remove staged artifact");
        }
    }
}
