//! Anvil Batch - Parallel conversion pipeline
//!
//! Plans conversion jobs from item definitions, runs them across a bounded
//! worker pool with per-job timeouts and failure isolation, and checks the
//! written artifacts for referential consistency afterwards.

pub mod batch;
pub mod config;
pub mod executor;
pub mod job;
pub mod layout;
pub mod plan;
pub mod validate;

pub use batch::BatchOrchestrator;
pub use config::AnvilConfig;
pub use executor::{CancelToken, GeometryJobExecutor, JobExecutor};
pub use job::{BatchReport, ConversionJob, JobArtifacts, JobFailure, JobSuccess};
pub use layout::OutputLayout;
pub use plan::{plan_jobs, ItemDefinition, JobPlan};
pub use validate::{CheckStatus, ConsistencyReport, ConsistencyValidator, ProducedItem, ValidationCheck};
