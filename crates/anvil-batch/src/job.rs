//! Conversion job records and the batch report

use anvil_core::{AnvilError, ContentHash, FailureKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One model to convert into one geometry and one render-binding artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionJob {
    /// Unique item identifier, used for both output file names
    pub output_name: String,
    /// Resolved source model path
    pub source: PathBuf,
    /// Texture reference bound by the render-binding
    pub texture_key: String,
}

impl ConversionJob {
    pub fn new(
        output_name: impl Into<String>,
        source: impl Into<PathBuf>,
        texture_key: impl Into<String>,
    ) -> Self {
        Self {
            output_name: output_name.into(),
            source: source.into(),
            texture_key: texture_key.into(),
        }
    }

    /// Checks that need no worker: source exists, names are non-empty
    pub fn prevalidate(&self) -> Result<(), AnvilError> {
        if self.output_name.trim().is_empty() {
            return Err(AnvilError::Validation("Output name is empty".into()));
        }
        if self.output_name.trim() != self.output_name {
            return Err(AnvilError::Validation(format!(
                "Output name {:?} has surrounding whitespace",
                self.output_name
            )));
        }
        if self.texture_key.trim().is_empty() {
            return Err(AnvilError::Validation("Texture key is empty".into()));
        }
        if !self.source.is_file() {
            return Err(AnvilError::Resolution(format!(
                "Source model not found: {}",
                self.source.display()
            )));
        }
        Ok(())
    }
}

/// Files written by one job, with fingerprints of their bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobArtifacts {
    pub geometry_path: PathBuf,
    pub geometry_hash: ContentHash,
    pub render_controller_path: PathBuf,
    pub render_controller_hash: ContentHash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSuccess {
    pub output_name: String,
    pub source: PathBuf,
    pub artifacts: JobArtifacts,
}

/// Structured record of a job that produced nothing usable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub source: PathBuf,
    pub output_name: String,
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(job: &ConversionJob, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            source: job.source.clone(),
            output_name: job.output_name.clone(),
            kind,
            message: message.into(),
        }
    }

    pub fn from_error(job: &ConversionJob, err: &AnvilError) -> Self {
        Self::new(job, err.kind(), err.to_string())
    }
}

/// Result of one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded(JobSuccess),
    Failed(JobFailure),
}

/// Everything a batch run produced, in submission order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: Vec<JobSuccess>,
    pub failures: Vec<JobFailure>,
}

impl BatchReport {
    /// Assemble a report from `(submission index, outcome)` pairs in any order
    pub fn from_outcomes(attempted: usize, mut outcomes: Vec<(usize, JobOutcome)>) -> Self {
        outcomes.sort_by_key(|(seq, _)| *seq);

        let mut report = BatchReport {
            attempted,
            ..Default::default()
        };
        for (_, outcome) in outcomes {
            match outcome {
                JobOutcome::Succeeded(success) => report.succeeded.push(success),
                JobOutcome::Failed(failure) => report.failures.push(failure),
            }
        }
        report
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// Failures of one kind
    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &JobFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn log_summary(&self) {
        for failure in &self.failures {
            tracing::warn!(
                output = %failure.output_name,
                source = %failure.source.display(),
                kind = %failure.kind,
                "{}",
                failure.message
            );
        }
        tracing::info!(
            attempted = self.attempted,
            succeeded = self.succeeded.len(),
            failed = self.failures.len(),
            "Batch finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(name: &str, kind: FailureKind) -> JobOutcome {
        JobOutcome::Failed(JobFailure {
            source: PathBuf::from(format!("{}.json", name)),
            output_name: name.to_string(),
            kind,
            message: String::new(),
        })
    }

    #[test]
    fn test_report_sorted_by_submission() {
        let outcomes = vec![
            (2, failure("c", FailureKind::Parse)),
            (0, failure("a", FailureKind::Timeout)),
            (1, failure("b", FailureKind::Parse)),
        ];
        let report = BatchReport::from_outcomes(3, outcomes);
        let names: Vec<_> = report.failures.iter().map(|f| f.output_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(report.failures_of(FailureKind::Parse).count(), 2);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_prevalidate() {
        let missing = ConversionJob::new("x", "/definitely/not/here.json", "tex");
        assert_eq!(
            missing.prevalidate().unwrap_err().kind(),
            FailureKind::Resolution
        );

        let unnamed = ConversionJob::new(" ", "/definitely/not/here.json", "tex");
        assert_eq!(unnamed.prevalidate().unwrap_err().kind(), FailureKind::Rejected);

        let padded = ConversionJob::new(" sword_cmd1", "/definitely/not/here.json", "tex");
        let err = padded.prevalidate().unwrap_err();
        assert_eq!(err.kind(), FailureKind::Rejected);
        assert!(err.to_string().contains("whitespace"));

        let untextured = ConversionJob::new("x", "/definitely/not/here.json", "");
        assert_eq!(
            untextured.prevalidate().unwrap_err().kind(),
            FailureKind::Rejected
        );
    }

    #[test]
    fn test_failure_serializes_kind_lowercase() {
        let job = ConversionJob::new("sword_cmd1", "sword.json", "tex");
        let failure = JobFailure::from_error(&job, &AnvilError::Parse("bad".into()));
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"], "parse");
        assert_eq!(json["output_name"], "sword_cmd1");
    }
}
