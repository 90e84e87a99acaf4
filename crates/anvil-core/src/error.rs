//! Error types for Anvil

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The main error type for Anvil operations
#[derive(Debug, Error)]
pub enum AnvilError {
    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Transform error: {0}")]
    Transform(String),

    #[error("Job timed out after {:.1}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("Write error: {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Scheduling error: {0}")]
    Scheduling(String),
}

/// Result type alias for Anvil operations
pub type Result<T> = std::result::Result<T, AnvilError>;

impl AnvilError {
    /// Build a write error for the artifact at `path`
    pub fn write(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::Write {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Classify this error for a job failure record
    pub fn kind(&self) -> FailureKind {
        match self {
            AnvilError::Resolution(_) => FailureKind::Resolution,
            AnvilError::Parse(_) => FailureKind::Parse,
            AnvilError::Transform(_) => FailureKind::Transform,
            AnvilError::Timeout(_) => FailureKind::Timeout,
            AnvilError::Write { .. } | AnvilError::Io(_) => FailureKind::Write,
            AnvilError::Config(_) | AnvilError::Validation(_) => FailureKind::Rejected,
            AnvilError::Scheduling(_) => FailureKind::Scheduling,
        }
    }
}

impl From<serde_json::Error> for AnvilError {
    fn from(err: serde_json::Error) -> Self {
        AnvilError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for AnvilError {
    fn from(err: toml::de::Error) -> Self {
        AnvilError::Config(err.to_string())
    }
}

/// Why a single job did not produce its artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Malformed job turned away before it reached a worker
    Rejected,
    Resolution,
    Parse,
    Transform,
    Timeout,
    Write,
    /// The job panicked inside its worker
    Panic,
    Scheduling,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Rejected => "rejected",
            FailureKind::Resolution => "resolution",
            FailureKind::Parse => "parse",
            FailureKind::Transform => "transform",
            FailureKind::Timeout => "timeout",
            FailureKind::Write => "write",
            FailureKind::Panic => "panic",
            FailureKind::Scheduling => "scheduling",
        };
        f.write_str(s)
    }
}
