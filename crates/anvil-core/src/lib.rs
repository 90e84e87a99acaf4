//! Anvil Core - Foundational types for the Anvil model converter
//!
//! This crate provides the types every other Anvil crate depends on:
//! - `AnvilError` / `Result` - the conversion error taxonomy
//! - `FailureKind` - classification carried by per-job failure records
//! - `ContentHash` - SHA-256 fingerprints of written artifacts
//! - `logging` - tracing subscriber setup

mod error;
mod hash;
pub mod logging;

pub use error::{AnvilError, FailureKind, Result};
pub use hash::ContentHash;
pub use logging::{init_logging, LoggingConfig};
