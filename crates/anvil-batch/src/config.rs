//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `ANVIL_WORKERS`, `ANVIL_JOB_TIMEOUT_SECS`, `ANVIL_LOG`
//! 2. Project-local: `.anvil/config.toml`
//! 3. Global: `~/.anvil/config.toml`

use anvil_core::{AnvilError, LoggingConfig, Result};
use anvil_geo::EngineOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAX_DEFAULT_WORKERS: usize = 16;
const DEFAULT_JOB_TIMEOUT_SECS: u64 = 30;

/// `[batch]` section as written in a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSection {
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub job_timeout_secs: Option<u64>,
}

/// `[geometry]` section as written in a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeometrySection {
    #[serde(default)]
    pub halve_texture_size: Option<bool>,
    #[serde(default)]
    pub texture_root: Option<String>,
    #[serde(default)]
    pub fallback_namespace: Option<String>,
}

/// `[logging]` section as written in a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub json: Option<bool>,
}

/// Top-level config file structure. Every key is optional so a layer only
/// overrides what it names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnvilConfigFile {
    #[serde(default)]
    pub batch: BatchSection,
    #[serde(default)]
    pub geometry: GeometrySection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Resolved configuration with every layer applied
#[derive(Debug, Clone, PartialEq)]
pub struct AnvilConfig {
    pub workers: usize,
    pub job_timeout_secs: u64,
    pub halve_texture_size: bool,
    pub texture_root: String,
    pub fallback_namespace: String,
    pub logging: LoggingConfig,
}

impl Default for AnvilConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            job_timeout_secs: DEFAULT_JOB_TIMEOUT_SECS,
            halve_texture_size: false,
            texture_root: "textures/item".to_string(),
            fallback_namespace: "minecraft".to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Available parallelism, clamped to `1..=16`
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_DEFAULT_WORKERS)
}

impl AnvilConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = AnvilConfig::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config.merge(Self::load_file(&global_path)?);
            }
        }

        let local_path = PathBuf::from(".anvil/config.toml");
        if local_path.exists() {
            config.merge(Self::load_file(&local_path)?);
        }

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        tracing::debug!(
            workers = config.workers,
            timeout_secs = config.job_timeout_secs,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load config from a specific file path only (defaults underneath, env on top)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = AnvilConfig::default();
        config.merge(Self::load_file(path)?);
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Per-job wall-clock limit
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    /// Options handed to every conversion
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            halve_texture_size: self.halve_texture_size,
            texture_root: self.texture_root.clone(),
        }
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".anvil").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<AnvilConfigFile> {
        let content = std::fs::read_to_string(path)?;
        let file: AnvilConfigFile = toml::from_str(&content).map_err(|e| {
            AnvilError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })?;
        Ok(file)
    }

    fn merge(&mut self, overlay: AnvilConfigFile) {
        if let Some(workers) = overlay.batch.workers {
            self.workers = workers.max(1);
        }
        if let Some(secs) = overlay.batch.job_timeout_secs {
            self.job_timeout_secs = secs;
        }
        if let Some(halve) = overlay.geometry.halve_texture_size {
            self.halve_texture_size = halve;
        }
        if let Some(root) = overlay.geometry.texture_root {
            self.texture_root = root;
        }
        if let Some(namespace) = overlay.geometry.fallback_namespace {
            self.fallback_namespace = namespace;
        }
        if let Some(level) = overlay.logging.level {
            self.logging.level = level;
        }
        if let Some(json) = overlay.logging.json {
            self.logging.json = json;
        }
    }

    fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("ANVIL_WORKERS") {
            let workers: usize = raw.trim().parse().map_err(|_| {
                AnvilError::Config(format!("ANVIL_WORKERS is not a number: {}", raw))
            })?;
            self.workers = workers.max(1);
        }
        if let Some(raw) = lookup("ANVIL_JOB_TIMEOUT_SECS") {
            self.job_timeout_secs = raw.trim().parse().map_err(|_| {
                AnvilError::Config(format!("ANVIL_JOB_TIMEOUT_SECS is not a number: {}", raw))
            })?;
        }
        if let Some(level) = lookup("ANVIL_LOG") {
            self.logging.level = level;
        }
        Ok(())
    }
}
