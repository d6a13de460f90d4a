//! Configuration for dumptext

mod logging;

pub use logging::{LogFormat, LogLevel, LoggingConfig};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for a corpus run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Extraction configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Runtime configuration
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Extraction pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Minimum size in bytes, applied to the rendered markup and again to
    /// the cleaned text.
    #[serde(default = "default_min_size")]
    pub min_size: usize,
    /// Language code of the dump; selects section titles and link filters.
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_min_size() -> usize {
    1024
}

fn default_language() -> String {
    "ar".to_string()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_size: default_min_size(),
            language: default_language(),
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Worker count; 0 means one per available core.
    #[serde(default)]
    pub workers: usize,
    /// Bound on the record queue between the reader and the workers.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

fn default_queue_depth() -> usize {
    256
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            queue_depth: default_queue_depth(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together so the user
    /// can fix everything in one pass.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.extraction.min_size == 0 {
            errors.push("min_size must be positive".to_string());
        }
        if self.extraction.language.is_empty() {
            errors.push("language must not be empty".to_string());
        }

        if self.runtime.queue_depth == 0 {
            errors.push("queue_depth must be positive".to_string());
        }
        if self.runtime.workers > 1024 {
            errors.push("workers must be <= 1024".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}
