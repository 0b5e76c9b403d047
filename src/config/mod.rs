//! Project-level configuration support
//!
//! Loads scoring overrides from an `ecoscan.toml` next to the analyzed code.
//! Everything is optional; a missing file means defaults, and a malformed
//! file logs a warning and falls back to defaults.
//!
//! # Configuration Format
//!
//! ```toml
//! # ecoscan.toml
//!
//! [scoring]
//! alpha = 0.6
//! beta = 0.6
//! gamma = 0.2
//! scaling_constant = 100.0
//! depth_sensitivity = 0.3
//! cc_threshold = 10
//! use_severity = true
//!
//! [weights]
//! nested_loops = 8
//! recursion = 7
//! ```

use crate::models::IssueCategory;
use crate::rules::WeightTable;
use crate::scoring::EngineConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Config file name looked up at the analyzed root
pub const CONFIG_FILE: &str = "ecoscan.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Deserialized `ecoscan.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub scoring: ScoringOverrides,
    /// Category name → weight; unknown names are warned about and skipped
    #[serde(default)]
    pub weights: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringOverrides {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
    pub scaling_constant: Option<f64>,
    pub depth_sensitivity: Option<f64>,
    pub cc_threshold: Option<u32>,
    pub use_severity: Option<bool>,
}

impl FileConfig {
    /// Parse a TOML string
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply the overrides on top of the default engine configuration
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        let s = &self.scoring;

        if let Some(alpha) = s.alpha {
            config.alpha = alpha;
        }
        if let Some(beta) = s.beta {
            config.beta = beta;
        }
        if let Some(gamma) = s.gamma {
            config.gamma = gamma;
        }
        if let Some(scaling) = s.scaling_constant {
            config.scaling_constant = scaling;
        }
        if let Some(k) = s.depth_sensitivity {
            config.depth_sensitivity = k;
        }
        if let Some(threshold) = s.cc_threshold {
            config.cc_threshold = threshold;
        }
        if let Some(use_severity) = s.use_severity {
            config.use_severity = use_severity;
        }

        let mut weights = WeightTable::default();
        for (name, weight) in &self.weights {
            match name.parse::<IssueCategory>() {
                Ok(category) => weights = weights.with_weight(category, *weight),
                Err(_) => warn!("ignoring weight for unknown category '{name}'"),
            }
        }
        config.weights = weights;

        config
    }
}

/// Load the config file from `root`, if it exists
pub fn load(root: &Path) -> Result<Option<FileConfig>, ConfigError> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path)?;
    let config = FileConfig::from_toml(&raw)?;
    debug!("loaded config from {}", path.display());
    Ok(Some(config))
}

/// Load the config file, warning and falling back to defaults on any problem
pub fn load_or_default(root: &Path) -> FileConfig {
    match load(root) {
        Ok(Some(config)) => config,
        Ok(None) => FileConfig::default(),
        Err(err) => {
            warn!("{err}; using default configuration");
            FileConfig::default()
        }
    }
}
