use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "defect-normalizer";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Category bucket used when an item cannot be mapped to a template category.
pub const UNKNOWN_CATEGORY: &str = "UNKNOWN";

/// Default `tracing` filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "defect_normalizer=info"
}

/// Directory holding the library database, under the platform data dir.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_NAME))
}

/// Default location of the SQLite database file.
pub fn default_database_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join("defect_library.db"))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tuning knobs for washing, clustering and the review views.
///
/// Thresholds are inclusive and were tuned against the block-ratio similarity
/// measure. They need re-tuning if the measure changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum similarity for a raw description to reuse a library phrase.
    pub wash_threshold: f64,
    /// Minimum similarity for two canonical phrases to share a cluster edge.
    /// Stricter than `wash_threshold`: clusters feed bulk rewrites.
    pub cluster_threshold: f64,
    /// Category used when the item template lookup fails.
    pub unknown_category: String,
    /// Descriptions longer than this (in chars) show up in the over-length view.
    pub max_description_chars: usize,
    /// Phrases that mark a description as too vague to be useful.
    pub vague_keywords: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            wash_threshold: 0.70,
            cluster_threshold: 0.80,
            unknown_category: UNKNOWN_CATEGORY.to_string(),
            max_description_chars: 100,
            vague_keywords: default_vague_keywords(),
        }
    }
}

fn default_vague_keywords() -> Vec<String> {
    [
        "see photo",
        "refer photo",
        "as per photo",
        "refer to photo",
        "issue",
        "problem",
        "defective",
        "not ok",
        "not good",
        "to check",
        "others",
        "misc",
        "etc",
        "n/a",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl EngineConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            wash_threshold = config.wash_threshold,
            cluster_threshold = config.cluster_threshold,
            "Engine config loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("wash_threshold", self.wash_threshold),
            ("cluster_threshold", self.cluster_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{value} is outside [0, 1]"),
                });
            }
        }
        if self.max_description_chars == 0 {
            return Err(ConfigError::Invalid {
                field: "max_description_chars",
                reason: "must be greater than zero".into(),
            });
        }
        if self.unknown_category.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "unknown_category",
                reason: "must not be blank".into(),
            });
        }
        Ok(())
    }
}
