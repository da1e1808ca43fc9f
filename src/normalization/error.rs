//! Engine-level error type.
//!
//! Soft failures (identical merge pair, nothing to rewrite) are not errors;
//! they come back as `RewriteOutcome` values.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum NormalizationError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read seed file {path}: {source}")]
    SeedRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Seed parsing error: {0}")]
    SeedParse(#[from] serde_json::Error),

    #[error("Invalid seed phrase: {0}")]
    InvalidSeed(String),

    #[error("Keyword pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl From<rusqlite::Error> for NormalizationError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(DatabaseError::Sqlite(e))
    }
}
