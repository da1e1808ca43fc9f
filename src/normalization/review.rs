//! Read-only console views that flag library phrases needing attention.

use regex::Regex;
use rusqlite::Connection;

use crate::config::EngineConfig;
use crate::db;
use crate::models::LibraryEntry;

use super::error::NormalizationError;

/// Compiled vague-keyword matcher. Word-boundary, case-insensitive.
#[derive(Debug, Clone)]
pub struct VaguePatterns {
    regex: Option<Regex>,
}

impl VaguePatterns {
    pub fn new(keywords: &[String]) -> Result<Self, NormalizationError> {
        let alternatives: Vec<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { regex: None });
        }

        let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
        Ok(Self {
            regex: Some(Regex::new(&pattern)?),
        })
    }

    pub fn is_vague(&self, description: &str) -> bool {
        self.regex
            .as_ref()
            .is_some_and(|re| re.is_match(description))
    }
}

/// Active phrases used exactly once. Usually typos or one-off wording.
pub fn singleton_descriptions(
    conn: &Connection,
    tenant_id: &str,
) -> Result<Vec<LibraryEntry>, NormalizationError> {
    Ok(db::list_active_entries(conn, tenant_id)?
        .into_iter()
        .filter(|e| e.usage_count == 1)
        .collect())
}

/// Active phrases longer than `max_chars` characters.
pub fn overlong_descriptions(
    conn: &Connection,
    tenant_id: &str,
    max_chars: usize,
) -> Result<Vec<LibraryEntry>, NormalizationError> {
    Ok(db::list_active_entries(conn, tenant_id)?
        .into_iter()
        .filter(|e| e.description.chars().count() > max_chars)
        .collect())
}

/// Active phrases containing one of the configured vague keywords.
pub fn vague_descriptions(
    conn: &Connection,
    tenant_id: &str,
    config: &EngineConfig,
) -> Result<Vec<LibraryEntry>, NormalizationError> {
    let patterns = VaguePatterns::new(&config.vague_keywords)?;
    let flagged: Vec<LibraryEntry> = db::list_active_entries(conn, tenant_id)?
        .into_iter()
        .filter(|e| patterns.is_vague(&e.description))
        .collect();

    tracing::debug!(tenant = tenant_id, flagged = flagged.len(), "Vague descriptions scanned");
    Ok(flagged)
}
