//! Bootstrap a tenant library with system phrases.
//!
//! Seed files are JSON arrays of `{category, item_scope?, description}`.
//! Seeded rows start at zero usage and are flagged `is_system`.

use std::path::Path;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::{self, with_write_transaction};
use crate::models::NewLibraryEntry;

use super::error::NormalizationError;
use super::similarity::clean_description;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPhrase {
    pub category: String,
    #[serde(default)]
    pub item_scope: Option<String>,
    pub description: String,
}

pub fn parse_seed_phrases(json: &str) -> Result<Vec<SeedPhrase>, NormalizationError> {
    let phrases: Vec<SeedPhrase> = serde_json::from_str(json)?;
    if let Some(bad) = phrases.iter().find(|p| p.category.trim().is_empty()) {
        return Err(NormalizationError::InvalidSeed(format!(
            "phrase '{}' has a blank category",
            bad.description
        )));
    }
    Ok(phrases)
}

pub fn load_seed_file(path: &Path) -> Result<Vec<SeedPhrase>, NormalizationError> {
    let raw = std::fs::read_to_string(path).map_err(|source| NormalizationError::SeedRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_seed_phrases(&raw)
}

/// Insert seed phrases for a tenant in one transaction.
///
/// Blank descriptions and phrases already present in their scope (active or
/// retired) are skipped. Returns the number of rows inserted.
pub fn seed_library(
    conn: &Connection,
    tenant_id: &str,
    phrases: &[SeedPhrase],
) -> Result<usize, NormalizationError> {
    let inserted = with_write_transaction(conn, |tx| {
        let mut inserted = 0;
        for phrase in phrases {
            if phrase.description.trim().is_empty() {
                continue;
            }
            let description = clean_description(&phrase.description);
            let created = db::insert_library_entry(tx, &NewLibraryEntry {
                tenant_id,
                category_name: phrase.category.trim(),
                item_scope: phrase.item_scope.as_deref(),
                description: &description,
                usage_count: 0,
                is_system: true,
            })?;
            if created.is_some() {
                inserted += 1;
            }
        }
        Ok::<_, NormalizationError>(inserted)
    })?;

    tracing::info!(
        tenant = tenant_id,
        inserted,
        skipped = phrases.len() - inserted,
        "Library seeded"
    );
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    const SEED: &str = r#"[
        {"category": "Wet Area", "item_scope": "item-x", "description": "Tap leaking"},
        {"category": "Wet Area", "description": "grout missing between tiles"},
        {"category": "Ceiling", "item_scope": null, "description": "Ceiling stain"}
    ]"#;

    #[test]
    fn parse_with_optional_scope() {
        let phrases = parse_seed_phrases(SEED).unwrap();
        assert_eq!(phrases.len(), 3);
        assert_eq!(phrases[0].item_scope.as_deref(), Some("item-x"));
        assert_eq!(phrases[1].item_scope, None);
        assert_eq!(phrases[2].item_scope, None);
    }

    #[test]
    fn blank_category_is_invalid() {
        let result = parse_seed_phrases(r#"[{"category": " ", "description": "Tap leaking"}]"#);
        assert!(matches!(result, Err(NormalizationError::InvalidSeed(_))));
    }

    #[test]
    fn malformed_seed_is_parse_error() {
        let result = parse_seed_phrases(r#"{"category": "x"}"#);
        assert!(matches!(result, Err(NormalizationError::SeedParse(_))));
    }

    #[test]
    fn seeding_inserts_system_rows_at_zero_usage() {
        let conn = open_memory_database().unwrap();
        let phrases = parse_seed_phrases(SEED).unwrap();

        assert_eq!(seed_library(&conn, "t1", &phrases).unwrap(), 3);

        let entries = db::list_active_entries(&conn, "t1").unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.is_system && e.usage_count == 0));
        assert!(entries.iter().any(|e| e.description == "Grout missing between tiles"));
    }

    #[test]
    fn reseeding_skips_existing_and_blank() {
        let conn = open_memory_database().unwrap();
        let mut phrases = parse_seed_phrases(SEED).unwrap();
        seed_library(&conn, "t1", &phrases).unwrap();

        phrases.push(SeedPhrase {
            category: "Wet Area".into(),
            item_scope: None,
            description: "   ".into(),
        });
        assert_eq!(seed_library(&conn, "t1", &phrases).unwrap(), 0);
        assert_eq!(seed_library(&conn, "t2", &phrases).unwrap(), 3);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, SEED).unwrap();

        assert_eq!(load_seed_file(&path).unwrap().len(), 3);
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_seed_file(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(NormalizationError::SeedRead { .. })));
    }
}
