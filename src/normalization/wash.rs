//! Wash: map a raw inspector description to its canonical library phrase.
//!
//! Three tiers, first hit wins:
//! 1. entries scoped to the same inspection item
//! 2. category-wide fallback entries for the item's category
//! 3. mint a new item-scoped entry from the cleaned raw text
//!
//! Output is idempotent for an unchanged library; usage counts are not.

use rusqlite::Connection;

use crate::config::EngineConfig;
use crate::db::{self, with_write_transaction};
use crate::models::{LibraryEntry, NewLibraryEntry};
use crate::models::enums::EntryStatus;

use super::error::NormalizationError;
use super::similarity::{clean_description, normalize_for_match, BlockRatio};
use super::traits::{CategoryResolver, SimilarityMeasure};
use super::types::{WashOutcome, WashTier};

pub struct WashEngine {
    config: EngineConfig,
    similarity: Box<dyn SimilarityMeasure>,
    categories: Box<dyn CategoryResolver>,
}

impl WashEngine {
    /// Engine using the default block-ratio similarity.
    pub fn new(config: EngineConfig, categories: impl CategoryResolver + 'static) -> Self {
        Self {
            config,
            similarity: Box::new(BlockRatio),
            categories: Box::new(categories),
        }
    }

    pub fn with_similarity(mut self, similarity: impl SimilarityMeasure + 'static) -> Self {
        self.similarity = Box::new(similarity);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn similarity(&self) -> &dyn SimilarityMeasure {
        self.similarity.as_ref()
    }

    /// Category for an item, or the configured unknown bucket.
    pub fn resolve_category(&self, tenant_id: &str, item_scope: Option<&str>) -> String {
        let resolved = item_scope.and_then(|item| self.categories.category_for(tenant_id, item));
        match resolved {
            Some(category) => category,
            None => {
                tracing::warn!(
                    tenant = tenant_id,
                    item_scope = item_scope.unwrap_or("-"),
                    fallback = %self.config.unknown_category,
                    "Item category unresolved, using fallback bucket"
                );
                self.config.unknown_category.clone()
            }
        }
    }

    /// Canonical text for `raw_text`. Blank input comes back unchanged.
    pub fn wash(
        &self,
        conn: &Connection,
        tenant_id: &str,
        item_scope: Option<&str>,
        raw_text: &str,
    ) -> Result<String, NormalizationError> {
        Ok(self.wash_detailed(conn, tenant_id, item_scope, raw_text)?.canonical)
    }

    /// Like [`wash`](Self::wash) but reports the tier, entry and score.
    pub fn wash_detailed(
        &self,
        conn: &Connection,
        tenant_id: &str,
        item_scope: Option<&str>,
        raw_text: &str,
    ) -> Result<WashOutcome, NormalizationError> {
        if raw_text.trim().is_empty() {
            return Ok(WashOutcome {
                canonical: raw_text.to_string(),
                tier: WashTier::Blank,
                entry_id: None,
                score: None,
                category: String::new(),
            });
        }

        let category = self.resolve_category(tenant_id, item_scope);
        let outcome = with_write_transaction(conn, |tx| {
            self.wash_in(tx, tenant_id, item_scope, &category, raw_text)
        })?;

        tracing::debug!(
            tenant = tenant_id,
            tier = outcome.tier.as_str(),
            score = outcome.score.unwrap_or(0.0),
            canonical = %outcome.canonical,
            "Description washed"
        );
        Ok(outcome)
    }

    fn wash_in(
        &self,
        conn: &Connection,
        tenant_id: &str,
        item_scope: Option<&str>,
        category: &str,
        raw_text: &str,
    ) -> Result<WashOutcome, NormalizationError> {
        let needle = normalize_for_match(raw_text);

        if let Some(item) = item_scope {
            let candidates = db::lookup_item_entries(conn, tenant_id, item)?;
            if let Some((entry, score)) = self.accept(&needle, &candidates) {
                db::increment_usage(conn, &entry.id)?;
                return Ok(matched(entry, score, WashTier::ItemMatch, category));
            }
        }

        let fallback = db::lookup_category_fallback(conn, tenant_id, category)?;
        if let Some((entry, score)) = self.accept(&needle, &fallback) {
            db::increment_usage(conn, &entry.id)?;
            return Ok(matched(entry, score, WashTier::CategoryMatch, category));
        }

        let cleaned = clean_description(raw_text);
        let entry = insert_or_reuse(conn, tenant_id, category, item_scope, &cleaned)?;
        Ok(WashOutcome {
            canonical: entry.description,
            tier: WashTier::NewEntry,
            entry_id: Some(entry.id),
            score: None,
            category: category.to_string(),
        })
    }

    /// Best candidate if it reaches the wash threshold (inclusive).
    fn accept<'a>(&self, needle: &str, candidates: &'a [LibraryEntry]) -> Option<(&'a LibraryEntry, f64)> {
        let (entry, score) = best_match(self.similarity.as_ref(), needle, candidates)?;
        if score >= self.config.wash_threshold {
            Some((entry, score))
        } else {
            tracing::debug!(
                best = %entry.description,
                score,
                threshold = self.config.wash_threshold,
                "Best candidate below wash threshold"
            );
            None
        }
    }
}

/// Highest-scoring candidate. On ties the earlier candidate (higher usage)
/// wins.
pub fn best_match<'a>(
    similarity: &dyn SimilarityMeasure,
    needle: &str,
    candidates: &'a [LibraryEntry],
) -> Option<(&'a LibraryEntry, f64)> {
    let mut best: Option<(&LibraryEntry, f64)> = None;
    for candidate in candidates {
        let score = similarity.similarity(needle, &normalize_for_match(&candidate.description));
        let better = match best {
            Some((_, top)) => score > top,
            None => true,
        };
        if better {
            best = Some((candidate, score));
        }
    }
    best
}

fn matched(entry: &LibraryEntry, score: f64, tier: WashTier, category: &str) -> WashOutcome {
    WashOutcome {
        canonical: entry.description.clone(),
        tier,
        entry_id: Some(entry.id),
        score: Some(score),
        category: category.to_string(),
    }
}

/// Insert a fresh entry with usage 1, or fall back to the row already
/// holding the phrase in that scope (reactivating it when retired).
fn insert_or_reuse(
    conn: &Connection,
    tenant_id: &str,
    category: &str,
    item_scope: Option<&str>,
    description: &str,
) -> Result<LibraryEntry, NormalizationError> {
    let new_entry = NewLibraryEntry {
        tenant_id,
        category_name: category,
        item_scope,
        description,
        usage_count: 1,
        is_system: false,
    };
    if let Some(entry) = db::insert_library_entry(conn, &new_entry)? {
        return Ok(entry);
    }

    let existing = db::find_scoped_entry(conn, tenant_id, category, item_scope, description)?
        .ok_or_else(|| db::DatabaseError::NotFound {
            entity_type: "LibraryEntry".into(),
            id: format!("{tenant_id}/{}/{description}", item_scope.unwrap_or(category)),
        })?;

    match existing.status {
        EntryStatus::Retired => {
            db::reactivate_entry(conn, &existing.id, 1)?;
            tracing::info!(entry_id = %existing.id, "Retired library entry reactivated by wash");
        }
        EntryStatus::Active => db::increment_usage(conn, &existing.id)?,
    }
    Ok(existing)
}
