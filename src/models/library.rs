use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::EntryStatus;

/// A canonical defect phrase stored in the library.
///
/// `item_scope == None` marks a category-wide fallback entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub id: Uuid,
    pub tenant_id: String,
    pub category_name: String,
    pub item_scope: Option<String>,
    pub description: String,
    pub usage_count: i64,
    pub is_system: bool,
    pub status: EntryStatus,
    pub created_at: NaiveDateTime,
}

impl LibraryEntry {
    pub fn is_category_wide(&self) -> bool {
        self.item_scope.is_none()
    }
}

/// Fields needed to create a library entry.
#[derive(Debug, Clone)]
pub struct NewLibraryEntry<'a> {
    pub tenant_id: &'a str,
    pub category_name: &'a str,
    pub item_scope: Option<&'a str>,
    pub description: &'a str,
    pub usage_count: i64,
    pub is_system: bool,
}

/// Aggregated usage of one canonical phrase within a category.
/// Input row for clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseUsage {
    pub text: String,
    pub usage_count: i64,
    pub category: String,
}
