//! Shared fixtures for engine tests.

use std::collections::HashMap;

use rusqlite::Connection;
use uuid::Uuid;

use crate::db;
use crate::models::{DefectRecord, NewLibraryEntry};
use crate::models::enums::DefectStatus;

use super::traits::SimilarityMeasure;

/// Similarity table for boundary tests. Unlisted pairs score 1.0 when equal,
/// 0.0 otherwise.
#[derive(Default)]
pub struct FixedScores {
    scores: HashMap<(String, String), f64>,
}

impl FixedScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, a: &str, b: &str, score: f64) -> Self {
        self.scores.insert((a.to_string(), b.to_string()), score);
        self.scores.insert((b.to_string(), a.to_string()), score);
        self
    }
}

impl SimilarityMeasure for FixedScores {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        if let Some(score) = self.scores.get(&(a.to_string(), b.to_string())) {
            return *score;
        }
        if a == b { 1.0 } else { 0.0 }
    }
}

/// Insert an active entry for tenant `t1`.
pub fn seed_entry(
    conn: &Connection,
    category: &str,
    item_scope: Option<&str>,
    description: &str,
    usage: i64,
) -> Uuid {
    db::insert_library_entry(conn, &NewLibraryEntry {
        tenant_id: "t1",
        category_name: category,
        item_scope,
        description,
        usage_count: usage,
        is_system: false,
    })
    .unwrap()
    .unwrap()
    .id
}

/// Insert `count` defects for tenant `t1` carrying `text` with `status`.
pub fn seed_defects(conn: &Connection, text: &str, status: DefectStatus, count: usize) -> Vec<Uuid> {
    (0..count)
        .map(|_| {
            let id = Uuid::new_v4();
            db::insert_defect(conn, &DefectRecord {
                id,
                tenant_id: "t1".into(),
                item_id: Some("item-x".into()),
                raw_comment: text.to_lowercase(),
                original_comment: text.into(),
                status,
                created_at: db::now_timestamp(),
            })
            .unwrap();
            id
        })
        .collect()
}

pub fn usage_of(conn: &Connection, id: &Uuid) -> i64 {
    db::get_library_entry(conn, id).unwrap().unwrap().usage_count
}
