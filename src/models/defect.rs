use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::DefectStatus;

/// A defect raised during an inspection.
///
/// `raw_comment` is the inspector's verbatim text and never changes.
/// `original_comment` holds the canonical text used for aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectRecord {
    pub id: Uuid,
    pub tenant_id: String,
    pub item_id: Option<String>,
    pub raw_comment: String,
    pub original_comment: String,
    pub status: DefectStatus,
    pub created_at: NaiveDateTime,
}
