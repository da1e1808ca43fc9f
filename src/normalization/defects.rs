//! Inspection submission: wash the inspector's text and record the defect.

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{self, with_write_transaction};
use crate::models::DefectRecord;
use crate::models::enums::DefectStatus;

use super::error::NormalizationError;
use super::wash::WashEngine;

/// Wash `raw_comment` and store an open defect carrying both texts.
///
/// The wash and the insert share one transaction, so a failed insert leaves
/// no library usage behind.
pub fn raise_defect(
    conn: &Connection,
    engine: &WashEngine,
    tenant_id: &str,
    item_id: Option<&str>,
    raw_comment: &str,
) -> Result<DefectRecord, NormalizationError> {
    let defect = with_write_transaction(conn, |tx| {
        let canonical = engine.wash(tx, tenant_id, item_id, raw_comment)?;
        let defect = DefectRecord {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            item_id: item_id.map(str::to_string),
            raw_comment: raw_comment.to_string(),
            original_comment: canonical,
            status: DefectStatus::Open,
            created_at: db::now_timestamp(),
        };
        db::insert_defect(tx, &defect)?;
        Ok::<_, NormalizationError>(defect)
    })?;

    tracing::info!(
        defect_id = %defect.id,
        tenant = tenant_id,
        item = item_id.unwrap_or("-"),
        "Defect raised"
    );
    Ok(defect)
}

/// Move a defect between open, cleared and closed.
pub fn set_defect_status(
    conn: &Connection,
    id: &Uuid,
    status: DefectStatus,
) -> Result<(), NormalizationError> {
    db::update_defect_status(conn, id, status)?;
    tracing::info!(defect_id = %id, status = status.as_str(), "Defect status updated");
    Ok(())
}

pub fn get_defect(conn: &Connection, id: &Uuid) -> Result<Option<DefectRecord>, NormalizationError> {
    Ok(db::get_defect(conn, id)?)
}

/// Open defects whose canonical text is exactly `text`.
pub fn count_open_with_text(
    conn: &Connection,
    tenant_id: &str,
    text: &str,
) -> Result<i64, NormalizationError> {
    Ok(db::count_open_defects_with_text(conn, tenant_id, text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::db::sqlite::open_memory_database;
    use crate::db::DatabaseError;
    use crate::normalization::category::CategoryMap;
    use crate::normalization::merge::merge_descriptions;
    use crate::normalization::test_support::seed_entry;

    fn engine() -> WashEngine {
        WashEngine::new(
            EngineConfig::default(),
            CategoryMap::new().with("t1", "item-x", "Wet Area"),
        )
    }

    #[test]
    fn raised_defect_keeps_raw_text_and_canonical() {
        let conn = open_memory_database().unwrap();
        seed_entry(&conn, "Wet Area", Some("item-x"), "Tap leaking", 3);

        let defect = raise_defect(&conn, &engine(), "t1", Some("item-x"), "tap leaking.").unwrap();
        assert_eq!(defect.raw_comment, "tap leaking.");
        assert_eq!(defect.original_comment, "Tap leaking");
        assert_eq!(defect.status, DefectStatus::Open);

        let stored = get_defect(&conn, &defect.id).unwrap().unwrap();
        assert_eq!(stored.raw_comment, "tap leaking.");
        assert_eq!(stored.original_comment, "Tap leaking");
        assert_eq!(count_open_with_text(&conn, "t1", "Tap leaking").unwrap(), 1);
    }

    #[test]
    fn merge_rewrites_canonical_but_not_raw() {
        let conn = open_memory_database().unwrap();
        let engine = engine();
        let defect = raise_defect(&conn, &engine, "t1", Some("item-x"), "Tap leeking badly").unwrap();
        seed_entry(&conn, "Wet Area", Some("item-z"), "Tap leaking", 5);

        merge_descriptions(
            &conn,
            "t1",
            &EngineConfig::default(),
            "Tap leeking badly",
            "Tap leaking",
        )
        .unwrap();

        let stored = get_defect(&conn, &defect.id).unwrap().unwrap();
        assert_eq!(stored.raw_comment, "Tap leeking badly");
        assert_eq!(stored.original_comment, "Tap leaking");
    }

    #[test]
    fn closed_defect_is_not_counted_as_open() {
        let conn = open_memory_database().unwrap();
        let defect = raise_defect(&conn, &engine(), "t1", Some("item-x"), "Basin chipped").unwrap();

        set_defect_status(&conn, &defect.id, DefectStatus::Closed).unwrap();

        assert_eq!(count_open_with_text(&conn, "t1", "Basin chipped").unwrap(), 0);
        let stored = get_defect(&conn, &defect.id).unwrap().unwrap();
        assert_eq!(stored.status, DefectStatus::Closed);
    }

    #[test]
    fn unknown_defect_status_update_is_not_found() {
        let conn = open_memory_database().unwrap();
        let result = set_defect_status(&conn, &Uuid::new_v4(), DefectStatus::Cleared);
        assert!(matches!(
            result,
            Err(NormalizationError::Database(DatabaseError::NotFound { .. }))
        ));
    }

    #[test]
    fn failed_insert_rolls_back_wash_usage() {
        let conn = open_memory_database().unwrap();
        let entry = seed_entry(&conn, "Wet Area", Some("item-x"), "Tap leaking", 3);
        conn.execute_batch(
            "CREATE TRIGGER block_defects BEFORE INSERT ON defects
             BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
        )
        .unwrap();

        let result = raise_defect(&conn, &engine(), "t1", Some("item-x"), "Tap leaking");
        assert!(result.is_err());

        let stored = db::get_library_entry(&conn, &entry).unwrap().unwrap();
        assert_eq!(stored.usage_count, 3);
    }
}
