use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;
use crate::models::enums::*;

use super::TIMESTAMP_FORMAT;

pub fn insert_defect(conn: &Connection, defect: &DefectRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO defects (id, tenant_id, item_id, raw_comment, original_comment, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            defect.id.to_string(),
            defect.tenant_id,
            defect.item_id,
            defect.raw_comment,
            defect.original_comment,
            defect.status.as_str(),
            defect.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_defect(conn: &Connection, id: &Uuid) -> Result<Option<DefectRecord>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, tenant_id, item_id, raw_comment, original_comment, status, created_at
             FROM defects WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?;

    let Some((id, tenant_id, item_id, raw_comment, original_comment, status, created_at)) = row
    else {
        return Ok(None);
    };

    Ok(Some(DefectRecord {
        id: Uuid::parse_str(&id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        tenant_id,
        item_id,
        raw_comment,
        original_comment,
        status: DefectStatus::from_str(&status)?,
        created_at: NaiveDateTime::parse_from_str(&created_at, TIMESTAMP_FORMAT).unwrap_or_default(),
    }))
}

pub fn update_defect_status(
    conn: &Connection,
    id: &Uuid,
    status: DefectStatus,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE defects SET status = ?2 WHERE id = ?1",
        params![id.to_string(), status.as_str()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Defect".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Rewrite the canonical text of every open defect carrying `old`.
/// Cleared and closed defects keep their text. Returns the affected count.
pub fn rewrite_open_defects(
    conn: &Connection,
    tenant_id: &str,
    old: &str,
    new: &str,
) -> Result<usize, DatabaseError> {
    let rows = conn.execute(
        "UPDATE defects SET original_comment = ?3
         WHERE tenant_id = ?1 AND original_comment = ?2 AND status = 'open'",
        params![tenant_id, old, new],
    )?;
    Ok(rows)
}

pub fn count_open_defects_with_text(
    conn: &Connection,
    tenant_id: &str,
    text: &str,
) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM defects
         WHERE tenant_id = ?1 AND original_comment = ?2 AND status = 'open'",
        params![tenant_id, text],
        |row| row.get(0),
    )?;
    Ok(count)
}
