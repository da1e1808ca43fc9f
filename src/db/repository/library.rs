use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;
use crate::models::enums::*;

use super::{now_timestamp, TIMESTAMP_FORMAT};

const ENTRY_COLUMNS: &str = "id, tenant_id, category_name, item_scope, description, usage_count,
     is_system, status, created_at";

// Deterministic ranking: most used first, then oldest, then id
const ENTRY_ORDER: &str = "ORDER BY usage_count DESC, created_at ASC, id ASC";

/// Insert a library entry unless the same phrase already exists in its scope.
///
/// Returns `None` when a unique index rejected the row, which happens when a
/// concurrent writer (or an earlier retirement) already holds the phrase.
pub fn insert_library_entry(
    conn: &Connection,
    entry: &NewLibraryEntry<'_>,
) -> Result<Option<LibraryEntry>, DatabaseError> {
    let id = Uuid::new_v4();
    let created_at = now_timestamp();

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO library_entries
         (id, tenant_id, category_name, item_scope, description, usage_count, is_system, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'active', ?8)",
        params![
            id.to_string(),
            entry.tenant_id,
            entry.category_name,
            entry.item_scope,
            entry.description,
            entry.usage_count,
            entry.is_system as i32,
            created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;

    if inserted == 0 {
        return Ok(None);
    }

    tracing::info!(
        entry_id = %id,
        tenant = entry.tenant_id,
        category = entry.category_name,
        item_scope = entry.item_scope.unwrap_or("-"),
        "Library entry created"
    );

    Ok(Some(LibraryEntry {
        id,
        tenant_id: entry.tenant_id.to_string(),
        category_name: entry.category_name.to_string(),
        item_scope: entry.item_scope.map(str::to_string),
        description: entry.description.to_string(),
        usage_count: entry.usage_count,
        is_system: entry.is_system,
        status: EntryStatus::Active,
        created_at,
    }))
}

pub fn get_library_entry(conn: &Connection, id: &Uuid) -> Result<Option<LibraryEntry>, DatabaseError> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM library_entries WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id.to_string()], entry_row_from_rusqlite)
        .optional()?;
    row.map(entry_from_row).transpose()
}

/// Active entries scoped to one inspection item, most used first.
pub fn lookup_item_entries(
    conn: &Connection,
    tenant_id: &str,
    item_scope: &str,
) -> Result<Vec<LibraryEntry>, DatabaseError> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM library_entries
         WHERE tenant_id = ?1 AND item_scope = ?2 AND status = 'active'
         {ENTRY_ORDER}"
    );
    query_entries(conn, &sql, params![tenant_id, item_scope])
}

/// Active category-wide fallback entries (no item scope), most used first.
pub fn lookup_category_fallback(
    conn: &Connection,
    tenant_id: &str,
    category_name: &str,
) -> Result<Vec<LibraryEntry>, DatabaseError> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM library_entries
         WHERE tenant_id = ?1 AND category_name = ?2 AND item_scope IS NULL AND status = 'active'
         {ENTRY_ORDER}"
    );
    query_entries(conn, &sql, params![tenant_id, category_name])
}

/// Exact scope lookup used to recover the row behind a rejected insert.
/// Includes retired rows.
pub fn find_scoped_entry(
    conn: &Connection,
    tenant_id: &str,
    category_name: &str,
    item_scope: Option<&str>,
    description: &str,
) -> Result<Option<LibraryEntry>, DatabaseError> {
    let row = match item_scope {
        Some(item) => {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM library_entries
                 WHERE tenant_id = ?1 AND item_scope = ?2 AND description = ?3"
            );
            conn.query_row(&sql, params![tenant_id, item, description], entry_row_from_rusqlite)
                .optional()?
        }
        None => {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM library_entries
                 WHERE tenant_id = ?1 AND category_name = ?2 AND item_scope IS NULL AND description = ?3"
            );
            conn.query_row(&sql, params![tenant_id, category_name, description], entry_row_from_rusqlite)
                .optional()?
        }
    };
    row.map(entry_from_row).transpose()
}

/// All active entries carrying exactly this description, across scopes.
pub fn find_entries_by_description(
    conn: &Connection,
    tenant_id: &str,
    description: &str,
) -> Result<Vec<LibraryEntry>, DatabaseError> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM library_entries
         WHERE tenant_id = ?1 AND description = ?2 AND status = 'active'
         {ENTRY_ORDER}"
    );
    query_entries(conn, &sql, params![tenant_id, description])
}

pub fn list_active_entries(conn: &Connection, tenant_id: &str) -> Result<Vec<LibraryEntry>, DatabaseError> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM library_entries
         WHERE tenant_id = ?1 AND status = 'active'
         ORDER BY category_name ASC, description ASC, created_at ASC"
    );
    query_entries(conn, &sql, params![tenant_id])
}

/// Snapshot of active phrases in use, summed per (category, description).
pub fn aggregate_phrase_usage(conn: &Connection, tenant_id: &str) -> Result<Vec<PhraseUsage>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT category_name, description, SUM(usage_count)
         FROM library_entries
         WHERE tenant_id = ?1 AND status = 'active' AND usage_count > 0
         GROUP BY category_name, description
         ORDER BY category_name ASC, description ASC",
    )?;

    let rows = stmt.query_map(params![tenant_id], |row| {
        Ok(PhraseUsage {
            category: row.get(0)?,
            text: row.get(1)?,
            usage_count: row.get(2)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn increment_usage(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    add_usage(conn, id, 1)
}

pub fn add_usage(conn: &Connection, id: &Uuid, amount: i64) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE library_entries SET usage_count = usage_count + ?2 WHERE id = ?1",
        params![id.to_string(), amount],
    )?;
    if rows == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

/// Retire an entry: zero its usage and mark it retired. The row is kept.
pub fn retire_entry(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE library_entries SET usage_count = 0, status = 'retired' WHERE id = ?1",
        params![id.to_string()],
    )?;
    if rows == 0 {
        return Err(not_found(id));
    }
    tracing::info!(entry_id = %id, "Library entry retired");
    Ok(())
}

/// Bring a retired entry back into circulation with a fresh usage count.
pub fn reactivate_entry(conn: &Connection, id: &Uuid, usage_count: i64) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE library_entries SET usage_count = ?2, status = 'active' WHERE id = ?1",
        params![id.to_string(), usage_count],
    )?;
    if rows == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

/// Rename an entry in place; usage and scope are untouched.
pub fn rename_entry(conn: &Connection, id: &Uuid, description: &str) -> Result<(), DatabaseError> {
    let rows = conn
        .execute(
            "UPDATE library_entries SET description = ?2 WHERE id = ?1",
            params![id.to_string(), description],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DatabaseError::ConstraintViolation(format!(
                    "description '{description}' already exists in the scope of entry {id}"
                ))
            }
            other => other.into(),
        })?;
    if rows == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

fn not_found(id: &Uuid) -> DatabaseError {
    DatabaseError::NotFound {
        entity_type: "LibraryEntry".into(),
        id: id.to_string(),
    }
}

fn query_entries(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<LibraryEntry>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, entry_row_from_rusqlite)?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(entry_from_row(row?)?);
    }
    Ok(entries)
}

struct LibraryEntryRow {
    id: String,
    tenant_id: String,
    category_name: String,
    item_scope: Option<String>,
    description: String,
    usage_count: i64,
    is_system: i32,
    status: String,
    created_at: String,
}

fn entry_row_from_rusqlite(row: &rusqlite::Row<'_>) -> rusqlite::Result<LibraryEntryRow> {
    Ok(LibraryEntryRow {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        category_name: row.get(2)?,
        item_scope: row.get(3)?,
        description: row.get(4)?,
        usage_count: row.get(5)?,
        is_system: row.get(6)?,
        status: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn entry_from_row(row: LibraryEntryRow) -> Result<LibraryEntry, DatabaseError> {
    Ok(LibraryEntry {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        tenant_id: row.tenant_id,
        category_name: row.category_name,
        item_scope: row.item_scope,
        description: row.description,
        usage_count: row.usage_count,
        is_system: row.is_system != 0,
        status: EntryStatus::from_str(&row.status)?,
        created_at: NaiveDateTime::parse_from_str(&row.created_at, TIMESTAMP_FORMAT)
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn entry<'a>(item: Option<&'a str>, description: &'a str, usage: i64) -> NewLibraryEntry<'a> {
        NewLibraryEntry {
            tenant_id: "t1",
            category_name: "Wet Area",
            item_scope: item,
            description,
            usage_count: usage,
            is_system: false,
        }
    }

    #[test]
    fn insert_and_get() {
        let conn = open_memory_database().unwrap();
        let created = insert_library_entry(&conn, &entry(Some("item-1"), "Tap leaking", 1))
            .unwrap()
            .unwrap();

        let fetched = get_library_entry(&conn, &created.id).unwrap().unwrap();
        assert_eq!(fetched.description, "Tap leaking");
        assert_eq!(fetched.item_scope.as_deref(), Some("item-1"));
        assert_eq!(fetched.usage_count, 1);
        assert_eq!(fetched.status, EntryStatus::Active);
        assert!(!fetched.is_system);
    }

    #[test]
    fn duplicate_insert_is_ignored() {
        let conn = open_memory_database().unwrap();
        insert_library_entry(&conn, &entry(Some("item-1"), "Tap leaking", 1)).unwrap();
        let second = insert_library_entry(&conn, &entry(Some("item-1"), "Tap leaking", 1)).unwrap();
        assert!(second.is_none());

        let all = lookup_item_entries(&conn, "t1", "item-1").unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn item_lookup_orders_by_usage_desc() {
        let conn = open_memory_database().unwrap();
        insert_library_entry(&conn, &entry(Some("item-1"), "Rarely used", 1)).unwrap();
        insert_library_entry(&conn, &entry(Some("item-1"), "Often used", 9)).unwrap();
        insert_library_entry(&conn, &entry(Some("item-2"), "Other item", 50)).unwrap();

        let found = lookup_item_entries(&conn, "t1", "item-1").unwrap();
        let names: Vec<_> = found.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(names, vec!["Often used", "Rarely used"]);
    }

    #[test]
    fn category_fallback_excludes_item_scoped_rows() {
        let conn = open_memory_database().unwrap();
        insert_library_entry(&conn, &entry(None, "Tap leaking", 5)).unwrap();
        insert_library_entry(&conn, &entry(Some("item-1"), "Tap loose", 3)).unwrap();

        let found = lookup_category_fallback(&conn, "t1", "Wet Area").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].description, "Tap leaking");
        assert!(found[0].is_category_wide());
    }

    #[test]
    fn lookups_are_tenant_scoped() {
        let conn = open_memory_database().unwrap();
        insert_library_entry(&conn, &entry(Some("item-1"), "Tap leaking", 1)).unwrap();
        assert!(lookup_item_entries(&conn, "t2", "item-1").unwrap().is_empty());
    }

    #[test]
    fn retire_zeroes_usage_and_hides_entry() {
        let conn = open_memory_database().unwrap();
        let created = insert_library_entry(&conn, &entry(Some("item-1"), "Tap leaking", 7))
            .unwrap()
            .unwrap();

        retire_entry(&conn, &created.id).unwrap();

        let fetched = get_library_entry(&conn, &created.id).unwrap().unwrap();
        assert_eq!(fetched.usage_count, 0);
        assert_eq!(fetched.status, EntryStatus::Retired);
        assert!(lookup_item_entries(&conn, "t1", "item-1").unwrap().is_empty());
        // Row still present for exact-scope recovery
        assert!(find_scoped_entry(&conn, "t1", "Wet Area", Some("item-1"), "Tap leaking")
            .unwrap()
            .is_some());
    }

    #[test]
    fn usage_updates() {
        let conn = open_memory_database().unwrap();
        let created = insert_library_entry(&conn, &entry(None, "Tap leaking", 5))
            .unwrap()
            .unwrap();

        increment_usage(&conn, &created.id).unwrap();
        add_usage(&conn, &created.id, 10).unwrap();

        let fetched = get_library_entry(&conn, &created.id).unwrap().unwrap();
        assert_eq!(fetched.usage_count, 16);
    }

    #[test]
    fn usage_update_on_missing_entry_is_not_found() {
        let conn = open_memory_database().unwrap();
        let result = increment_usage(&conn, &Uuid::new_v4());
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn rename_keeps_row_and_usage() {
        let conn = open_memory_database().unwrap();
        let created = insert_library_entry(&conn, &entry(Some("item-1"), "Tap leeking", 4))
            .unwrap()
            .unwrap();

        rename_entry(&conn, &created.id, "Tap leaking").unwrap();

        let fetched = get_library_entry(&conn, &created.id).unwrap().unwrap();
        assert_eq!(fetched.description, "Tap leaking");
        assert_eq!(fetched.usage_count, 4);
    }

    #[test]
    fn rename_into_existing_phrase_is_constraint_violation() {
        let conn = open_memory_database().unwrap();
        insert_library_entry(&conn, &entry(Some("item-1"), "Tap leaking", 1)).unwrap();
        let other = insert_library_entry(&conn, &entry(Some("item-1"), "Tap leeking", 1))
            .unwrap()
            .unwrap();

        let result = rename_entry(&conn, &other.id, "Tap leaking");
        assert!(matches!(result, Err(DatabaseError::ConstraintViolation(_))));
    }

    #[test]
    fn phrase_usage_sums_across_item_scopes() {
        let conn = open_memory_database().unwrap();
        insert_library_entry(&conn, &entry(Some("item-1"), "Tap leaking", 2)).unwrap();
        insert_library_entry(&conn, &entry(Some("item-2"), "Tap leaking", 3)).unwrap();
        insert_library_entry(&conn, &entry(Some("item-1"), "Unused seed", 0)).unwrap();
        let retired = insert_library_entry(&conn, &entry(Some("item-1"), "Tap leeking", 4))
            .unwrap()
            .unwrap();
        retire_entry(&conn, &retired.id).unwrap();

        let usage = aggregate_phrase_usage(&conn, "t1").unwrap();
        assert_eq!(usage, vec![PhraseUsage {
            text: "Tap leaking".into(),
            usage_count: 5,
            category: "Wet Area".into(),
        }]);
    }

    #[test]
    fn find_by_description_spans_scopes() {
        let conn = open_memory_database().unwrap();
        insert_library_entry(&conn, &entry(Some("item-1"), "Tap leaking", 2)).unwrap();
        insert_library_entry(&conn, &entry(Some("item-2"), "Tap leaking", 8)).unwrap();
        insert_library_entry(&conn, &entry(None, "Tap leaking", 1)).unwrap();

        let found = find_entries_by_description(&conn, "t1", "Tap leaking").unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].usage_count, 8);
    }
}
