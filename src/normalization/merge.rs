//! Operator-triggered rewrites of canonical descriptions.
//!
//! Every operation runs as one transaction: defect rewrites and library
//! updates commit together or not at all. Only open defects are rewritten;
//! cleared and closed defects keep the text they were closed with.

use rusqlite::Connection;

use crate::config::EngineConfig;
use crate::db::{self, with_write_transaction};
use crate::models::{LibraryEntry, NewLibraryEntry};
use crate::models::enums::EntryStatus;

use super::error::NormalizationError;
use super::types::{ClusterMergeReport, MemberMerge, RewriteOutcome};

/// Rename `old` to `new` on open defects and on the library rows in place.
pub fn edit_description(
    conn: &Connection,
    tenant_id: &str,
    old: &str,
    new: &str,
) -> Result<RewriteOutcome, NormalizationError> {
    if let Some(outcome) = guard(old, new) {
        log_soft_failure("edit", tenant_id, old, &outcome);
        return Ok(outcome);
    }

    let outcome = with_write_transaction(conn, |tx| {
        let old_entries = db::find_entries_by_description(tx, tenant_id, old)?;
        for entry in &old_entries {
            let clash = db::find_scoped_entry(
                tx,
                tenant_id,
                &entry.category_name,
                entry.item_scope.as_deref(),
                new,
            )?;
            if clash.is_some() {
                return Ok(RewriteOutcome::TargetExists);
            }
        }

        let affected = db::rewrite_open_defects(tx, tenant_id, old, new)?;
        if affected == 0 {
            return Ok(RewriteOutcome::NotFound);
        }

        for entry in &old_entries {
            db::rename_entry(tx, &entry.id, new)?;
        }
        Ok::<_, NormalizationError>(RewriteOutcome::Applied { affected })
    })?;

    match &outcome {
        RewriteOutcome::Applied { affected } => tracing::info!(
            tenant = tenant_id,
            old,
            new,
            affected,
            "Description edited"
        ),
        other => log_soft_failure("edit", tenant_id, old, other),
    }
    Ok(outcome)
}

/// Fold `old` into `new`: rewrite open defects, credit `new` with the number
/// of rewritten defects and retire every `old` library row.
pub fn merge_descriptions(
    conn: &Connection,
    tenant_id: &str,
    config: &EngineConfig,
    old: &str,
    new: &str,
) -> Result<RewriteOutcome, NormalizationError> {
    if let Some(outcome) = guard(old, new) {
        log_soft_failure("merge", tenant_id, old, &outcome);
        return Ok(outcome);
    }

    let outcome = with_write_transaction(conn, |tx| merge_in(tx, tenant_id, config, old, new))?;

    match &outcome {
        RewriteOutcome::Applied { affected } => tracing::info!(
            tenant = tenant_id,
            old,
            new,
            affected,
            "Descriptions merged"
        ),
        other => log_soft_failure("merge", tenant_id, old, other),
    }
    Ok(outcome)
}

/// Merge every member of a reviewed cluster into `canonical` atomically.
///
/// `canonical` itself and repeated members are skipped, so a member list that
/// includes the canonical phrase once performs `len - 1` merges.
pub fn merge_cluster(
    conn: &Connection,
    tenant_id: &str,
    config: &EngineConfig,
    canonical: &str,
    members: &[String],
) -> Result<ClusterMergeReport, NormalizationError> {
    let report = with_write_transaction(conn, |tx| {
        let mut merges: Vec<MemberMerge> = Vec::new();
        for member in members {
            if member == canonical || merges.iter().any(|m| &m.description == member) {
                continue;
            }
            let outcome = match guard(member, canonical) {
                Some(soft) => soft,
                None => merge_in(tx, tenant_id, config, member, canonical)?,
            };
            merges.push(MemberMerge {
                description: member.clone(),
                outcome,
            });
        }

        let total_affected = merges.iter().map(|m| m.outcome.affected()).sum();
        Ok::<_, NormalizationError>(ClusterMergeReport {
            canonical: canonical.to_string(),
            total_affected,
            merges,
        })
    })?;

    tracing::info!(
        tenant = tenant_id,
        canonical,
        members = report.merges.len(),
        total_affected = report.total_affected,
        "Cluster merged"
    );
    Ok(report)
}

fn merge_in(
    conn: &Connection,
    tenant_id: &str,
    config: &EngineConfig,
    old: &str,
    new: &str,
) -> Result<RewriteOutcome, NormalizationError> {
    let affected = db::rewrite_open_defects(conn, tenant_id, old, new)?;
    if affected == 0 {
        return Ok(RewriteOutcome::NotFound);
    }

    let old_entries = db::find_entries_by_description(conn, tenant_id, old)?;
    let targets = db::find_entries_by_description(conn, tenant_id, new)?;
    let template = old_entries.first();

    match pick_target(template, &targets) {
        Some(target) => db::add_usage(conn, &target.id, affected as i64)?,
        None => credit_new_target(conn, tenant_id, config, template, new, affected as i64)?,
    }

    for entry in &old_entries {
        db::retire_entry(conn, &entry.id)?;
    }

    Ok(RewriteOutcome::Applied { affected })
}

/// Active `new` row to credit, nearest to the scope of `old` first:
/// same item scope, then same category, then anywhere in the tenant.
/// `targets` is ordered by usage, so each step takes the most used row.
fn pick_target<'a>(
    template: Option<&LibraryEntry>,
    targets: &'a [LibraryEntry],
) -> Option<&'a LibraryEntry> {
    let Some(template) = template else {
        return targets.first();
    };

    targets
        .iter()
        .find(|t| t.category_name == template.category_name && t.item_scope == template.item_scope)
        .or_else(|| targets.iter().find(|t| t.category_name == template.category_name))
        .or_else(|| targets.first())
}

/// `new` has no active library row: give it one in the scope of the phrase
/// it replaces, reviving a retired row if one already sits there.
fn credit_new_target(
    conn: &Connection,
    tenant_id: &str,
    config: &EngineConfig,
    template: Option<&LibraryEntry>,
    new: &str,
    usage: i64,
) -> Result<(), NormalizationError> {
    let (category, item_scope) = match template {
        Some(entry) => (entry.category_name.clone(), entry.item_scope.clone()),
        None => (config.unknown_category.clone(), None),
    };

    let created = db::insert_library_entry(conn, &NewLibraryEntry {
        tenant_id,
        category_name: &category,
        item_scope: item_scope.as_deref(),
        description: new,
        usage_count: usage,
        is_system: false,
    })?;
    if created.is_some() {
        return Ok(());
    }

    if let Some(existing) =
        db::find_scoped_entry(conn, tenant_id, &category, item_scope.as_deref(), new)?
    {
        match existing.status {
            EntryStatus::Retired => db::reactivate_entry(conn, &existing.id, usage)?,
            EntryStatus::Active => db::add_usage(conn, &existing.id, usage)?,
        }
    }
    Ok(())
}

fn guard(old: &str, new: &str) -> Option<RewriteOutcome> {
    if old == new {
        Some(RewriteOutcome::Identical)
    } else if new.trim().is_empty() {
        Some(RewriteOutcome::BlankTarget)
    } else {
        None
    }
}

fn log_soft_failure(operation: &str, tenant_id: &str, old: &str, outcome: &RewriteOutcome) {
    tracing::warn!(
        operation,
        tenant = tenant_id,
        old,
        reason = %outcome.message(),
        "Rewrite skipped"
    );
}
