use std::str::FromStr;

use rusqlite::{params, Connection};

use crate::config::AUDIT_PAGE_SIZE;
use crate::db::{format_timestamp, parse_timestamp, parse_uuid, DatabaseError};
use crate::models::*;

/// Insert one audit entry. Snapshots are stored as JSON text.
pub fn insert_audit_entry(conn: &Connection, entry: &AuditEntry) -> Result<(), DatabaseError> {
    let before = entry.before.as_ref().map(serde_json::to_string).transpose()?;
    let after = entry.after.as_ref().map(serde_json::to_string).transpose()?;
    conn.execute(
        "INSERT INTO audit_log (id, actor_user_id, action, entity_type, entity_id,
         before_json, after_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.id.to_string(),
            entry.actor_user_id,
            entry.action.as_str(),
            entry.entity_type,
            entry.entity_id,
            before,
            after,
            format_timestamp(&entry.created_at),
        ],
    )?;
    Ok(())
}

/// One page of audit entries, newest first.
pub fn list_audit_entries(
    conn: &Connection,
    filter: &AuditFilter,
) -> Result<Vec<AuditEntry>, DatabaseError> {
    let page = i64::from(filter.page.max(1));
    let offset = (page - 1) * AUDIT_PAGE_SIZE;

    let mut stmt = conn.prepare(
        "SELECT id, actor_user_id, action, entity_type, entity_id, before_json, after_json, created_at
         FROM audit_log
         WHERE (?1 IS NULL OR entity_type = ?1)
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt
        .query_map(params![filter.entity_type, AUDIT_PAGE_SIZE, offset], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, actor, action, entity_type, entity_id, before, after, created_at)| {
            Ok(AuditEntry {
                id: parse_uuid("id", &id)?,
                actor_user_id: actor,
                action: AuditAction::from_str(&action)?,
                entity_type,
                entity_id,
                before: before.as_deref().map(serde_json::from_str).transpose()?,
                after: after.as_deref().map(serde_json::from_str).transpose()?,
                created_at: parse_timestamp("created_at", &created_at)?,
            })
        })
        .collect()
}
