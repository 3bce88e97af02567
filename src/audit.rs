use rusqlite::{Connection, params};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: i64,
    pub action: String,
    pub target_type: String,
    pub target_id: i64,
    pub details: Value,
    pub created_at: String,
}

/// Record an administrative action. Callers treat failures as non-fatal:
/// an audit write must never abort the operation it describes.
pub fn log(
    conn: &Connection,
    user_id: i64,
    action: &str,
    target_type: &str,
    target_id: i64,
    details: Value,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO audit_log (user_id, action, target_type, target_id, details) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id, action, target_type, target_id, details.to_string()],
    )?;
    Ok(())
}

fn entry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEntry> {
    let details: String = row.get("details")?;
    Ok(AuditEntry {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        action: row.get("action")?,
        target_type: row.get("target_type")?,
        target_id: row.get("target_id")?,
        details: serde_json::from_str(&details).unwrap_or(Value::Null),
        created_at: row.get("created_at")?,
    })
}

pub fn find_recent(conn: &Connection, limit: i64) -> rusqlite::Result<Vec<AuditEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, action, target_type, target_id, details, created_at \
         FROM audit_log ORDER BY id DESC LIMIT ?1",
    )?;
    let entries = stmt
        .query_map(params![limit], entry_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// Paginated audit listing, newest first. Returns (entries, total).
pub fn find_paginated(
    conn: &Connection,
    page: i64,
    per_page: i64,
) -> rusqlite::Result<(Vec<AuditEntry>, i64)> {
    let page = page.max(1);
    let per_page = per_page.clamp(1, 100);
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;

    let mut stmt = conn.prepare(
        "SELECT id, user_id, action, target_type, target_id, details, created_at \
         FROM audit_log ORDER BY id DESC LIMIT ?1 OFFSET ?2",
    )?;
    let entries = stmt
        .query_map(params![per_page, (page - 1) * per_page], entry_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok((entries, total))
}

/// Drop entries older than the retention window. Returns the number removed.
pub fn cleanup_old_entries(conn: &Connection, retention_days: i64) -> rusqlite::Result<usize> {
    let cutoff = (chrono::Utc::now() - chrono::Duration::days(retention_days))
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string();
    conn.execute("DELETE FROM audit_log WHERE created_at < ?1", params![cutoff])
}
