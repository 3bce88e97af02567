use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};
use serde::Serialize;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct BackupRecord {
    pub id: i64,
    pub filename: String,
    pub size_bytes: i64,
    pub status: String,
    pub trigger_kind: String,
    pub created_at: String,
}

fn backups_dir(data_dir: &str) -> PathBuf {
    Path::new(data_dir).join("backups")
}

/// Snapshot the live database with VACUUM INTO and record the outcome.
/// A failed snapshot is recorded too, so the history shows the gap.
pub fn run_backup(conn: &Connection, data_dir: &str, trigger_kind: &str) -> Result<BackupRecord, AppError> {
    let dir = backups_dir(data_dir);
    fs::create_dir_all(&dir)
        .map_err(|e| AppError::Conflict(format!("Cannot create backup directory: {e}")))?;

    // Millisecond component keeps filenames unique for back-to-back runs.
    let filename = format!(
        "backup-{}.db",
        chrono::Utc::now().format("%Y%m%d-%H%M%S%3f")
    );
    let path = dir.join(&filename);
    let path_str = path.to_string_lossy().to_string();

    let result = conn.execute("VACUUM INTO ?1", params![path_str]);
    let (status, size_bytes) = match result {
        Ok(_) => {
            let size = fs::metadata(&path).map(|m| m.len() as i64).unwrap_or(0);
            ("completed", size)
        }
        Err(e) => {
            log::error!("Backup failed: {e}");
            ("failed", 0)
        }
    };

    conn.execute(
        "INSERT INTO backup_history (filename, size_bytes, status, trigger_kind) \
         VALUES (?1, ?2, ?3, ?4)",
        params![filename, size_bytes, status, trigger_kind],
    )?;
    let id = conn.last_insert_rowid();

    let record = find_by_id(conn, id)?.ok_or(AppError::NotFound)?;
    if record.status == "failed" {
        return Err(AppError::Conflict("Backup failed".to_string()));
    }
    Ok(record)
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<BackupRecord>> {
    use rusqlite::OptionalExtension;
    conn.query_row(
        "SELECT id, filename, size_bytes, status, trigger_kind, created_at \
         FROM backup_history WHERE id = ?1",
        params![id],
        record_row,
    )
    .optional()
}

pub fn find_recent(conn: &Connection, limit: i64) -> rusqlite::Result<Vec<BackupRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, filename, size_bytes, status, trigger_kind, created_at \
         FROM backup_history ORDER BY created_at DESC, id DESC LIMIT ?1",
    )?;
    let records = stmt
        .query_map(params![limit], record_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Most recent successful backup, for the dashboard.
pub fn last_completed(conn: &Connection) -> rusqlite::Result<Option<BackupRecord>> {
    use rusqlite::OptionalExtension;
    conn.query_row(
        "SELECT id, filename, size_bytes, status, trigger_kind, created_at \
         FROM backup_history WHERE status = 'completed' \
         ORDER BY created_at DESC, id DESC LIMIT 1",
        [],
        record_row,
    )
    .optional()
}

/// Whether a scheduled backup is due, given the configured interval.
pub fn scheduled_backup_due(conn: &Connection, interval_hours: i64) -> rusqlite::Result<bool> {
    use rusqlite::OptionalExtension;
    let last: Option<String> = conn
        .query_row(
            "SELECT created_at FROM backup_history WHERE trigger_kind = 'scheduled' \
             ORDER BY created_at DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    let Some(last) = last else { return Ok(true) };

    let cutoff = (chrono::Utc::now() - chrono::Duration::hours(interval_hours))
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string();
    Ok(last <= cutoff)
}

/// Keep the newest `keep_count` snapshot rows; delete the rest along with
/// their files (best effort on the filesystem side).
pub fn prune(conn: &Connection, data_dir: &str, keep_count: i64) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare(
        "SELECT id, filename FROM backup_history \
         ORDER BY created_at DESC, id DESC LIMIT -1 OFFSET ?1",
    )?;
    let stale: Vec<(i64, String)> = stmt
        .query_map(params![keep_count.max(0)], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let dir = backups_dir(data_dir);
    for (id, filename) in &stale {
        let _ = fs::remove_file(dir.join(filename));
        conn.execute("DELETE FROM backup_history WHERE id = ?1", params![id])?;
    }
    Ok(stale.len())
}

fn record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BackupRecord> {
    Ok(BackupRecord {
        id: row.get("id")?,
        filename: row.get("filename")?,
        size_bytes: row.get("size_bytes")?,
        status: row.get("status")?,
        trigger_kind: row.get("trigger_kind")?,
        created_at: row.get("created_at")?,
    })
}
