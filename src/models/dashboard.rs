use rusqlite::Connection;
use serde::Serialize;

use crate::audit::{self, AuditEntry};
use crate::auth::token;
use crate::models::backup::{self, BackupRecord};
use crate::models::user;

/// The dashboard summary payload. Clients poll this on an interval and
/// overwrite their previous snapshot; nothing here is authoritative.
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub total_users: i64,
    pub active_users: i64,
    pub total_roles: i64,
    pub total_permissions: i64,
    pub active_sessions: i64,
    pub last_backup: Option<BackupRecord>,
    pub recent_activity: Vec<AuditEntry>,
}

pub fn summary(conn: &Connection) -> rusqlite::Result<DashboardSummary> {
    let (total_users, active_users) = user::count(conn)?;
    let total_roles: i64 = conn.query_row("SELECT COUNT(*) FROM roles", [], |row| row.get(0))?;
    let total_permissions: i64 =
        conn.query_row("SELECT COUNT(*) FROM permissions", [], |row| row.get(0))?;

    Ok(DashboardSummary {
        total_users,
        active_users,
        total_roles,
        total_permissions,
        active_sessions: token::count_active(conn)?,
        last_backup: backup::last_completed(conn)?,
        recent_activity: audit::find_recent(conn, 5)?,
    })
}
