use rusqlite::{Connection, params};
use serde::Serialize;

/// Immutable reference data: one grantable permission. Seeded at startup,
/// read-only over the API.
#[derive(Debug, Clone, Serialize)]
pub struct Permission {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub group_key: String,
    pub is_dangerous: bool,
    pub requires_confirmation: bool,
}

/// A permission group. `permissions_count` is denormalized display data,
/// never authoritative over the permission list itself.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionGroup {
    pub key: String,
    pub display_name: String,
    pub description: Option<String>,
    pub permissions_count: i64,
}

/// The full permission universe, in catalogue order.
pub fn find_all(conn: &Connection) -> rusqlite::Result<Vec<Permission>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.name, p.display_name, p.description, p.group_key, \
                p.is_dangerous, p.requires_confirmation \
         FROM permissions p \
         JOIN permission_groups g ON g.key = p.group_key \
         ORDER BY g.sort_order, p.name",
    )?;
    let perms = stmt
        .query_map([], |row| {
            Ok(Permission {
                id: row.get("id")?,
                name: row.get("name")?,
                display_name: row.get("display_name")?,
                description: row.get("description")?,
                group_key: row.get("group_key")?,
                is_dangerous: row.get("is_dangerous")?,
                requires_confirmation: row.get("requires_confirmation")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(perms)
}

/// All groups with their member counts.
pub fn find_groups(conn: &Connection) -> rusqlite::Result<Vec<PermissionGroup>> {
    let mut stmt = conn.prepare(
        "SELECT g.key, g.display_name, g.description, \
                (SELECT COUNT(*) FROM permissions p WHERE p.group_key = g.key) AS permissions_count \
         FROM permission_groups g \
         ORDER BY g.sort_order, g.key",
    )?;
    let groups = stmt
        .query_map([], |row| {
            Ok(PermissionGroup {
                key: row.get("key")?,
                display_name: row.get("display_name")?,
                description: row.get("description")?,
                permissions_count: row.get("permissions_count")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(groups)
}

/// Check that every id refers to a known permission. Role writes enforce the
/// subset-of-universe invariant with this before touching role_permissions.
pub fn all_ids_exist(conn: &Connection, ids: &[i64]) -> rusqlite::Result<bool> {
    if ids.is_empty() {
        return Ok(true);
    }
    let placeholders = vec!["?"; ids.len()].join(",");
    let sql = format!("SELECT COUNT(*) FROM permissions WHERE id IN ({placeholders})");
    let count: i64 = conn.query_row(&sql, rusqlite::params_from_iter(ids.iter()), |row| row.get(0))?;
    Ok(count as usize == ids.len())
}

/// Does a group key exist in the catalogue.
pub fn group_exists(conn: &Connection, key: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM permission_groups WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
}
