use rusqlite::{Connection, OptionalExtension, params};

use super::types::{RoleDetail, RoleFilter, RoleListItem, RolePayload, UserCountFilter};
use crate::db::now_iso;
use crate::errors::AppError;
use crate::models::permission::Permission;

const LIST_SELECT: &str = "SELECT r.id, r.name, r.display_name, r.description, r.is_system, \
            r.created_at, r.updated_at, \
            (SELECT COUNT(*) FROM users u WHERE u.role_id = r.id) AS users_count, \
            (SELECT COUNT(*) FROM role_permissions rp WHERE rp.role_id = r.id) AS permissions_count \
     FROM roles r";

fn list_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<RoleListItem> {
    Ok(RoleListItem {
        id: row.get("id")?,
        name: row.get("name")?,
        display_name: row.get("display_name")?,
        description: row.get("description")?,
        is_system_role: row.get("is_system")?,
        users_count: row.get("users_count")?,
        permissions_count: row.get("permissions_count")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// List roles with optional search, permission-group, and user-count filters.
pub fn find_all(conn: &Connection, filter: &RoleFilter) -> rusqlite::Result<Vec<RoleListItem>> {
    let mut sql = String::from(LIST_SELECT);
    sql.push_str(" WHERE 1=1");
    let mut values: Vec<String> = Vec::new();

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        values.push(search.to_string());
        let n = values.len();
        sql.push_str(&format!(
            " AND (r.name LIKE '%' || ?{n} || '%' \
              OR r.display_name LIKE '%' || ?{n} || '%' \
              OR r.description LIKE '%' || ?{n} || '%')"
        ));
    }

    if let Some(group) = filter.permission_type.as_deref().filter(|s| !s.is_empty()) {
        values.push(group.to_string());
        let n = values.len();
        sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM role_permissions rp \
              JOIN permissions p ON p.id = rp.permission_id \
              WHERE rp.role_id = r.id AND p.group_key = ?{n})"
        ));
    }

    // SQLite does not allow SELECT aliases in WHERE, so the count subquery
    // is repeated here.
    match filter.user_count {
        Some(UserCountFilter::None) => {
            sql.push_str(" AND (SELECT COUNT(*) FROM users u WHERE u.role_id = r.id) = 0")
        }
        Some(UserCountFilter::Some) => {
            sql.push_str(" AND (SELECT COUNT(*) FROM users u WHERE u.role_id = r.id) > 0")
        }
        None => {}
    }

    sql.push_str(" ORDER BY r.is_system DESC, r.name");

    let mut stmt = conn.prepare(&sql)?;
    let roles = stmt
        .query_map(rusqlite::params_from_iter(values.iter()), list_item)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(roles)
}

/// Load a role with its full permission objects.
pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<RoleDetail>> {
    let sql = format!("{LIST_SELECT} WHERE r.id = ?1");
    let item = conn.query_row(&sql, params![id], list_item).optional()?;
    let Some(item) = item else { return Ok(None) };

    let mut stmt = conn.prepare(
        "SELECT p.id, p.name, p.display_name, p.description, p.group_key, \
                p.is_dangerous, p.requires_confirmation \
         FROM permissions p \
         JOIN role_permissions rp ON rp.permission_id = p.id \
         WHERE rp.role_id = ?1 \
         ORDER BY p.id",
    )?;
    let permissions = stmt
        .query_map(params![id], |row| {
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

    Ok(Some(RoleDetail {
        id: item.id,
        name: item.name,
        display_name: item.display_name,
        description: item.description,
        is_system_role: item.is_system_role,
        users_count: item.users_count,
        permissions,
        created_at: item.created_at,
        updated_at: item.updated_at,
    }))
}

/// Selected permission ids of a role, ascending.
pub fn permission_ids(conn: &Connection, role_id: i64) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT permission_id FROM role_permissions WHERE role_id = ?1 ORDER BY permission_id",
    )?;
    let ids = stmt
        .query_map(params![role_id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

fn replace_permissions(tx: &rusqlite::Transaction<'_>, role_id: i64, ids: &[i64]) -> rusqlite::Result<()> {
    tx.execute("DELETE FROM role_permissions WHERE role_id = ?1", params![role_id])?;
    let mut insert = tx.prepare(
        "INSERT INTO role_permissions (role_id, permission_id) VALUES (?1, ?2)",
    )?;
    for id in ids {
        insert.execute(params![role_id, id])?;
    }
    Ok(())
}

/// Create a role with its permission set in one transaction.
pub fn create(conn: &mut Connection, payload: &RolePayload) -> rusqlite::Result<i64> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO roles (name, display_name, description) VALUES (?1, ?2, ?3)",
        params![
            payload.name.trim(),
            payload.display_name.trim(),
            payload.description.trim()
        ],
    )?;
    let role_id = tx.last_insert_rowid();
    replace_permissions(&tx, role_id, &payload.permissions)?;
    tx.commit()?;
    Ok(role_id)
}

/// Update a role, replacing its permission set wholesale. Last submit wins;
/// there is no optimistic-concurrency token.
pub fn update(conn: &mut Connection, id: i64, payload: &RolePayload) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "UPDATE roles SET name = ?1, display_name = ?2, description = ?3, updated_at = ?4 WHERE id = ?5",
        params![
            payload.name.trim(),
            payload.display_name.trim(),
            payload.description.trim(),
            now_iso(),
            id
        ],
    )?;
    replace_permissions(&tx, id, &payload.permissions)?;
    tx.commit()?;
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM roles WHERE id = ?1", params![id])?;
    Ok(())
}

pub fn count_users(conn: &Connection, role_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role_id = ?1",
        params![role_id],
        |row| row.get(0),
    )
}

/// Guard shared by single and bulk delete: system roles and roles with
/// assigned users are not deletable.
fn check_deletable(conn: &Connection, id: i64) -> Result<(), AppError> {
    let role = find_by_id(conn, id)?.ok_or(AppError::NotFound)?;
    if role.is_system_role {
        return Err(AppError::Conflict(format!(
            "Cannot delete system role '{}'",
            role.display_name
        )));
    }
    if role.users_count > 0 {
        return Err(AppError::Conflict(format!(
            "Cannot delete role '{}': {} user(s) still assigned",
            role.display_name, role.users_count
        )));
    }
    Ok(())
}

pub fn delete_checked(conn: &Connection, id: i64) -> Result<(), AppError> {
    check_deletable(conn, id)?;
    delete(conn, id)?;
    Ok(())
}

/// All-or-nothing bulk delete: any guard failure rolls back the whole batch.
pub fn bulk_delete(conn: &mut Connection, ids: &[i64]) -> Result<usize, AppError> {
    let tx = conn.transaction()?;
    for id in ids {
        let role = {
            let sql = format!("{LIST_SELECT} WHERE r.id = ?1");
            tx.query_row(&sql, params![id], list_item).optional()?
        };
        let role = role.ok_or(AppError::NotFound)?;
        if role.is_system_role {
            return Err(AppError::Conflict(format!(
                "Cannot delete system role '{}'",
                role.display_name
            )));
        }
        if role.users_count > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete role '{}': {} user(s) still assigned",
                role.display_name, role.users_count
            )));
        }
        tx.execute("DELETE FROM roles WHERE id = ?1", params![id])?;
    }
    tx.commit()?;
    Ok(ids.len())
}

/// Duplicate a role: copied permissions, fresh unique name, no users. The
/// copy is never a system role even when the source is.
pub fn duplicate(conn: &mut Connection, id: i64) -> Result<i64, AppError> {
    let source = find_by_id(conn, id)?.ok_or(AppError::NotFound)?;

    let mut name = format!("{}_copy", source.name);
    let mut suffix = 2;
    while role_name_exists(conn, &name)? {
        name = format!("{}_copy{}", source.name, suffix);
        suffix += 1;
    }

    let payload = RolePayload {
        name,
        display_name: format!("{} (Copy)", source.display_name),
        description: source.description.clone(),
        permissions: source.permissions.iter().map(|p| p.id).collect(),
    };
    Ok(create(conn, &payload)?)
}

fn role_name_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM roles WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )
}
