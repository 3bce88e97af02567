use rusqlite::{Connection, OptionalExtension, params};

use super::types::{NewUser, User, UserDisplay, UserPage};
use crate::db::now_iso;
use crate::models::table::{SortDir, SortSpec};

/// Allowed sort column keys and their SQL expressions. Anything else falls
/// back to id, so user input can never reach ORDER BY directly.
fn sort_col(key: &str) -> &'static str {
    match key {
        "username" => "u.username",
        "display_name" => "u.display_name",
        "email" => "u.email",
        "role" => "COALESCE(r.name, '')",
        "created_at" => "u.created_at",
        "updated_at" => "u.updated_at",
        _ => "u.id",
    }
}

const DISPLAY_SELECT: &str = "SELECT u.id, u.username, u.email, u.display_name, u.role_id, u.is_active, \
            u.created_at, u.updated_at, \
            COALESCE(r.name, '') AS role_name, \
            COALESCE(r.display_name, '') AS role_display_name \
     FROM users u \
     LEFT JOIN roles r ON r.id = u.role_id";

fn display_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserDisplay> {
    Ok(UserDisplay {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        display_name: row.get("display_name")?,
        role_id: row.get("role_id")?,
        role_name: row.get("role_name")?,
        role_display_name: row.get("role_display_name")?,
        is_active: row.get("is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Paginated users listing with optional search and whitelisted sort.
pub fn find_paginated(
    conn: &Connection,
    page: i64,
    per_page: i64,
    search: Option<&str>,
    sort: &SortSpec,
) -> rusqlite::Result<UserPage> {
    let page = page.max(1);
    let per_page = per_page.clamp(1, 100);

    let mut where_clause = String::from(" WHERE 1=1");
    let mut values: Vec<String> = Vec::new();
    if let Some(s) = search.map(str::trim).filter(|s| !s.is_empty()) {
        values.push(s.to_string());
        where_clause.push_str(
            " AND (u.username LIKE '%' || ?1 || '%' \
              OR u.display_name LIKE '%' || ?1 || '%' \
              OR u.email LIKE '%' || ?1 || '%')",
        );
    }

    let total_count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM users u LEFT JOIN roles r ON r.id = u.role_id{where_clause}"),
        rusqlite::params_from_iter(values.iter()),
        |row| row.get(0),
    )?;

    let dir = match sort.dir {
        SortDir::Asc => "ASC",
        SortDir::Desc => "DESC",
    };
    let order = format!(" ORDER BY {} {dir}, u.id", sort_col(&sort.column));
    let limit = format!(" LIMIT {per_page} OFFSET {}", (page - 1) * per_page);

    let sql = format!("{DISPLAY_SELECT}{where_clause}{order}{limit}");
    let mut stmt = conn.prepare(&sql)?;
    let users = stmt
        .query_map(rusqlite::params_from_iter(values.iter()), display_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let total_pages = if total_count == 0 { 1 } else { (total_count + per_page - 1) / per_page };
    Ok(UserPage { users, page, per_page, total_count, total_pages })
}

pub fn find_display_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<UserDisplay>> {
    let sql = format!("{DISPLAY_SELECT} WHERE u.id = ?1");
    conn.query_row(&sql, params![id], display_row).optional()
}

/// For login: includes the password hash.
pub fn find_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, username, password, email, display_name, role_id, is_active \
         FROM users WHERE username = ?1",
        params![username],
        |row| {
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                email: row.get(3)?,
                display_name: row.get(4)?,
                role_id: row.get(5)?,
                is_active: row.get(6)?,
            })
        },
    )
    .optional()
}

pub fn create(conn: &Connection, user: &NewUser) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO users (username, password, email, display_name, role_id) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.username.trim(),
            user.password,
            user.email.trim(),
            user.display_name.trim(),
            user.role_id
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Update a user; password changes only when a new hash is supplied. Profile
/// and password writes commit together or not at all.
pub fn update(
    conn: &mut Connection,
    id: i64,
    username: &str,
    password_hash: Option<&str>,
    email: &str,
    display_name: &str,
    role_id: Option<i64>,
    is_active: bool,
) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "UPDATE users SET username = ?1, email = ?2, display_name = ?3, role_id = ?4, \
         is_active = ?5, updated_at = ?6 WHERE id = ?7",
        params![
            username.trim(),
            email.trim(),
            display_name.trim(),
            role_id,
            is_active,
            now_iso(),
            id
        ],
    )?;
    if let Some(hash) = password_hash {
        tx.execute(
            "UPDATE users SET password = ?1 WHERE id = ?2",
            params![hash, id],
        )?;
    }
    tx.commit()?;
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(())
}

pub fn count(conn: &Connection) -> rusqlite::Result<(i64, i64)> {
    conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(is_active), 0) FROM users",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
}
