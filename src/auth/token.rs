use chrono::{Duration, Utc};
use rand::Rng;
use rusqlite::{Connection, OptionalExtension, params};

use crate::auth::session::{CurrentUser, Permissions};
use crate::db::now_iso;

/// Generate a random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Issue a bearer token for a user. The token and logout are the session's
/// only lifecycle transitions; expiry is handled by `purge_expired`.
pub fn issue(conn: &Connection, user_id: i64, ttl_minutes: i64) -> rusqlite::Result<String> {
    let token = generate_token();
    let expires_at = (Utc::now() + Duration::minutes(ttl_minutes))
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string();
    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params![token, user_id, expires_at],
    )?;
    Ok(token)
}

/// Resolve a bearer token to its user, with permission codes loaded from the
/// user's role. Returns None for unknown, expired, or deactivated sessions.
pub fn authenticate(conn: &Connection, token: &str) -> rusqlite::Result<Option<CurrentUser>> {
    let row = conn
        .query_row(
            "SELECT u.id, u.username, u.display_name \
             FROM sessions s \
             JOIN users u ON u.id = s.user_id \
             WHERE s.token = ?1 AND s.expires_at > ?2 AND u.is_active = 1",
            params![token, now_iso()],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    let Some((user_id, username, display_name)) = row else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT p.name \
         FROM permissions p \
         JOIN role_permissions rp ON rp.permission_id = p.id \
         JOIN users u ON u.role_id = rp.role_id \
         WHERE u.id = ?1 \
         ORDER BY p.name",
    )?;
    let codes = stmt
        .query_map(params![user_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(CurrentUser {
        user_id,
        username,
        display_name,
        permissions: Permissions(codes),
        token: token.to_string(),
    }))
}

/// Revoke a token (logout).
pub fn revoke(conn: &Connection, token: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Delete expired sessions. Returns the number removed.
pub fn purge_expired(conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now_iso()])
}

/// Count live sessions (dashboard metric).
pub fn count_active(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM sessions WHERE expires_at > ?1",
        params![now_iso()],
        |row| row.get(0),
    )
}
