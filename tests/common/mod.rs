#![allow(dead_code)]

use std::path::Path;

use rusqlite::Connection;

use resortadm::auth::password::hash_password;
use resortadm::db::{MIGRATIONS, seed_defaults};

pub const TEST_ADMIN_PASSWORD: &str = "admin-pass-123";

/// Fresh in-memory database with the schema applied.
pub fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.execute_batch("PRAGMA foreign_keys=ON;").expect("pragmas");
    conn.execute_batch(MIGRATIONS).expect("migrations");
    conn
}

/// In-memory database with schema, catalogue, default roles, settings, and
/// the admin user seeded.
pub fn seeded_conn() -> Connection {
    let conn = test_conn();
    let hash = hash_password(TEST_ADMIN_PASSWORD).expect("hash admin password");
    seed_defaults(&conn, &hash).expect("seed defaults");
    conn
}

/// File-backed seeded database, for tests that exercise VACUUM INTO.
pub fn seeded_file_conn(dir: &Path) -> Connection {
    let conn = Connection::open(dir.join("app.db")).expect("open file db");
    conn.execute_batch("PRAGMA foreign_keys=ON;").expect("pragmas");
    conn.execute_batch(MIGRATIONS).expect("migrations");
    let hash = hash_password(TEST_ADMIN_PASSWORD).expect("hash admin password");
    seed_defaults(&conn, &hash).expect("seed defaults");
    conn
}

/// Look up a permission id by its code name.
pub fn permission_id(conn: &Connection, name: &str) -> i64 {
    conn.query_row(
        "SELECT id FROM permissions WHERE name = ?1",
        rusqlite::params![name],
        |row| row.get(0),
    )
    .unwrap_or_else(|_| panic!("permission {name} not seeded"))
}

/// Id of the seeded administrator (system) role.
pub fn admin_role_id(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT id FROM roles WHERE name = 'administrator'",
        [],
        |row| row.get(0),
    )
    .expect("administrator role seeded")
}

/// Id of the seeded admin user.
pub fn admin_user_id(conn: &Connection) -> i64 {
    conn.query_row("SELECT id FROM users WHERE username = 'admin'", [], |row| {
        row.get(0)
    })
    .expect("admin user seeded")
}
