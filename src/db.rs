use chrono::Utc;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, params};

pub type DbPool = Pool<SqliteConnectionManager>;

pub const MIGRATIONS: &str = include_str!("schema.sql");

pub fn init_pool(database_url: &str) -> DbPool {
    let manager = SqliteConnectionManager::file(database_url).with_init(|conn| {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(())
    });
    Pool::builder()
        .max_size(8)
        .build(manager)
        .expect("Failed to create DB pool")
}

pub fn run_migrations(pool: &DbPool) {
    let conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.execute_batch(MIGRATIONS)
        .expect("Failed to run migrations");
    log::info!("Database migrations complete");
}

/// Current time as the ISO-8601 second-resolution TEXT form stored everywhere.
pub fn now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// (group key, display name, description)
const PERMISSION_GROUPS: &[(&str, &str, &str)] = &[
    ("reservations", "Reservations", "Booking calendar and stay management"),
    ("guests", "Guests", "Guest profiles and contact data"),
    ("billing", "Billing", "Invoices, charges, and refunds"),
    ("housekeeping", "Housekeeping", "Room status and cleaning assignments"),
    ("reports", "Reports", "Occupancy and revenue reporting"),
    ("admin", "Administration", "System administration"),
];

/// (name, display name, description, group, dangerous, requires confirmation)
const PERMISSIONS: &[(&str, &str, &str, &str, bool, bool)] = &[
    ("reservations.view", "View reservations", "Read access to the booking calendar", "reservations", false, false),
    ("reservations.manage", "Manage reservations", "Create and modify bookings", "reservations", false, false),
    ("reservations.cancel", "Cancel reservations", "Cancel confirmed bookings", "reservations", false, true),
    ("guests.view", "View guests", "Read access to guest profiles", "guests", false, false),
    ("guests.manage", "Manage guests", "Create and edit guest profiles", "guests", false, false),
    ("billing.view", "View billing", "Read access to invoices and charges", "billing", false, false),
    ("billing.manage", "Manage billing", "Post charges and issue invoices", "billing", false, false),
    ("billing.refund", "Issue refunds", "Refund settled charges", "billing", true, true),
    ("housekeeping.view", "View housekeeping", "Read room status board", "housekeeping", false, false),
    ("housekeeping.assign", "Assign housekeeping", "Assign cleaning tasks to staff", "housekeeping", false, false),
    ("reports.view", "View reports", "Occupancy and revenue dashboards", "reports", false, false),
    ("reports.export", "Export reports", "Download report data", "reports", false, false),
    ("admin.dashboard", "View admin dashboard", "Administrative metrics overview", "admin", false, false),
    ("admin.users", "Manage users", "Create, edit, and delete user accounts", "admin", true, false),
    ("admin.roles", "Manage roles", "Edit roles and their permissions", "admin", true, false),
    ("admin.settings", "Manage settings", "Change system configuration", "admin", false, false),
    ("admin.backups", "Manage backups", "Run and inspect database backups", "admin", true, true),
    ("admin.audit", "View audit log", "Read the administrative audit trail", "admin", false, false),
];

/// (section, key, value, type)
const SETTING_DEFAULTS: &[(&str, &str, &str, &str)] = &[
    ("general", "resort_name", "Seaside Resort", "text"),
    ("general", "timezone", "UTC", "text"),
    ("general", "currency", "EUR", "text"),
    ("security", "session_timeout_minutes", "120", "number"),
    ("security", "password_min_length", "8", "number"),
    ("security", "require_confirmation_for_dangerous", "true", "boolean"),
    ("backup", "auto_enabled", "false", "boolean"),
    ("backup", "interval_hours", "24", "number"),
    ("backup", "keep_count", "14", "number"),
    ("notifications", "email_enabled", "false", "boolean"),
    ("notifications", "email_from", "noreply@example.com", "text"),
    ("integrations", "channel_manager_url", "", "text"),
    ("integrations", "payment_provider", "none", "text"),
    ("maintenance", "maintenance_mode", "false", "boolean"),
    ("maintenance", "audit_retention_days", "90", "number"),
];

/// Seed the permission catalogue, default roles, settings, and the admin user.
/// Idempotent: skipped entirely once the permission catalogue exists.
pub fn seed_defaults(conn: &Connection, admin_password_hash: &str) -> rusqlite::Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM permissions", [], |row| row.get(0))?;
    if count > 0 {
        log::info!("Database already seeded ({count} permissions), skipping seed");
        return Ok(());
    }

    for (i, (key, label, desc)) in PERMISSION_GROUPS.iter().enumerate() {
        conn.execute(
            "INSERT INTO permission_groups (key, display_name, description, sort_order) VALUES (?1, ?2, ?3, ?4)",
            params![key, label, desc, i as i64],
        )?;
    }

    for (name, label, desc, group, dangerous, confirm) in PERMISSIONS {
        conn.execute(
            "INSERT INTO permissions (name, display_name, description, group_key, is_dangerous, requires_confirmation) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![name, label, desc, group, *dangerous, *confirm],
        )?;
    }

    // Administrator: system role holding the full catalogue.
    conn.execute(
        "INSERT INTO roles (name, display_name, description, is_system) \
         VALUES ('administrator', 'Administrator', 'Full access to every subsystem', 1)",
        [],
    )?;
    let admin_role_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO role_permissions (role_id, permission_id) SELECT ?1, id FROM permissions",
        params![admin_role_id],
    )?;

    // Front desk: a regular starter role.
    conn.execute(
        "INSERT INTO roles (name, display_name, description, is_system) \
         VALUES ('front_desk', 'Front Desk', 'Reservations and guest handling', 0)",
        [],
    )?;
    let front_desk_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO role_permissions (role_id, permission_id) \
         SELECT ?1, id FROM permissions WHERE name IN \
         ('reservations.view', 'reservations.manage', 'guests.view', 'guests.manage', 'housekeeping.view')",
        params![front_desk_id],
    )?;

    for (section, key, value, value_type) in SETTING_DEFAULTS {
        conn.execute(
            "INSERT INTO settings (section, key, value, value_type) VALUES (?1, ?2, ?3, ?4)",
            params![section, key, value, value_type],
        )?;
    }

    conn.execute(
        "INSERT INTO users (username, password, email, display_name, role_id) \
         VALUES ('admin', ?1, 'admin@example.com', 'Administrator', ?2)",
        params![admin_password_hash, admin_role_id],
    )?;

    log::info!("Seed complete: {} permissions, 2 roles, admin user", PERMISSIONS.len());
    Ok(())
}
