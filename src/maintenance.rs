use std::time::Duration;

use crate::audit;
use crate::auth::token;
use crate::db::DbPool;
use crate::models::{backup, setting};

/// Background housekeeping: purge expired sessions, enforce audit retention,
/// and take scheduled backups when enabled. One fixed-interval task, no
/// overlapping runs beyond what the interval itself allows.
pub fn spawn_scheduler(pool: DbPool, data_dir: String) {
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            let conn = match pool.get() {
                Ok(c) => c,
                Err(e) => {
                    log::error!("Maintenance: failed to get DB connection: {e}");
                    continue;
                }
            };

            match token::purge_expired(&conn) {
                Ok(n) if n > 0 => log::info!("Maintenance: purged {n} expired session(s)"),
                Ok(_) => {}
                Err(e) => log::error!("Maintenance: session purge failed: {e}"),
            }

            let retention_days = setting::get_i64(&conn, "maintenance", "audit_retention_days", 90);
            match audit::cleanup_old_entries(&conn, retention_days) {
                Ok(n) if n > 0 => log::info!("Maintenance: removed {n} old audit entries"),
                Ok(_) => {}
                Err(e) => log::error!("Maintenance: audit cleanup failed: {e}"),
            }

            if setting::get_bool(&conn, "backup", "auto_enabled", false) {
                let interval_hours = setting::get_i64(&conn, "backup", "interval_hours", 24);
                match backup::scheduled_backup_due(&conn, interval_hours) {
                    Ok(true) => {
                        match backup::run_backup(&conn, &data_dir, "scheduled") {
                            Ok(record) => {
                                log::info!("Maintenance: scheduled backup {} written", record.filename)
                            }
                            Err(e) => log::error!("Maintenance: scheduled backup failed: {e}"),
                        }
                        let keep = setting::get_i64(&conn, "backup", "keep_count", 14);
                        if let Err(e) = backup::prune(&conn, &data_dir, keep) {
                            log::error!("Maintenance: backup prune failed: {e}");
                        }
                    }
                    Ok(false) => {}
                    Err(e) => log::error!("Maintenance: backup schedule check failed: {e}"),
                }
            }
        }
    });
}
