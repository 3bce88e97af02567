use actix_web::{HttpResponse, web};

use crate::audit;
use crate::auth::session::CurrentUser;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::backup;

/// GET /api/backups — recent snapshot history, newest first.
pub async fn list(pool: web::Data<DbPool>, user: CurrentUser) -> Result<HttpResponse, AppError> {
    user.require("admin.backups")?;
    let conn = pool.get()?;
    Ok(HttpResponse::Ok().json(backup::find_recent(&conn, 50)?))
}

/// POST /api/backups — take a manual snapshot now.
pub async fn run(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    user.require("admin.backups")?;
    let conn = pool.get()?;
    let record = backup::run_backup(&conn, &config.data_dir, "manual")?;

    if let Err(e) = audit::log(
        &conn,
        user.user_id,
        "backup.run",
        "backup",
        record.id,
        serde_json::json!({ "filename": record.filename, "size_bytes": record.size_bytes }),
    ) {
        log::warn!("Audit write failed for backup.run: {e}");
    }
    Ok(HttpResponse::Created().json(record))
}
