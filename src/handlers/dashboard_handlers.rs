use actix_web::{HttpResponse, web};

use crate::auth::session::CurrentUser;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::dashboard;

/// GET /api/dashboard/summary — counts, last backup, recent activity. A
/// point-in-time snapshot; clients poll and overwrite.
pub async fn summary(pool: web::Data<DbPool>, user: CurrentUser) -> Result<HttpResponse, AppError> {
    user.require("admin.dashboard")?;
    let conn = pool.get()?;
    Ok(HttpResponse::Ok().json(dashboard::summary(&conn)?))
}
