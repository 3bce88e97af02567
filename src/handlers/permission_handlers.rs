use actix_web::{HttpResponse, web};

use crate::auth::session::CurrentUser;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::permission;

/// GET /api/permissions — the full catalogue, in group order. Read-only
/// reference data; any authenticated user may read it.
pub async fn list(pool: web::Data<DbPool>, _user: CurrentUser) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    Ok(HttpResponse::Ok().json(permission::find_all(&conn)?))
}

/// GET /api/permissions/groups — groups with member counts.
pub async fn groups(pool: web::Data<DbPool>, _user: CurrentUser) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    Ok(HttpResponse::Ok().json(permission::find_groups(&conn)?))
}
