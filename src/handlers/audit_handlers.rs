use actix_web::{HttpResponse, web};

use crate::audit;
use crate::auth::session::CurrentUser;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::handlers::types::{PageQuery, PaginatedResponse};

/// GET /api/audit — paginated audit trail, newest first.
pub async fn list(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    user.require("admin.audit")?;
    let conn = pool.get()?;
    let page = query.page.max(1);
    let per_page = query.per_page.clamp(1, 100);
    let (entries, total) = audit::find_paginated(&conn, page, per_page)?;
    Ok(HttpResponse::Ok().json(PaginatedResponse::new(entries, total, page, per_page)))
}
