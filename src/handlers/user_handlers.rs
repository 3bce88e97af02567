use actix_web::{HttpResponse, web};

use crate::audit;
use crate::auth::password::hash_password;
use crate::auth::session::CurrentUser;
use crate::auth::validate::{validate_email, validate_password, validate_username};
use crate::db::DbPool;
use crate::errors::{AppError, FieldErrors, map_unique_violation};
use crate::handlers::types::{PageQuery, PaginatedResponse, UserRequest, UserResponse};
use crate::models::table::{ColumnDef, SortSpec};
use crate::models::user::{self, NewUser};

/// Users listing envelope: the rows plus the column layout clients render
/// headers from.
#[derive(serde::Serialize)]
struct UserListResponse {
    columns: Vec<ColumnDef>,
    #[serde(flatten)]
    page: PaginatedResponse<UserResponse>,
}

/// GET /api/users — paginated listing with search and whitelisted sort.
pub async fn list(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    user.require("admin.users")?;
    let conn = pool.get()?;
    let sort = SortSpec::from_params(query.sort.as_deref(), query.dir.as_deref());
    let page = user::find_paginated(
        &conn,
        query.page,
        query.per_page,
        query.search.as_deref(),
        &sort,
    )?;

    let items: Vec<UserResponse> = page.users.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(UserListResponse {
        columns: user::columns(),
        page: PaginatedResponse::new(items, page.total_count, page.page, page.per_page),
    }))
}

/// GET /api/users/{id}
pub async fn read(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    user.require("admin.users")?;
    let conn = pool.get()?;
    let display =
        user::find_display_by_id(&conn, path.into_inner())?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(UserResponse::from(display)))
}

fn validate_request(body: &UserRequest, password_required: bool) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if let Some(msg) = validate_username(&body.username) {
        errors.insert("username".to_string(), msg);
    }
    if body.display_name.trim().is_empty() {
        errors.insert("display_name".to_string(), "Display name is required".to_string());
    }
    if !body.email.trim().is_empty() {
        if let Some(msg) = validate_email(&body.email) {
            errors.insert("email".to_string(), msg);
        }
    }
    match &body.password {
        Some(p) => {
            if let Some(msg) = validate_password(p) {
                errors.insert("password".to_string(), msg);
            }
        }
        None if password_required => {
            errors.insert("password".to_string(), "Password is required".to_string());
        }
        None => {}
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// POST /api/users
pub async fn create(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    body: web::Json<UserRequest>,
) -> Result<HttpResponse, AppError> {
    user.require("admin.users")?;
    validate_request(&body, true)?;
    let conn = pool.get()?;

    let password = body.password.as_deref().unwrap_or_default();
    let hash = hash_password(password)?;
    let id = user::create(
        &conn,
        &NewUser {
            username: body.username.clone(),
            password: hash,
            email: body.email.clone(),
            display_name: body.display_name.clone(),
            role_id: body.role_id,
        },
    )
    .map_err(|e| map_unique_violation(e, "A user with this username already exists"))?;

    if let Err(e) = audit::log(
        &conn,
        user.user_id,
        "user.create",
        "user",
        id,
        serde_json::json!({ "username": body.username }),
    ) {
        log::warn!("Audit write failed for user.create: {e}");
    }

    let display = user::find_display_by_id(&conn, id)?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Created().json(UserResponse::from(display)))
}

/// PUT /api/users/{id} — password changes only when one is supplied.
pub async fn update(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i64>,
    body: web::Json<UserRequest>,
) -> Result<HttpResponse, AppError> {
    user.require("admin.users")?;
    validate_request(&body, false)?;
    let id = path.into_inner();
    let mut conn = pool.get()?;
    user::find_display_by_id(&conn, id)?.ok_or(AppError::NotFound)?;

    let hash = match body.password.as_deref() {
        Some(p) => Some(hash_password(p)?),
        None => None,
    };
    user::update(
        &mut conn,
        id,
        &body.username,
        hash.as_deref(),
        &body.email,
        &body.display_name,
        body.role_id,
        body.is_active,
    )
    .map_err(|e| map_unique_violation(e, "A user with this username already exists"))?;

    if let Err(e) = audit::log(
        &conn,
        user.user_id,
        "user.update",
        "user",
        id,
        serde_json::json!({ "username": body.username }),
    ) {
        log::warn!("Audit write failed for user.update: {e}");
    }

    let display = user::find_display_by_id(&conn, id)?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(UserResponse::from(display)))
}

/// DELETE /api/users/{id} — self-deletion is rejected.
pub async fn delete(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    user.require("admin.users")?;
    let id = path.into_inner();
    if id == user.user_id {
        return Err(AppError::Conflict("You cannot delete your own account".to_string()));
    }
    let conn = pool.get()?;
    user::find_display_by_id(&conn, id)?.ok_or(AppError::NotFound)?;
    user::delete(&conn, id)?;

    if let Err(e) = audit::log(
        &conn,
        user.user_id,
        "user.delete",
        "user",
        id,
        serde_json::Value::Null,
    ) {
        log::warn!("Audit write failed for user.delete: {e}");
    }
    Ok(HttpResponse::NoContent().finish())
}
