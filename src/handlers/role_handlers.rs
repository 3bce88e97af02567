use std::collections::BTreeSet;

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::audit;
use crate::auth::session::CurrentUser;
use crate::auth::validate::{validate_optional, validate_slug};
use crate::db::DbPool;
use crate::errors::{AppError, map_unique_violation};
use crate::handlers::types::BulkDeleteRequest;
use crate::models::matrix::{MatrixView, filter_permissions};
use crate::models::permission;
use crate::models::role::{self, RoleFilter, RolePayload, UserCountFilter, form::RoleForm};

#[derive(Debug, Deserialize)]
pub struct RoleListQuery {
    #[serde(default)]
    pub search: Option<String>,
    /// Permission group key filter.
    #[serde(default)]
    pub permission_type: Option<String>,
    /// "none" or "some"; anything else is ignored.
    #[serde(default)]
    pub user_count: Option<String>,
}

/// GET /api/roles
pub async fn list(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    query: web::Query<RoleListQuery>,
) -> Result<HttpResponse, AppError> {
    user.require("admin.roles")?;
    let conn = pool.get()?;
    let filter = RoleFilter {
        search: query.search.clone(),
        permission_type: query.permission_type.clone(),
        user_count: query.user_count.as_deref().and_then(UserCountFilter::parse),
    };
    Ok(HttpResponse::Ok().json(role::find_all(&conn, &filter)?))
}

/// GET /api/roles/{id}
pub async fn read(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    user.require("admin.roles")?;
    let conn = pool.get()?;
    let role = role::find_by_id(&conn, path.into_inner())?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(role))
}

/// Server-side re-validation of a submitted role payload, mirroring what the
/// edit form enforces plus the slug format and the subset-of-universe check
/// only the database can answer.
fn validate_payload(
    conn: &rusqlite::Connection,
    payload: &RolePayload,
) -> Result<(), AppError> {
    let mut form = RoleForm::from_payload(payload);
    let mut ok = form.validate();
    let mut errors = form.errors().clone();

    if !errors.contains_key("name") {
        if let Some(msg) = validate_slug(&payload.name) {
            errors.insert("name".to_string(), msg);
            ok = false;
        }
    }
    if let Some(msg) = validate_optional(&payload.description, "Description", 500) {
        errors.insert("description".to_string(), msg);
        ok = false;
    }
    if !errors.contains_key("permissions") && !permission::all_ids_exist(conn, &payload.permissions)? {
        errors.insert(
            "permissions".to_string(),
            "Unknown permission id in selection".to_string(),
        );
        ok = false;
    }

    if ok { Ok(()) } else { Err(AppError::Validation(errors)) }
}

/// POST /api/roles
pub async fn create(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    body: web::Json<RolePayload>,
) -> Result<HttpResponse, AppError> {
    user.require("admin.roles")?;
    let mut conn = pool.get()?;
    validate_payload(&conn, &body)?;

    let id = role::create(&mut conn, &body)
        .map_err(|e| map_unique_violation(e, "A role with this name already exists"))?;

    if let Err(e) = audit::log(
        &conn,
        user.user_id,
        "role.create",
        "role",
        id,
        serde_json::json!({ "name": body.name, "permissions": body.permissions.len() }),
    ) {
        log::warn!("Audit write failed for role.create: {e}");
    }

    let role = role::find_by_id(&conn, id)?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Created().json(role))
}

/// PUT /api/roles/{id} — full replacement, last submit wins.
pub async fn update(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i64>,
    body: web::Json<RolePayload>,
) -> Result<HttpResponse, AppError> {
    user.require("admin.roles")?;
    let id = path.into_inner();
    let mut conn = pool.get()?;

    let existing = role::find_by_id(&conn, id)?.ok_or(AppError::NotFound)?;
    if existing.is_system_role {
        return Err(AppError::Conflict(format!(
            "System role '{}' cannot be modified",
            existing.display_name
        )));
    }
    validate_payload(&conn, &body)?;

    role::update(&mut conn, id, &body)
        .map_err(|e| map_unique_violation(e, "A role with this name already exists"))?;

    if let Err(e) = audit::log(
        &conn,
        user.user_id,
        "role.update",
        "role",
        id,
        serde_json::json!({ "name": body.name, "permissions": body.permissions.len() }),
    ) {
        log::warn!("Audit write failed for role.update: {e}");
    }

    let role = role::find_by_id(&conn, id)?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(role))
}

/// DELETE /api/roles/{id}
pub async fn delete(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    user.require("admin.roles")?;
    let id = path.into_inner();
    let conn = pool.get()?;
    role::delete_checked(&conn, id)?;

    if let Err(e) = audit::log(
        &conn,
        user.user_id,
        "role.delete",
        "role",
        id,
        serde_json::Value::Null,
    ) {
        log::warn!("Audit write failed for role.delete: {e}");
    }
    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /api/roles/bulk — all-or-nothing batch delete.
pub async fn bulk_delete(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    body: web::Json<BulkDeleteRequest>,
) -> Result<HttpResponse, AppError> {
    user.require("admin.roles")?;
    let mut conn = pool.get()?;
    let deleted = role::bulk_delete(&mut conn, &body.role_ids)?;

    if let Err(e) = audit::log(
        &conn,
        user.user_id,
        "role.bulk_delete",
        "role",
        0,
        serde_json::json!({ "role_ids": body.role_ids }),
    ) {
        log::warn!("Audit write failed for role.bulk_delete: {e}");
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": deleted })))
}

/// POST /api/roles/{id}/duplicate
pub async fn duplicate(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    user.require("admin.roles")?;
    let mut conn = pool.get()?;
    let new_id = role::duplicate(&mut conn, path.into_inner())?;

    if let Err(e) = audit::log(
        &conn,
        user.user_id,
        "role.duplicate",
        "role",
        new_id,
        serde_json::Value::Null,
    ) {
        log::warn!("Audit write failed for role.duplicate: {e}");
    }

    let role = role::find_by_id(&conn, new_id)?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Created().json(role))
}

#[derive(Debug, Deserialize)]
pub struct MatrixQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub group: Option<String>,
}

/// GET /api/roles/{id}/matrix — the permission matrix for a role, narrowed by
/// search text and optional group. A group narrow renders flat; "all groups"
/// renders grouped with header checkbox states.
pub async fn matrix(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i64>,
    query: web::Query<MatrixQuery>,
) -> Result<HttpResponse, AppError> {
    user.require("admin.roles")?;
    let conn = pool.get()?;
    let role = role::find_by_id(&conn, path.into_inner())?.ok_or(AppError::NotFound)?;

    if let Some(group) = query.group.as_deref() {
        if !permission::group_exists(&conn, group)? {
            return Err(AppError::NotFound);
        }
    }

    let universe = permission::find_all(&conn)?;
    let groups = permission::find_groups(&conn)?;
    let selected: BTreeSet<i64> = role.permissions.iter().map(|p| p.id).collect();
    let filtered = filter_permissions(&universe, &query.search, query.group.as_deref());

    let view = MatrixView::build(&filtered, &groups, &selected, query.group.is_none());
    Ok(HttpResponse::Ok().json(view))
}
