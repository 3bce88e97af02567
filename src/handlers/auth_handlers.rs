use actix_web::{HttpResponse, web};

use crate::audit;
use crate::auth::password::verify_password;
use crate::auth::session::CurrentUser;
use crate::auth::token;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::handlers::types::{CurrentUserResponse, LoginRequest, LoginResponse};
use crate::models::{setting, user};

/// POST /api/auth/login — the only unauthenticated endpoint. A bad username
/// and a bad password are indistinguishable in the response.
pub async fn login(
    pool: web::Data<DbPool>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;

    let Some(record) = user::find_by_username(&conn, body.username.trim())? else {
        return Err(AppError::Unauthorized);
    };
    let ok = verify_password(&body.password, &record.password)?;
    if !ok || !record.is_active {
        return Err(AppError::Unauthorized);
    }

    let ttl = setting::get_i64(&conn, "security", "session_timeout_minutes", 120);
    let token_value = token::issue(&conn, record.id, ttl)?;
    let current = token::authenticate(&conn, &token_value)?.ok_or(AppError::Unauthorized)?;

    if let Err(e) = audit::log(
        &conn,
        record.id,
        "login",
        "session",
        record.id,
        serde_json::json!({ "username": record.username }),
    ) {
        log::warn!("Audit write failed for login: {e}");
    }

    Ok(HttpResponse::Ok().json(LoginResponse {
        token: token_value,
        user: CurrentUserResponse {
            id: current.user_id,
            username: current.username,
            display_name: current.display_name,
            permissions: current.permissions.0,
        },
    }))
}

/// POST /api/auth/logout — revokes the presented token.
pub async fn logout(
    pool: web::Data<DbPool>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    token::revoke(&conn, &user.token)?;
    if let Err(e) = audit::log(
        &conn,
        user.user_id,
        "logout",
        "session",
        user.user_id,
        serde_json::Value::Null,
    ) {
        log::warn!("Audit write failed for logout: {e}");
    }
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/auth/me — the caller's own identity and permission codes.
pub async fn me(user: CurrentUser) -> HttpResponse {
    HttpResponse::Ok().json(CurrentUserResponse {
        id: user.user_id,
        username: user.username,
        display_name: user.display_name,
        permissions: user.permissions.0,
    })
}
