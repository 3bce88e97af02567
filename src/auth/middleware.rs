use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web,
};

use crate::auth::session::CurrentUser;
use crate::auth::token;
use crate::db::DbPool;
use crate::errors::AppError;

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Look up the presented token. Ok(None) covers both "no token" and "token
/// not live"; pool or query failures become 500 responses, never a 401.
fn resolve_user(req: &ServiceRequest) -> Result<Option<CurrentUser>, HttpResponse> {
    use actix_web::ResponseError;

    let Some(token_value) = bearer_token(req) else {
        return Ok(None);
    };
    let Some(pool) = req.app_data::<web::Data<DbPool>>() else {
        log::error!("Auth middleware: database pool not registered");
        return Err(HttpResponse::InternalServerError()
            .json(serde_json::json!({ "error": "Internal server error" })));
    };
    let conn = pool.get().map_err(|e| AppError::Pool(e).error_response())?;
    token::authenticate(&conn, &token_value).map_err(|e| AppError::Db(e).error_response())
}

/// Resolves the bearer token to a CurrentUser and stores it in request
/// extensions. Requests without a live session get a 401.
pub async fn require_auth(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    match resolve_user(&req) {
        Ok(Some(user)) => {
            req.extensions_mut().insert(user);
            next.call(req).await.map(|res| res.map_into_left_body())
        }
        Ok(None) => {
            let body = serde_json::json!({ "error": "Authentication required" });
            let response = HttpResponse::Unauthorized().json(body);
            Ok(req.into_response(response).map_into_right_body())
        }
        Err(response) => Ok(req.into_response(response).map_into_right_body()),
    }
}

/// CSRF protection for REST mutation endpoints.
///
/// Rejects POST/PUT/DELETE requests that don't have Content-Type:
/// application/json. Browsers cannot send cross-origin JSON with credentials
/// via simple form POST, so the check acts as a CSRF guard without tokens.
/// GET requests are exempt.
pub async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method().clone();

    if method == actix_web::http::Method::POST
        || method == actix_web::http::Method::PUT
        || method == actix_web::http::Method::DELETE
    {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let body = serde_json::json!({
                "error": "Content-Type must be application/json for mutation requests"
            });
            let response = HttpResponse::BadRequest().json(body);
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}
