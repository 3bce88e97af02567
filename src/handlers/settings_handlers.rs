use actix_web::{HttpResponse, web};
use serde_json::{Map, Value};

use crate::audit;
use crate::auth::session::CurrentUser;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::setting;

/// GET /api/settings — every section as a nested JSON object with typed
/// values.
pub async fn list(pool: web::Data<DbPool>, user: CurrentUser) -> Result<HttpResponse, AppError> {
    user.require("admin.settings")?;
    let conn = pool.get()?;

    let mut sections = Map::new();
    for name in setting::SECTIONS {
        let entries = setting::find_section(&conn, name)?;
        sections.insert(
            name.to_string(),
            Value::Object(setting::section_object(&entries)),
        );
    }
    Ok(HttpResponse::Ok().json(Value::Object(sections)))
}

/// GET /api/settings/{section}
pub async fn section(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    user.require("admin.settings")?;
    let name = path.into_inner();
    if !setting::SECTIONS.contains(&name.as_str()) {
        return Err(AppError::NotFound);
    }
    let conn = pool.get()?;
    let entries = setting::find_section(&conn, &name)?;
    Ok(HttpResponse::Ok().json(Value::Object(setting::section_object(&entries))))
}

/// PUT /api/settings/{section} — partial update: only submitted keys change,
/// and nothing changes unless every submitted key validates.
pub async fn save(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<String>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, AppError> {
    user.require("admin.settings")?;
    let name = path.into_inner();
    let mut conn = pool.get()?;
    let changed = setting::update_section(&mut conn, &name, &body)?;

    if let Err(e) = audit::log(
        &conn,
        user.user_id,
        "settings.update",
        "settings",
        0,
        serde_json::json!({ "section": name, "keys": changed }),
    ) {
        log::warn!("Audit write failed for settings.update: {e}");
    }

    let entries = setting::find_section(&conn, &name)?;
    Ok(HttpResponse::Ok().json(Value::Object(setting::section_object(&entries))))
}
