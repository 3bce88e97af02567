pub mod audit_handlers;
pub mod auth_handlers;
pub mod backup_handlers;
pub mod dashboard_handlers;
pub mod permission_handlers;
pub mod role_handlers;
pub mod settings_handlers;
pub mod types;
pub mod user_handlers;

use actix_web::web;

use crate::auth::middleware::{require_auth, require_json_content_type};

/// Mount the /api surface: login is public, everything else sits behind the
/// bearer-token middleware and the JSON content-type mutation guard.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .route("/auth/login", web::post().to(auth_handlers::login))
            .service(
                web::scope("")
                    .wrap(actix_web::middleware::from_fn(require_auth))
                    .route("/auth/logout", web::post().to(auth_handlers::logout))
                    .route("/auth/me", web::get().to(auth_handlers::me))
                    .route("/permissions", web::get().to(permission_handlers::list))
                    .route(
                        "/permissions/groups",
                        web::get().to(permission_handlers::groups),
                    )
                    // /roles/bulk is registered before /roles/{id} so the
                    // literal segment wins over the path parameter.
                    .route("/roles", web::get().to(role_handlers::list))
                    .route("/roles", web::post().to(role_handlers::create))
                    .route("/roles/bulk", web::delete().to(role_handlers::bulk_delete))
                    .route("/roles/{id}", web::get().to(role_handlers::read))
                    .route("/roles/{id}", web::put().to(role_handlers::update))
                    .route("/roles/{id}", web::delete().to(role_handlers::delete))
                    .route(
                        "/roles/{id}/duplicate",
                        web::post().to(role_handlers::duplicate),
                    )
                    .route("/roles/{id}/matrix", web::get().to(role_handlers::matrix))
                    .route("/users", web::get().to(user_handlers::list))
                    .route("/users", web::post().to(user_handlers::create))
                    .route("/users/{id}", web::get().to(user_handlers::read))
                    .route("/users/{id}", web::put().to(user_handlers::update))
                    .route("/users/{id}", web::delete().to(user_handlers::delete))
                    .route("/settings", web::get().to(settings_handlers::list))
                    .route(
                        "/settings/{section}",
                        web::get().to(settings_handlers::section),
                    )
                    .route(
                        "/settings/{section}",
                        web::put().to(settings_handlers::save),
                    )
                    .route(
                        "/dashboard/summary",
                        web::get().to(dashboard_handlers::summary),
                    )
                    .route("/backups", web::get().to(backup_handlers::list))
                    .route("/backups", web::post().to(backup_handlers::run))
                    .route("/audit", web::get().to(audit_handlers::list)),
            ),
    );
}
