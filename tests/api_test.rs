use actix_web::{App, test, web};
use serde_json::{Value, json};
use tempfile::TempDir;

use resortadm::auth::password::hash_password;
use resortadm::config::AppConfig;
use resortadm::db::{self, DbPool};
use resortadm::handlers;

const ADMIN_PASSWORD: &str = "admin-pass-123";

fn test_pool(dir: &TempDir) -> DbPool {
    let db_path = dir.path().join("app.db");
    let pool = db::init_pool(db_path.to_str().unwrap());
    db::run_migrations(&pool);
    let conn = pool.get().unwrap();
    let hash = hash_password(ADMIN_PASSWORD).unwrap();
    db::seed_defaults(&conn, &hash).unwrap();
    pool
}

macro_rules! test_app {
    ($pool:expr, $dir:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(AppConfig {
                    bind_addr: String::new(),
                    database_url: String::new(),
                    data_dir: $dir.path().to_string_lossy().to_string(),
                    admin_password: ADMIN_PASSWORD.to_string(),
                }))
                .configure(handlers::configure),
        )
        .await
    };
}

macro_rules! login {
    ($app:expr, $username:expr, $password:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "username": $username, "password": $password }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        body["token"].as_str().expect("login token").to_string()
    }};
}

#[actix_rt::test]
async fn login_rejects_bad_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let pool = test_pool(&dir);
    let app = test_app!(pool, dir);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "admin", "password": "wrong" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 401);

    // An unknown username is indistinguishable from a bad password.
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "ghost", "password": "wrong" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 401);
}

#[actix_rt::test]
async fn protected_endpoints_require_a_token() {
    let dir = tempfile::tempdir().unwrap();
    let pool = test_pool(&dir);
    let app = test_app!(pool, dir);

    let req = test::TestRequest::get().uri("/api/roles").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 401);
}

#[actix_rt::test]
async fn auth_backend_failure_is_not_reported_as_unauthorized() {
    // No database pool registered: a presented token cannot be checked, and
    // that is a server error, not a rejected credential.
    let app = test::init_service(App::new().configure(handlers::configure)).await;

    let req = test::TestRequest::get()
        .uri("/api/roles")
        .insert_header(("authorization", "Bearer sometoken"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 500);

    // A request with no token at all is still a plain 401.
    let req = test::TestRequest::get().uri("/api/roles").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 401);
}

#[actix_rt::test]
async fn mutations_require_json_content_type() {
    let dir = tempfile::tempdir().unwrap();
    let pool = test_pool(&dir);
    let app = test_app!(pool, dir);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header(("content-type", "text/plain"))
        .set_payload("username=admin")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 400);
}

#[actix_rt::test]
async fn login_me_logout_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let pool = test_pool(&dir);
    let app = test_app!(pool, dir);

    let token = login!(app, "admin", ADMIN_PASSWORD);

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(("authorization", format!("Bearer {token}")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["username"], "admin");
    assert!(body["permissions"].as_array().unwrap().iter().any(|p| p == "admin.roles"));

    let req = test::TestRequest::post()
        .uri("/api/auth/logout")
        .insert_header(("authorization", format!("Bearer {token}")))
        .insert_header(("content-type", "application/json"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 204);

    // The revoked token no longer authenticates.
    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(("authorization", format!("Bearer {token}")))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 401);
}

#[actix_rt::test]
async fn role_crud_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let pool = test_pool(&dir);
    let app = test_app!(pool, dir);
    let token = login!(app, "admin", ADMIN_PASSWORD);
    let auth = ("authorization", format!("Bearer {token}"));

    // An empty selection fails validation with a field-keyed error.
    let req = test::TestRequest::post()
        .uri("/api/roles")
        .insert_header(auth.clone())
        .set_json(json!({ "name": "spa_staff", "display_name": "Spa Staff", "permissions": [] }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 400);
    let body: Value = test::read_body_json(res).await;
    assert!(body["fields"]["permissions"].is_string());

    // Create with a real permission id.
    let req = test::TestRequest::get()
        .uri("/api/permissions")
        .insert_header(auth.clone())
        .to_request();
    let perms: Value = test::call_and_read_body_json(&app, req).await;
    let first_id = perms[0]["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/roles")
        .insert_header(auth.clone())
        .set_json(json!({ "name": "spa_staff", "display_name": "Spa Staff", "permissions": [first_id] }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 201);
    let created: Value = test::read_body_json(res).await;
    let role_id = created["id"].as_i64().unwrap();

    // Same name again conflicts.
    let req = test::TestRequest::post()
        .uri("/api/roles")
        .insert_header(auth.clone())
        .set_json(json!({ "name": "spa_staff", "display_name": "Again", "permissions": [first_id] }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 409);

    // Grouped matrix for the new role.
    let req = test::TestRequest::get()
        .uri(&format!("/api/roles/{role_id}/matrix"))
        .insert_header(auth.clone())
        .to_request();
    let matrix: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(matrix["mode"], "grouped");

    // Narrowing to one group renders flat.
    let req = test::TestRequest::get()
        .uri(&format!("/api/roles/{role_id}/matrix?group=billing"))
        .insert_header(auth.clone())
        .to_request();
    let matrix: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(matrix["mode"], "flat");
    assert_eq!(matrix["rows"].as_array().unwrap().len(), 3);

    // Delete, then reads 404.
    let req = test::TestRequest::delete()
        .uri(&format!("/api/roles/{role_id}"))
        .insert_header(auth.clone())
        .insert_header(("content-type", "application/json"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 204);

    let req = test::TestRequest::get()
        .uri(&format!("/api/roles/{role_id}"))
        .insert_header(auth.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 404);
}

#[actix_rt::test]
async fn users_listing_carries_the_column_layout() {
    let dir = tempfile::tempdir().unwrap();
    let pool = test_pool(&dir);
    let app = test_app!(pool, dir);
    let token = login!(app, "admin", ADMIN_PASSWORD);

    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(("authorization", format!("Bearer {token}")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    let columns = body["columns"].as_array().unwrap();
    let username = columns.iter().find(|c| c["key"] == "username").unwrap();
    assert_eq!(username["sortable"], true);
    assert_eq!(username["sort_key"], "username");
    // Non-sortable columns are declared too, with layout hints.
    let active = columns.iter().find(|c| c["key"] == "is_active").unwrap();
    assert_eq!(active["sortable"], false);
    assert_eq!(active["align"], "center");
}

#[actix_rt::test]
async fn missing_permission_is_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    let pool = test_pool(&dir);
    let app = test_app!(pool, dir);
    let admin_token = login!(app, "admin", ADMIN_PASSWORD);

    // Create a front-desk user via the API, then act as them.
    let conn = pool.get().unwrap();
    let front_desk: i64 = conn
        .query_row("SELECT id FROM roles WHERE name = 'front_desk'", [], |r| r.get(0))
        .unwrap();
    drop(conn);

    let req = test::TestRequest::post()
        .uri("/api/users")
        .insert_header(("authorization", format!("Bearer {admin_token}")))
        .set_json(json!({
            "username": "reception",
            "display_name": "Reception",
            "email": "reception@resort.test",
            "role_id": front_desk,
            "password": "front-desk-pass"
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 201);

    let staff_token = login!(app, "reception", "front-desk-pass");
    let req = test::TestRequest::get()
        .uri("/api/roles")
        .insert_header(("authorization", format!("Bearer {staff_token}")))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 403);
}

#[actix_rt::test]
async fn settings_and_backups_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let pool = test_pool(&dir);
    let app = test_app!(pool, dir);
    let token = login!(app, "admin", ADMIN_PASSWORD);
    let auth = ("authorization", format!("Bearer {token}"));

    let req = test::TestRequest::put()
        .uri("/api/settings/general")
        .insert_header(auth.clone())
        .set_json(json!({ "resort_name": "Cliffside Resort" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["resort_name"], "Cliffside Resort");
    // Untouched keys survive a partial update.
    assert_eq!(body["currency"], "EUR");

    let req = test::TestRequest::post()
        .uri("/api/backups")
        .insert_header(auth.clone())
        .insert_header(("content-type", "application/json"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 201);
    let record: Value = test::read_body_json(res).await;
    assert_eq!(record["status"], "completed");

    // Manual backup and settings change both land in the audit trail.
    let req = test::TestRequest::get()
        .uri("/api/audit")
        .insert_header(auth.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let actions: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert!(actions.contains(&"backup.run"));
    assert!(actions.contains(&"settings.update"));
}
