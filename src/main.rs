use actix_web::{App, HttpServer, middleware::Logger, web};

use resortadm::auth::password::hash_password;
use resortadm::config::AppConfig;
use resortadm::db;
use resortadm::handlers;
use resortadm::maintenance;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env();
    let pool = db::init_pool(&config.database_url);
    db::run_migrations(&pool);

    {
        let conn = pool.get().expect("Failed to get DB connection for seeding");
        let hash = hash_password(&config.admin_password).expect("Failed to hash admin password");
        db::seed_defaults(&conn, &hash).expect("Failed to seed defaults");
    }

    maintenance::spawn_scheduler(pool.clone(), config.data_dir.clone());

    log::info!("Starting server on {}", config.bind_addr);
    let bind_addr = config.bind_addr.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config.clone()))
            .configure(handlers::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
