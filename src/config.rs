use std::env;

/// Runtime configuration, read once at startup from the environment
/// (a .env file is loaded first when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: String,
    /// Directory for runtime data; backups land in a `backups/` subdirectory.
    pub data_dir: String,
    /// Initial admin password, used only when seeding a fresh database.
    pub admin_password: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        AppConfig {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "resortadm.db".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| ".".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "change-me-now".to_string()),
        }
    }
}
