use crate::models::table::{Align, ColumnDef};

/// Column layout of the users listing. Sort keys are the inputs the query
/// layer's whitelist accepts; clients render headers from this instead of
/// hardcoding them.
pub fn columns() -> Vec<ColumnDef> {
    fn col(key: &str, label: &str) -> ColumnDef {
        ColumnDef {
            key: key.to_string(),
            label: label.to_string(),
            sortable: true,
            sort_key: key.to_string(),
            width: None,
            align: Align::Left,
        }
    }
    vec![
        col("username", "Username"),
        col("display_name", "Display name"),
        col("email", "Email"),
        col("role", "Role"),
        ColumnDef {
            key: "is_active".to_string(),
            label: "Active".to_string(),
            sortable: false,
            sort_key: String::new(),
            width: Some("6rem".to_string()),
            align: Align::Center,
        },
        col("created_at", "Created"),
    ]
}

/// Internal user struct for authentication — includes the password hash.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub email: String,
    pub display_name: String,
    pub role_id: Option<i64>,
    pub is_active: bool,
}

/// Safe read model — no password hash, role info joined in.
#[derive(Debug, Clone)]
pub struct UserDisplay {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub role_id: Option<i64>,
    pub role_name: String,
    pub role_display_name: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// One page of the users listing.
pub struct UserPage {
    pub users: Vec<UserDisplay>,
    pub page: i64,
    pub per_page: i64,
    pub total_count: i64,
    pub total_pages: i64,
}

/// Write model for user creation.
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub display_name: String,
    pub role_id: Option<i64>,
}
