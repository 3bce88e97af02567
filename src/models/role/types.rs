use serde::{Deserialize, Serialize};

use crate::models::permission::Permission;

/// Row for the roles list page: counts are informational display data.
#[derive(Debug, Clone, Serialize)]
pub struct RoleListItem {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub is_system_role: bool,
    pub users_count: i64,
    pub permissions_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Full read model: permissions are referenced as whole objects.
#[derive(Debug, Clone, Serialize)]
pub struct RoleDetail {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub is_system_role: bool,
    pub users_count: i64,
    pub permissions: Vec<Permission>,
    pub created_at: String,
    pub updated_at: String,
}

/// Write model: permissions are referenced by id list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePayload {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub permissions: Vec<i64>,
}

impl RoleDetail {
    /// The edit-form seed: resubmitting this unchanged must produce an update
    /// payload identical to the stored role.
    pub fn to_payload(&self) -> RolePayload {
        let mut ids: Vec<i64> = self.permissions.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        RolePayload {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            permissions: ids,
        }
    }
}

/// How many users a role must have to match a `user_count` list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCountFilter {
    None,
    Some,
}

impl UserCountFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(UserCountFilter::None),
            "some" => Some(UserCountFilter::Some),
            _ => None,
        }
    }
}

/// Query filters for the roles list endpoint.
#[derive(Debug, Clone, Default)]
pub struct RoleFilter {
    pub search: Option<String>,
    /// Permission group key: keep roles holding at least one permission in
    /// the group.
    pub permission_type: Option<String>,
    pub user_count: Option<UserCountFilter>,
}
