use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use std::future::{Ready, ready};

use crate::errors::AppError;

/// Wrapper around permission codes with a `has()` membership check.
#[derive(Debug, Clone, Default)]
pub struct Permissions(pub Vec<String>);

impl Permissions {
    pub fn has(&self, code: &str) -> bool {
        self.0.iter().any(|p| p == code)
    }
}

/// The authenticated caller, resolved from the bearer token by the auth
/// middleware and stored in request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: i64,
    pub username: String,
    pub display_name: String,
    pub permissions: Permissions,
    pub token: String,
}

impl CurrentUser {
    /// Check a permission code; returns Err for a 403 response if missing.
    pub fn require(&self, code: &str) -> Result<(), AppError> {
        if self.permissions.has(code) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(code.to_string()))
        }
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, AppError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CurrentUser>()
                .cloned()
                .ok_or(AppError::Unauthorized),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(codes: &[&str]) -> CurrentUser {
        CurrentUser {
            user_id: 1,
            username: "alice".to_string(),
            display_name: "Alice".to_string(),
            permissions: Permissions(codes.iter().map(|s| s.to_string()).collect()),
            token: "t".to_string(),
        }
    }

    #[test]
    fn require_passes_with_code() {
        let user = user_with(&["admin.roles", "admin.users"]);
        assert!(user.require("admin.roles").is_ok());
    }

    #[test]
    fn require_denies_missing_code() {
        let user = user_with(&["reservations.view"]);
        match user.require("admin.roles") {
            Err(AppError::PermissionDenied(code)) => assert_eq!(code, "admin.roles"),
            other => panic!("expected PermissionDenied, got {other:?}"),
        }
    }
}
