use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Field-keyed validation errors, ordered for stable output.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug)]
pub enum AppError {
    Db(rusqlite::Error),
    Pool(r2d2::Error),
    Hash(String),
    Unauthorized,
    PermissionDenied(String),
    NotFound,
    Conflict(String),
    Validation(FieldErrors),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Pool(e) => write!(f, "Pool error: {e}"),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::Unauthorized => write!(f, "Authentication required"),
            AppError::PermissionDenied(code) => write!(f, "Permission denied: {code}"),
            AppError::NotFound => write!(f, "Not found"),
            AppError::Conflict(msg) => write!(f, "{msg}"),
            AppError::Validation(_) => write!(f, "Validation failed"),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a FieldErrors>,
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound => HttpResponse::NotFound().json(ErrorBody {
                error: "Not found".to_string(),
                details: None,
                fields: None,
            }),
            AppError::Unauthorized => HttpResponse::Unauthorized().json(ErrorBody {
                error: "Authentication required".to_string(),
                details: None,
                fields: None,
            }),
            AppError::PermissionDenied(code) => HttpResponse::Forbidden().json(ErrorBody {
                error: "Permission denied".to_string(),
                details: Some(code.clone()),
                fields: None,
            }),
            AppError::Conflict(msg) => HttpResponse::Conflict().json(ErrorBody {
                error: msg.clone(),
                details: None,
                fields: None,
            }),
            AppError::Validation(fields) => HttpResponse::BadRequest().json(ErrorBody {
                error: "Validation failed".to_string(),
                details: None,
                fields: Some(fields),
            }),
            _ => {
                log::error!("{self}");
                HttpResponse::InternalServerError().json(ErrorBody {
                    error: "Internal server error".to_string(),
                    details: None,
                    fields: None,
                })
            }
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Db(e)
    }
}

impl From<r2d2::Error> for AppError {
    fn from(e: r2d2::Error) -> Self {
        AppError::Pool(e)
    }
}

/// Map a failed INSERT/UPDATE on a uniquely-named entity to a 409 with a
/// user-facing message, leaving other DB errors as 500s.
pub fn map_unique_violation(e: rusqlite::Error, message: &str) -> AppError {
    if e.to_string().contains("UNIQUE") {
        AppError::Conflict(message.to_string())
    } else {
        AppError::Db(e)
    }
}
