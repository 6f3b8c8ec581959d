//! Structured error types shared by the data layer and the HTTP handlers.

use axum::http::StatusCode;
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,

    // Access errors
    Unauthenticated,
    Forbidden,
    NotOwner,

    // Not found errors
    TaskNotFound,
    UserNotFound,

    // Conflict errors
    AlreadyExists,

    // Internal errors
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    /// HTTP status this code is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::MissingRequiredField | ErrorCode::InvalidFieldValue => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden | ErrorCode::NotOwner => StatusCode::FORBIDDEN,
            ErrorCode::TaskNotFound | ErrorCode::UserNotFound => StatusCode::NOT_FOUND,
            ErrorCode::AlreadyExists => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ErrorCode::MissingRequiredField | ErrorCode::InvalidFieldValue
        )
    }
}

/// Structured application error.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    // Convenience constructors

    pub fn missing_field(field: &str, message: &str) -> Self {
        Self::new(ErrorCode::MissingRequiredField, message).with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn unauthenticated() -> Self {
        Self::new(ErrorCode::Unauthenticated, "Authentication required")
    }

    pub fn forbidden(role: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::Forbidden,
            format!("This page requires the {} role", role),
        )
    }

    pub fn not_owner(task_id: i64, user_id: &str) -> Self {
        Self::new(
            ErrorCode::NotOwner,
            format!("Task {} is not assigned to user {}", task_id, user_id),
        )
    }

    pub fn task_not_found(task_id: i64) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {}", task_id),
        )
    }

    pub fn user_not_found(user_id: &str) -> Self {
        Self::new(
            ErrorCode::UserNotFound,
            format!("User not found: {}", user_id),
        )
    }

    pub fn already_exists(what: &str, key: &str) -> Self {
        Self::new(
            ErrorCode::AlreadyExists,
            format!("{} already exists: {}", what, key),
        )
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

// Data-layer functions return anyhow; recover the structured error when there is one.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app_err) => app_err,
            Err(err) => match err.downcast::<rusqlite::Error>() {
                Ok(db_err) => AppError::database(db_err),
                Err(err) => AppError::internal(err),
            },
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::database(err)
    }
}

/// Result type for handler-level operations.
pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_http_status() {
        assert_eq!(
            AppError::missing_field("title", "Task name is required").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::unauthenticated().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden("Admin").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_owner(1, "u").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::task_not_found(7).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::already_exists("User", "a@b.c").status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::internal("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn anyhow_round_trip_keeps_structure() {
        let err: anyhow::Error = AppError::task_not_found(42).into();
        let back = AppError::from(err);
        assert_eq!(back.code, ErrorCode::TaskNotFound);
        assert_eq!(back.message, "Task not found: 42");
    }

    #[test]
    fn unknown_errors_become_internal() {
        let back = AppError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(back.code, ErrorCode::InternalError);
    }

    #[test]
    fn serializes_screaming_snake_codes() {
        let json = serde_json::to_value(AppError::missing_field("title", "required")).unwrap();
        assert_eq!(json["code"], "MISSING_REQUIRED_FIELD");
        assert_eq!(json["field"], "title");
        let json = serde_json::to_value(AppError::task_not_found(1)).unwrap();
        assert!(json.get("field").is_none());
    }
}
