//! HTTP rendering of [`AppError`].
//!
//! Page routes get the HTML error page; `/api` routes wrap the error in
//! [`ApiError`] and get a JSON body.

use axum::Json;
use axum::response::{Html, IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use super::render;
use crate::error::AppError;

fn log_error(err: &AppError) {
    let status = err.status();
    if status.is_server_error() {
        error!(code = ?err.code, status = status.as_u16(), "Request failed: {}", err.message);
    } else {
        warn!(code = ?err.code, status = status.as_u16(), "Request rejected: {}", err.message);
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        log_error(&self);
        (self.status(), Html(render::error_page(&self))).into_response()
    }
}

/// JSON error for API routes.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError(AppError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log_error(&self.0);
        (self.0.status(), Json(json!({ "error": self.0 }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn html_error_keeps_status() {
        let response = AppError::task_not_found(3).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let content_type = response.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
    }

    #[test]
    fn api_error_is_json() {
        let response = ApiError(AppError::unauthenticated()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let content_type = response.headers()["content-type"].to_str().unwrap();
        assert_eq!(content_type, "application/json");
    }
}
