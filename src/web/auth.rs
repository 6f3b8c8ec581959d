//! Identity extractors.
//!
//! The upstream identity service authenticates the caller and forwards their user
//! id in the configured header. These extractors resolve it against the user
//! directory and enforce the role before the handler body runs.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use super::errors::ApiError;
use super::server::AppState;
use crate::error::AppError;
use crate::types::{Role, User};

/// Any authenticated user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// An authenticated user holding the Admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

/// An authenticated user holding the User role.
#[derive(Debug, Clone)]
pub struct MemberUser(pub User);

fn reject(parts: &Parts, err: AppError) -> Response {
    if parts.uri.path().starts_with("/api/") {
        ApiError(err).into_response()
    } else {
        err.into_response()
    }
}

fn resolve(parts: &Parts, state: &AppState) -> Result<User, AppError> {
    let user_id = parts
        .headers
        .get(state.user_header())
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(AppError::unauthenticated)?;

    match state.db().get_user(user_id)? {
        Some(user) => Ok(user),
        None => {
            warn!(user_id = %user_id, "Identity header names an unknown user");
            Err(AppError::unauthenticated())
        }
    }
}

fn require_role(user: User, role: Role) -> Result<User, AppError> {
    if user.role == role {
        Ok(user)
    } else {
        warn!(user_id = %user.id, required = %role, "Role check failed");
        Err(AppError::forbidden(role))
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .map(CurrentUser)
            .map_err(|e| reject(parts, e))
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .and_then(|user| require_role(user, Role::Admin))
            .map(AdminUser)
            .map_err(|e| reject(parts, e))
    }
}

impl FromRequestParts<AppState> for MemberUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .and_then(|user| require_role(user, Role::User))
            .map(MemberUser)
            .map_err(|e| reject(parts, e))
    }
}
