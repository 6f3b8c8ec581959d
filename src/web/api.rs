//! JSON endpoints.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;

use super::auth::{AdminUser, CurrentUser};
use super::errors::ApiError;
use super::forms::{ListParams, ReportParams};
use super::server::AppState;
use crate::db::dashboard::HomeDashboard;
use crate::db::listing::TaskListing;
use crate::db::report::TaskReport;
use crate::db::today_local;

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// `GET /api/health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /api/tasks` - same filters as the list page.
pub async fn tasks(
    State(state): State<AppState>,
    AdminUser(_user): AdminUser,
    Query(params): Query<ListParams>,
) -> Result<Json<TaskListing>, ApiError> {
    let listing = state.db().query_tasks(&params.filter(), today_local())?;
    Ok(Json(listing))
}

/// `GET /api/report`
pub async fn report(
    State(state): State<AppState>,
    AdminUser(_user): AdminUser,
    Query(params): Query<ReportParams>,
) -> Result<Json<TaskReport>, ApiError> {
    let query = params.query()?;
    let report = state.db().task_report(&query, today_local())?;
    Ok(Json(report))
}

/// `GET /api/dashboard` - the caller's role decides the shape.
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<HomeDashboard>, ApiError> {
    let dashboard = state.db().home_dashboard(&user, today_local())?;
    Ok(Json(dashboard))
}
