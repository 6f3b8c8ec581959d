//! HTTP server: shared state, router and lifecycle.

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{api, home, tasks};
use crate::config::Config;
use crate::db::Database;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Database>,
    /// Header carrying the authenticated user id.
    user_header: Arc<str>,
}

impl AppState {
    pub fn new(db: Arc<Database>, user_header: &str) -> Self {
        Self {
            db,
            user_header: Arc::from(user_header.to_ascii_lowercase()),
        }
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn user_header(&self) -> &str {
        &self.user_header
    }
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Dashboard
        .route("/", get(home::dashboard))
        // Admin task management
        .route("/tasks", get(tasks::list_tasks))
        .route(
            "/tasks/create",
            get(tasks::create_form).post(tasks::create_task),
        )
        .route("/tasks/edit/{id}", get(tasks::edit_form))
        .route("/tasks/edit", post(tasks::edit_task))
        .route("/tasks/delete/{id}", get(tasks::delete_confirm))
        .route("/tasks/delete", post(tasks::delete_task))
        .route("/tasks/report", get(home::report))
        .route("/users", get(home::users_page))
        // Assignee pages
        .route("/tasks/my-tasks", get(tasks::my_tasks))
        .route("/tasks/update/{id}", get(tasks::update_form))
        .route("/tasks/update", post(tasks::update_status))
        .route("/tasks/overview", get(home::overview))
        // API routes
        .route("/api/health", get(api::health))
        .route("/api/tasks", get(api::tasks))
        .route("/api/report", get(api::report))
        .route("/api/dashboard", get(api::dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn bind(config: &Config) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("Task manager listening on http://{}", listener.local_addr()?);
    Ok(listener)
}

/// Start the HTTP server in the background.
///
/// Returns a oneshot sender that can be used to signal shutdown,
/// and the actual address the server is bound to.
pub async fn start_server(
    db: Arc<Database>,
    config: &Config,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let app = build_router(AppState::new(db, &config.auth.user_header));
    let listener = bind(config).await?;
    let bound_addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Server shutting down");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}

/// Run the HTTP server until Ctrl-C.
pub async fn serve(db: Arc<Database>, config: &Config) -> anyhow::Result<()> {
    let app = build_router(AppState::new(db, &config.auth.user_header));
    let listener = bind(config).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Server shutting down");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_name_is_normalised() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let state = AppState::new(db, "X-Remote-User");
        assert_eq!(state.user_header(), "x-remote-user");
    }

    #[tokio::test]
    async fn start_and_stop() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let mut config = Config::default();
        config.server.port = 0;
        let (shutdown, addr) = start_server(db, &config).await.unwrap();
        assert_ne!(addr.port(), 0);
        shutdown.send(()).unwrap();
    }
}
