//! Server-rendered web UI and JSON API.
//!
//! Pages are gated by role through the extractors in [`auth`]; the handlers
//! call straight into [`crate::db::Database`].

pub mod api;
pub mod auth;
pub mod errors;
pub mod forms;
pub mod home;
pub mod render;
pub mod server;
pub mod tasks;
pub mod templates;

pub use server::{AppState, build_router, serve, start_server};
