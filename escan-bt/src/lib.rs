//! escan-bt library - Batch Tracker module
//!
//! Tracks envelope-scanning batches: opens a batch against a fixed scanner
//! configuration, computes per-item verdicts when the batch is finished,
//! and serves listing, detail, import, and export endpoints.

use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod lifecycle;
pub mod sheet;
pub mod verdict;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/batch/start", post(api::start_batch))
        .route("/api/batch/:id/finish", post(api::finish_batch))
        .route("/api/batch/:id", get(api::get_batch_detail))
        .route("/api/batch/:id/export", get(api::export_batch))
        .route("/api/batches", get(api::list_batches))
        .route("/api/import", post(api::import_sheet))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
