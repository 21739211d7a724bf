//! xtream-dl Backend Library
//!
//! Browses an Xtream Codes provider, keeps JSON snapshots of its movie and
//! series listings, and queues downloads on an aria2 daemon.
//! This library exposes modules for use in integration tests.

use axum::{
    http::{header, Method},
    extract::State,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod static_files;

use services::{Catalog, DownloadDispatcher};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub downloads: Arc<DownloadDispatcher>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(catalog: Catalog, downloads: DownloadDispatcher) -> Self {
        Self {
            catalog: Arc::new(catalog),
            downloads: Arc::new(downloads),
            start_time: std::time::Instant::now(),
        }
    }
}

#[derive(Serialize)]
pub struct ApiResponse {
    pub message: String,
    pub version: String,
    pub uptime_secs: u64,
}

pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse> {
    Json(ApiResponse {
        message: "xtream-dl is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Build the complete application router.
///
/// Used by `main` and by the integration tests, so both run the same routes.
pub fn app(state: AppState) -> Router {
    // The browser UI may be served from another origin during development
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api::router())
        .fallback(static_files::spa_fallback)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
