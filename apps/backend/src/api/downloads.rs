//! Download endpoints: submit to aria2 and read back job status.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::error::Result;
use crate::services::downloads::{DownloadRequest, DownloadResponse, DownloadStatus};
use crate::AppState;

// =============================================================================
// Router
// =============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_download))
        .route("/status", get(download_status))
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/download
///
/// Body `{type, name, id, container_extension}`, or `{stream_url, name}` for
/// a live channel. Missing fields are a 400 and nothing is sent to the daemon.
/// `success` reports the HTTP exchange with the daemon, `acknowledged` whether
/// the daemon actually queued the job.
pub async fn create_download(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Result<Json<DownloadResponse>> {
    let response = state.downloads.submit(&request).await?;
    Ok(Json(response))
}

/// GET /api/download/status
pub async fn download_status(State(state): State<AppState>) -> Result<Json<DownloadStatus>> {
    let status = state.downloads.status().await?;
    Ok(Json(status))
}
