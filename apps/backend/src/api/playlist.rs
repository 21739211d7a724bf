//! Live channel playlist endpoint.

use axum::{extract::State, routing::get, Json, Router};

use crate::error::Result;
use crate::services::xtream::PlaylistEntry;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/playlist", get(get_playlist))
}

/// GET /api/playlist
///
/// Live channels fetched fresh from the provider, each with its stream URL.
pub async fn get_playlist(State(state): State<AppState>) -> Result<Json<Vec<PlaylistEntry>>> {
    let entries = state.catalog.playlist().await?;
    Ok(Json(entries))
}
