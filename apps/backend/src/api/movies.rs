//! Movies API endpoint.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use super::RefreshQuery;
use crate::error::Result;
use crate::services::xtream::MoviesSnapshot;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_movies))
}

/// GET /api/movies?refresh=true
///
/// Serves the movies snapshot, fetching it first when missing or when a
/// refresh is requested.
pub async fn list_movies(
    State(state): State<AppState>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<MoviesSnapshot>> {
    let snapshot = state.catalog.movies(query.requested()).await?;
    Ok(Json(snapshot))
}
