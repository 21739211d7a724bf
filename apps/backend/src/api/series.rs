//! Series API endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use super::RefreshQuery;
use crate::error::Result;
use crate::services::xtream::{Series, SeriesDetail};
use crate::AppState;

// =============================================================================
// Router
// =============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_series))
        .route("/search/:query", get(search_series))
        .route("/:id", get(get_series))
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/series?refresh=true
pub async fn list_series(
    State(state): State<AppState>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<Vec<Series>>> {
    let series = state.catalog.series(query.requested()).await?;
    Ok(Json(series))
}

/// GET /api/series/:id
///
/// Series info with seasons and episodes grouped by season number.
/// 404 when the provider has no info for the id.
pub async fn get_series(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SeriesDetail>> {
    let detail = state.catalog.series_detail(&id).await?;
    Ok(Json(detail))
}

/// GET /api/series/search/:query
///
/// Always queries the provider; the series snapshot is not consulted.
pub async fn search_series(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Result<Json<Vec<Series>>> {
    let series = state.catalog.search_series(&query).await?;
    Ok(Json(series))
}
