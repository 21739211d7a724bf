//! Category listings.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::services::xtream::{Category, CategoryKind};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:kind", get(list_categories))
}

/// GET /api/categories/:kind where kind is `live`, `vod` or `series`.
pub async fn list_categories(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<Category>>> {
    let kind = match kind.as_str() {
        "live" => CategoryKind::Live,
        "vod" => CategoryKind::Vod,
        "series" => CategoryKind::Series,
        other => {
            return Err(AppError::BadRequest(format!(
                "Invalid category type: {}",
                other
            )))
        }
    };

    let categories = state.catalog.categories(kind).await?;
    Ok(Json(categories))
}
