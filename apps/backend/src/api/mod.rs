//! API endpoint handlers for the xtream-dl backend.

use axum::Router;
use serde::Deserialize;

use crate::AppState;

pub mod categories;
pub mod downloads;
pub mod movies;
pub mod playlist;
pub mod series;

/// `?refresh=` flag of the snapshot-backed listings. Only `true` forces a
/// refetch; any other value serves the stored snapshot.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshQuery {
    pub refresh: Option<String>,
}

impl RefreshQuery {
    pub fn requested(&self) -> bool {
        self.refresh
            .as_deref()
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}

/// All routes mounted under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(playlist::router())
        .nest("/movies", movies::router())
        .nest("/series", series::router())
        .nest("/categories", categories::router())
        .nest("/download", downloads::router())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_flag() {
        let query = |v: Option<&str>| RefreshQuery {
            refresh: v.map(str::to_string),
        };
        assert!(query(Some("true")).requested());
        assert!(query(Some("TRUE")).requested());
        assert!(!query(Some("false")).requested());
        assert!(!query(Some("1")).requested());
        assert!(!query(None).requested());
    }
}
