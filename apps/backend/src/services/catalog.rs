//! Browsing operations over the provider catalog.
//!
//! Live channels and searches are always fetched fresh. Movie and series
//! listings are served from snapshots until a refresh is requested.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::services::naming::{StreamType, StreamUrlBuilder};
use crate::services::snapshot::{SnapshotCache, SnapshotKind};
use crate::services::xtream::{
    Category, CategoryKind, LiveStream, MoviesSnapshot, PlaylistEntry, Series, SeriesDetail,
    XtreamApi,
};

pub struct Catalog {
    provider: Arc<dyn XtreamApi>,
    snapshots: SnapshotCache,
    urls: StreamUrlBuilder,
}

impl Catalog {
    pub fn new(
        provider: Arc<dyn XtreamApi>,
        snapshots: SnapshotCache,
        urls: StreamUrlBuilder,
    ) -> Self {
        Self {
            provider,
            snapshots,
            urls,
        }
    }

    /// Live channels with a ready-to-use stream URL each.
    pub async fn playlist(&self) -> Result<Vec<PlaylistEntry>> {
        let streams = self.provider.live_streams().await?;

        // Names only need resolving when the stream records leave them out
        let needs_lookup = streams
            .iter()
            .any(|s| s.category_name.as_deref().unwrap_or("").is_empty());
        let names = if needs_lookup {
            self.live_category_names().await
        } else {
            HashMap::new()
        };

        Ok(streams
            .into_iter()
            .map(|stream| self.playlist_entry(stream, &names))
            .collect())
    }

    async fn live_category_names(&self) -> HashMap<String, String> {
        match self.provider.categories(CategoryKind::Live).await {
            Ok(categories) => categories
                .into_iter()
                .map(|c| (c.category_id, c.category_name))
                .collect(),
            Err(e) => {
                tracing::warn!("Failed to fetch live categories for playlist: {}", e);
                HashMap::new()
            }
        }
    }

    fn playlist_entry(&self, stream: LiveStream, names: &HashMap<String, String>) -> PlaylistEntry {
        let category_name = stream
            .category_name
            .filter(|name| !name.is_empty())
            .or_else(|| {
                stream
                    .category_id
                    .as_ref()
                    .and_then(|id| names.get(id).cloned())
            })
            .unwrap_or_default();

        let stream_url = self.urls.stream_url(
            StreamType::Live,
            &stream.stream_id.to_string(),
            stream.container_extension.as_deref(),
        );

        PlaylistEntry {
            category_name,
            name: stream.name,
            stream_icon: stream.stream_icon.unwrap_or_default(),
            stream_url,
            stream_type: stream
                .stream_type
                .unwrap_or_else(|| StreamType::Live.to_string()),
        }
    }

    /// Movies with their categories. A refresh also rewrites the standalone
    /// category snapshot.
    pub async fn movies(&self, refresh: bool) -> Result<MoviesSnapshot> {
        let provider = &self.provider;
        let snapshots = &self.snapshots;

        self.snapshots
            .load_or_fetch(SnapshotKind::Movies, refresh, move || async move {
                let (movies, categories) = futures::future::try_join(
                    provider.vod_streams(),
                    provider.categories(CategoryKind::Vod),
                )
                .await?;

                snapshots
                    .store(SnapshotKind::MovieCategories, &categories)
                    .await?;

                tracing::info!(
                    movies = movies.len(),
                    categories = categories.len(),
                    "Fetched movie catalog"
                );
                Ok(MoviesSnapshot { movies, categories })
            })
            .await
    }

    pub async fn series(&self, refresh: bool) -> Result<Vec<Series>> {
        let provider = &self.provider;

        self.snapshots
            .load_or_fetch(SnapshotKind::Series, refresh, move || async move {
                let series = provider.series().await?;
                tracing::info!(series = series.len(), "Fetched series catalog");
                Ok(series)
            })
            .await
    }

    pub async fn series_detail(&self, series_id: &str) -> Result<SeriesDetail> {
        self.provider
            .series_info(series_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Series {} not found", series_id)))
    }

    /// Case-insensitive substring match on series names, always against the
    /// live provider listing.
    pub async fn search_series(&self, query: &str) -> Result<Vec<Series>> {
        let needle = query.to_lowercase();
        let series = self.provider.series().await?;

        let matches: Vec<Series> = series
            .into_iter()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .collect();

        tracing::debug!(query = %query, matches = matches.len(), "Series search");
        Ok(matches)
    }

    pub async fn categories(&self, kind: CategoryKind) -> Result<Vec<Category>> {
        self.provider.categories(kind).await
    }
}
