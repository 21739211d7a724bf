//! Xtream Codes provider client.
//!
//! Every provider call is a GET against `player_api.php` with the account
//! credentials, an `action` selector, and optional extra parameters. There is
//! no retry; errors and malformed bodies surface as `UpstreamUnavailable`.

pub mod models;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::XtreamConfig;
use crate::error::{AppError, Result};

pub use models::{
    decode_list, Category, Episode, EpisodeInfo, LiveStream, MoviesSnapshot, PlaylistEntry,
    Season, Series, SeriesDetail, SeriesDetailInfo, VodStream,
};

/// Category listings offered by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Live,
    Vod,
    Series,
}

impl CategoryKind {
    pub fn action(&self) -> &'static str {
        match self {
            CategoryKind::Live => "get_live_categories",
            CategoryKind::Vod => "get_vod_categories",
            CategoryKind::Series => "get_series_categories",
        }
    }
}

/// Query interface of an Xtream Codes provider.
///
/// Implementors only provide [`XtreamApi::query`]; the typed helpers decode its
/// JSON into the records in [`models`].
#[async_trait]
pub trait XtreamApi: Send + Sync {
    /// Runs `action` with the given extra parameters and returns the raw JSON.
    async fn query(&self, action: &str, params: &[(&str, String)]) -> Result<Value>;

    async fn live_streams(&self) -> Result<Vec<LiveStream>> {
        let value = self.query("get_live_streams", &[]).await?;
        decode_list(value, "get_live_streams")
    }

    async fn vod_streams(&self) -> Result<Vec<VodStream>> {
        let value = self.query("get_vod_streams", &[]).await?;
        decode_list(value, "get_vod_streams")
    }

    async fn series(&self) -> Result<Vec<Series>> {
        let value = self.query("get_series", &[]).await?;
        decode_list(value, "get_series")
    }

    async fn categories(&self, kind: CategoryKind) -> Result<Vec<Category>> {
        let action = kind.action();
        let value = self.query(action, &[]).await?;
        decode_list(value, action)
    }

    /// Fetches series details. `None` when the provider has no `info` for it.
    async fn series_info(&self, series_id: &str) -> Result<Option<SeriesDetail>> {
        let value = self
            .query("get_series_info", &[("series_id", series_id.to_string())])
            .await?;

        let has_info = value
            .get("info")
            .map(|info| info.is_object())
            .unwrap_or(false);
        if !has_info {
            return Ok(None);
        }

        serde_json::from_value(value).map(Some).map_err(|e| {
            AppError::UpstreamUnavailable(format!("Malformed get_series_info response: {}", e))
        })
    }
}

/// HTTP client for a provider's `player_api.php`.
pub struct XtreamClient {
    client: Client,
    api_url: String,
    username: String,
    password: String,
}

impl XtreamClient {
    /// Create a new provider client.
    ///
    /// Returns an error if no hostname is configured or if the HTTP client cannot be built.
    pub fn new(config: &XtreamConfig) -> Result<Self> {
        if config.hostname.trim().is_empty() {
            return Err(AppError::Internal(
                "Xtream hostname cannot be empty".to_string(),
            ));
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: format!("{}/player_api.php", config.base_url()),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Create a new provider client wrapped in Arc for shared access.
    pub fn new_shared(config: &XtreamConfig) -> Result<Arc<Self>> {
        Ok(Arc::new(Self::new(config)?))
    }
}

#[async_trait]
impl XtreamApi for XtreamClient {
    async fn query(&self, action: &str, params: &[(&str, String)]) -> Result<Value> {
        tracing::debug!(action = %action, params = params.len(), "Querying provider");

        let credentials = [
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
            ("action", action),
        ];

        let response = self
            .client
            .get(&self.api_url)
            .query(&credentials)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                // reqwest errors carry the URL, which holds the credentials
                AppError::UpstreamUnavailable(format!(
                    "Provider request {} failed: {}",
                    action,
                    e.without_url()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "Provider {} returned error status: {}",
                action, status
            )));
        }

        response.json::<Value>().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!(
                "Failed to parse provider response for {}: {}",
                action,
                e.without_url()
            ))
        })
    }
}
