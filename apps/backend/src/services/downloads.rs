//! Download dispatch to aria2.
//!
//! A request names provider content (type, id, extension) or carries a direct
//! stream URL for live channels. It is validated, turned into a stream URL and
//! a cleaned output filename, and handed to the daemon. Nothing is tracked
//! locally; status is read back from the daemon on demand.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::services::aria2::{Aria2Client, DownloadJob, RpcError, SubmitOutcome};
use crate::services::naming::{output_filename, StreamType, StreamUrlBuilder};
use crate::services::xtream::models::optional_string_or_number;

/// Extension used for live streams whose URL carries none.
const DEFAULT_LIVE_EXTENSION: &str = "ts";

/// Body of `POST /api/download`. Every field is optional here so that
/// missing ones can be reported together.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadRequest {
    #[serde(rename = "type", default)]
    pub stream_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub container_extension: Option<String>,
    #[serde(default)]
    pub stream_url: Option<String>,
}

/// A validated download, ready for the daemon.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDownload {
    pub uri: String,
    pub out: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    /// The daemon answered the HTTP call with 200.
    pub success: bool,
    /// The daemon created a job.
    pub acknowledged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daemon_error: Option<RpcError>,
    pub message: String,
}

impl DownloadResponse {
    fn from_outcome(outcome: SubmitOutcome, out: &str) -> Self {
        match outcome {
            SubmitOutcome::Acknowledged { gid } => Self {
                success: true,
                acknowledged: true,
                gid: Some(gid),
                daemon_error: None,
                message: format!("Queued {}", out),
            },
            SubmitOutcome::Rejected(error) => Self {
                success: true,
                acknowledged: false,
                gid: None,
                message: format!("Daemon rejected {}: {}", out, error.message),
                daemon_error: Some(error),
            },
            SubmitOutcome::Unconfirmed => Self {
                success: true,
                acknowledged: false,
                gid: None,
                daemon_error: None,
                message: format!("Sent {} without confirmation from the daemon", out),
            },
        }
    }
}

/// Daemon jobs, split the way the downloads view shows them.
#[derive(Debug, Serialize)]
pub struct DownloadStatus {
    pub active: Vec<DownloadJob>,
    pub completed: Vec<DownloadJob>,
}

pub struct DownloadDispatcher {
    aria2: Aria2Client,
    urls: StreamUrlBuilder,
}

impl DownloadDispatcher {
    pub fn new(aria2: Aria2Client, urls: StreamUrlBuilder) -> Self {
        Self { aria2, urls }
    }

    /// Validates a request and derives the stream URL and output filename.
    ///
    /// Requests that carry a `stream_url` but no `id` are direct live-channel
    /// downloads; all others must name `type`, `id`, `container_extension`
    /// and `name`.
    pub fn prepare(&self, request: &DownloadRequest) -> Result<PreparedDownload> {
        let stream_url = present(&request.stream_url);
        let id = present(&request.id);

        match (stream_url, id) {
            (Some(url), None) => {
                let name = present(&request.name)
                    .ok_or_else(|| AppError::MissingParameter("name".to_string()))?;
                let extension = present(&request.container_extension)
                    .map(str::to_string)
                    .unwrap_or_else(|| url_extension(url));
                let out = clean_output(name, &extension)?;
                Ok(PreparedDownload {
                    uri: url.to_string(),
                    out,
                })
            }
            _ => {
                let stream_type = present(&request.stream_type);
                let name = present(&request.name);
                let extension = present(&request.container_extension);

                let missing: Vec<&str> = [
                    ("type", stream_type.is_none()),
                    ("name", name.is_none()),
                    ("id", id.is_none()),
                    ("container_extension", extension.is_none()),
                ]
                .iter()
                .filter(|(_, absent)| *absent)
                .map(|(field, _)| *field)
                .collect();

                match (stream_type, name, id, extension) {
                    (Some(stream_type), Some(name), Some(id), Some(extension)) => {
                        let stream_type: StreamType = stream_type.parse()?;
                        let out = clean_output(name, extension)?;
                        Ok(PreparedDownload {
                            uri: self.urls.stream_url(stream_type, id, Some(extension)),
                            out,
                        })
                    }
                    _ => Err(AppError::MissingParameter(missing.join(", "))),
                }
            }
        }
    }

    /// Validates and submits a download. Validation failures never reach
    /// the daemon.
    pub async fn submit(&self, request: &DownloadRequest) -> Result<DownloadResponse> {
        let prepared = self.prepare(request)?;
        tracing::info!(out = %prepared.out, "Dispatching download");

        let outcome = self.aria2.add_uri(&prepared.uri, &prepared.out).await?;
        Ok(DownloadResponse::from_outcome(outcome, &prepared.out))
    }

    /// Active and stopped jobs, queried concurrently.
    pub async fn status(&self) -> Result<DownloadStatus> {
        let (active, completed) =
            futures::future::try_join(self.aria2.tell_active(), self.aria2.tell_stopped()).await?;

        tracing::debug!(
            active = active.len(),
            completed = completed.len(),
            "Fetched download status"
        );
        Ok(DownloadStatus { active, completed })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn clean_output(name: &str, extension: &str) -> Result<String> {
    output_filename(name, extension).ok_or_else(|| {
        AppError::BadRequest(format!("Title '{}' is empty after cleanup", name))
    })
}

/// Extension of the last path segment of `url`, ignoring any query string.
fn url_extension(url: &str) -> String {
    let path = url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);

    segment
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or(DEFAULT_LIVE_EXTENSION)
        .to_string()
}
