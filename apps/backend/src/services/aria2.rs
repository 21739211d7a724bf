//! aria2 JSON-RPC client.
//!
//! Jobs are owned by the daemon; this client only submits URIs and reads the
//! daemon's own job records. Requests go through an [`RpcTransport`] so the
//! HTTP layer can be replaced.

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::Aria2Config;
use crate::error::{AppError, Result};

// =============================================================================
// Wire types
// =============================================================================

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub id: String,
    pub method: String,
    pub params: Vec<Value>,
}

/// JSON-RPC error object returned by the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcError>,
}

/// What came back over HTTP: the status code and the body, `Null` if it was
/// not JSON.
#[derive(Debug, Clone)]
pub struct TransportReply {
    pub status: u16,
    pub body: Value,
}

impl TransportReply {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn is_ok(&self) -> bool {
        self.status == 200
    }

    fn parse<T: DeserializeOwned>(&self) -> Option<RpcResponse<T>> {
        serde_json::from_value(self.body.clone()).ok()
    }
}

/// Carries JSON-RPC requests to the daemon.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Posts one request. Errors only when no HTTP reply was received.
    async fn post(&self, request: &RpcRequest) -> Result<TransportReply>;
}

/// JSON-RPC over HTTP POST.
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn post(&self, request: &RpcRequest) -> Result<TransportReply> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                AppError::DaemonUnreachable(format!("{} to {} failed: {}", request.method, self.url, e))
            })?;

        let status = response.status().as_u16();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok(TransportReply { status, body })
    }
}

// =============================================================================
// Job records
// =============================================================================

fn u64_from_string<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s.parse().unwrap_or(0)),
        Value::Number(n) => Ok(n.as_u64().unwrap_or(0)),
        _ => Ok(0),
    }
}

/// Job state as reported by `aria2.tellStatus` and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Waiting,
    Paused,
    Error,
    Complete,
    Removed,
}

/// One download job, named the way aria2 names it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadJob {
    pub gid: String,
    pub status: JobStatus,
    #[serde(default, deserialize_with = "u64_from_string")]
    pub total_length: u64,
    #[serde(default, deserialize_with = "u64_from_string")]
    pub completed_length: u64,
    #[serde(default, deserialize_with = "u64_from_string")]
    pub download_speed: u64,
    #[serde(default, deserialize_with = "u64_from_string")]
    pub upload_speed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default)]
    pub files: Vec<JobFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFile {
    #[serde(default)]
    pub index: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, deserialize_with = "u64_from_string")]
    pub length: u64,
    #[serde(default, deserialize_with = "u64_from_string")]
    pub completed_length: u64,
    #[serde(default)]
    pub uris: Vec<JobUri>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobUri {
    pub uri: String,
    #[serde(default)]
    pub status: String,
}

/// Outcome of an `aria2.addUri` call that reached the daemon with HTTP 200.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The daemon created a job.
    Acknowledged { gid: String },
    /// The daemon answered with a JSON-RPC error (e.g. a bad token).
    Rejected(RpcError),
    /// HTTP 200 with neither a result nor an error in the body.
    Unconfirmed,
}

// =============================================================================
// Client
// =============================================================================

/// Client for the aria2 methods this service uses.
pub struct Aria2Client {
    transport: Arc<dyn RpcTransport>,
    secret: Option<String>,
    download_dir: String,
    stopped_window: u32,
}

impl Aria2Client {
    pub fn new(transport: Arc<dyn RpcTransport>, config: &Aria2Config) -> Self {
        Self {
            transport,
            secret: config.secret.clone().filter(|s| !s.is_empty()),
            download_dir: config.download_dir.clone(),
            stopped_window: config.stopped_window,
        }
    }

    /// Create a client talking HTTP to the configured daemon URL.
    pub fn from_config(config: &Aria2Config) -> Result<Self> {
        let transport = HttpTransport::new(config.url.clone())?;
        Ok(Self::new(Arc::new(transport), config))
    }

    fn request(&self, id: &str, method: &str, args: Vec<Value>) -> RpcRequest {
        let mut params = Vec::with_capacity(args.len() + 1);
        if let Some(secret) = &self.secret {
            params.push(Value::String(format!("token:{}", secret)));
        }
        params.extend(args);

        RpcRequest {
            jsonrpc: "2.0",
            id: id.to_string(),
            method: method.to_string(),
            params,
        }
    }

    /// Queues `uri` for download into the configured directory as `out`.
    ///
    /// A non-200 reply is an error. A 200 reply is always returned as an
    /// outcome, including when the daemon itself rejected the call.
    pub async fn add_uri(&self, uri: &str, out: &str) -> Result<SubmitOutcome> {
        let request = self.request(
            "1",
            "aria2.addUri",
            vec![
                json!([uri]),
                json!({ "dir": self.download_dir, "out": out }),
            ],
        );

        tracing::debug!(method = %request.method, out = %out, "Submitting download to aria2");
        let reply = self.transport.post(&request).await?;

        if !reply.is_ok() {
            let detail = reply
                .parse::<Value>()
                .and_then(|r| r.error)
                .map(|e| format!(": {}", e.message))
                .unwrap_or_default();
            return Err(AppError::DaemonUnreachable(format!(
                "aria2.addUri returned HTTP {}{}",
                reply.status, detail
            )));
        }

        let outcome = match reply.parse::<String>() {
            Some(RpcResponse {
                error: Some(error), ..
            }) => SubmitOutcome::Rejected(error),
            Some(RpcResponse {
                result: Some(gid), ..
            }) => SubmitOutcome::Acknowledged { gid },
            _ => SubmitOutcome::Unconfirmed,
        };

        match &outcome {
            SubmitOutcome::Acknowledged { gid } => {
                tracing::info!(gid = %gid, out = %out, "Download queued");
            }
            SubmitOutcome::Rejected(error) => {
                tracing::warn!(code = error.code, "aria2 rejected addUri: {}", error.message);
            }
            SubmitOutcome::Unconfirmed => {
                tracing::warn!("aria2 accepted addUri without a result");
            }
        }

        Ok(outcome)
    }

    /// Jobs currently downloading.
    pub async fn tell_active(&self) -> Result<Vec<DownloadJob>> {
        let request = self.request("1", "aria2.tellActive", Vec::new());
        self.list(request).await
    }

    /// Finished, failed and removed jobs, up to the configured window.
    pub async fn tell_stopped(&self) -> Result<Vec<DownloadJob>> {
        let request = self.request(
            "2",
            "aria2.tellStopped",
            vec![json!(0), json!(self.stopped_window)],
        );
        self.list(request).await
    }

    async fn list(&self, request: RpcRequest) -> Result<Vec<DownloadJob>> {
        tracing::debug!(method = %request.method, "Querying aria2");
        let reply = self.transport.post(&request).await?;

        let parsed = reply.parse::<Vec<DownloadJob>>();
        if let Some(RpcResponse {
            error: Some(error), ..
        }) = parsed
        {
            return Err(AppError::DaemonRejected {
                method: request.method,
                code: error.code,
                message: error.message,
            });
        }

        if !reply.is_ok() {
            return Err(AppError::DaemonUnreachable(format!(
                "{} returned HTTP {}",
                request.method, reply.status
            )));
        }

        match parsed {
            Some(response) => Ok(response.result.unwrap_or_default()),
            None if reply.body.get("result").is_none() => Ok(Vec::new()),
            None => Err(AppError::DaemonUnreachable(format!(
                "Malformed {} response",
                request.method
            ))),
        }
    }
}
