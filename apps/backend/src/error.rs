//! Application error types for the xtream-dl backend.
//!
//! Provides a unified error type that implements `IntoResponse` for Axum.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Provider HTTP/network failure or an unparsable provider response
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Incomplete download request
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Local snapshot file could not be parsed
    #[error("Snapshot {kind} is corrupt: {source}")]
    SnapshotCorrupt {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    /// Download daemon call failed at transport level
    #[error("Download daemon unreachable: {0}")]
    DaemonUnreachable(String),

    /// Download daemon answered with a JSON-RPC error
    #[error("Download daemon rejected {method}: {message} (code {code})")]
    DaemonRejected {
        method: String,
        code: i64,
        message: String,
    },

    /// Invalid request data
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Filesystem errors (snapshot storage)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading/parsing errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::MissingParameter(msg) => (
                StatusCode::BAD_REQUEST,
                "missing_parameter",
                Some(msg.clone()),
            ),
            AppError::BadRequest(msg) => {
                // Bad request messages are safe to expose (client-caused errors)
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::NotFound(resource) => {
                (StatusCode::NOT_FOUND, "not_found", Some(resource.clone()))
            }
            AppError::UpstreamUnavailable(msg) => {
                tracing::error!("Upstream error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "upstream_unavailable",
                    None,
                )
            }
            AppError::SnapshotCorrupt { kind, source } => {
                tracing::error!(kind = %kind, "Snapshot parse error: {:?}", source);
                (StatusCode::INTERNAL_SERVER_ERROR, "snapshot_corrupt", None)
            }
            AppError::DaemonUnreachable(msg) => {
                tracing::error!("Download daemon error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "daemon_unreachable",
                    None,
                )
            }
            AppError::DaemonRejected {
                method,
                code,
                message,
            } => {
                tracing::error!(method = %method, code = code, "Download daemon rejected call: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "daemon_rejected",
                    Some(message.clone()),
                )
            }
            AppError::Io(e) => {
                tracing::error!("I/O error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "io_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        let error = AppError::NotFound("test".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_missing_parameter_status() {
        let error = AppError::MissingParameter("container_extension".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_is_server_error() {
        let error = AppError::UpstreamUnavailable("connection refused".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_snapshot_corrupt_is_server_error() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error = AppError::SnapshotCorrupt {
            kind: "movies".to_string(),
            source,
        };
        assert!(error.to_string().starts_with("Snapshot movies is corrupt"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_daemon_errors_are_server_errors() {
        let unreachable = AppError::DaemonUnreachable("timeout".to_string()).into_response();
        assert_eq!(unreachable.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let rejected = AppError::DaemonRejected {
            method: "aria2.tellActive".to_string(),
            code: 1,
            message: "Unauthorized".to_string(),
        }
        .into_response();
        assert_eq!(rejected.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
