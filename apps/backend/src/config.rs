//! Configuration module for the xtream-dl backend.
//!
//! Loads configuration from `config.toml` with environment variable overrides.

use config::{Config as ConfigLoader, ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::AppError;

const DEFAULT_ARIA2_URL: &str = "http://192.168.0.21:6800/jsonrpc";

/// Flat environment variables understood for compatibility with existing
/// deployments, mapped onto their nested config keys.
const LEGACY_ENV_VARS: &[(&str, &str)] = &[
    ("XTREAM_HOSTNAME", "xtream.hostname"),
    ("XTREAM_USER", "xtream.username"),
    ("XTREAM_PASSWORD", "xtream.password"),
    ("RPC_PASSWORD", "aria2.secret"),
    ("ARIA2_URL", "aria2.url"),
    ("PORT", "server.port"),
];

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub xtream: XtreamConfig,
    #[serde(default)]
    pub aria2: Aria2Config,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

/// IPTV provider (Xtream Codes API) configuration
#[derive(Clone, Deserialize, Default)]
pub struct XtreamConfig {
    /// Host (and optional port) of the provider, e.g. `iptv.example.com:8080`.
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Unset means requests to the provider never time out.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl XtreamConfig {
    /// Base URL of the provider, including scheme.
    pub fn base_url(&self) -> String {
        let host = self.hostname.trim_end_matches('/');
        if host.contains("://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        }
    }
}

// Custom Debug implementation to avoid exposing the provider password
impl std::fmt::Debug for XtreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XtreamConfig")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// aria2 JSON-RPC daemon configuration
#[derive(Clone, Deserialize)]
pub struct Aria2Config {
    #[serde(default = "default_aria2_url")]
    pub url: String,
    /// RPC secret, sent as `token:<secret>` when set.
    #[serde(default)]
    pub secret: Option<String>,
    /// Directory on the daemon host that downloads are written to.
    #[serde(default = "default_download_dir")]
    pub download_dir: String,
    /// Maximum number of stopped jobs requested per status query.
    #[serde(default = "default_stopped_window")]
    pub stopped_window: u32,
}

// Custom Debug implementation to avoid exposing the RPC secret
impl std::fmt::Debug for Aria2Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aria2Config")
            .field("url", &self.url)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("download_dir", &self.download_dir)
            .field("stopped_window", &self.stopped_window)
            .finish()
    }
}

impl Default for Aria2Config {
    fn default() -> Self {
        Self {
            url: default_aria2_url(),
            secret: None,
            download_dir: default_download_dir(),
            stopped_window: default_stopped_window(),
        }
    }
}

fn default_aria2_url() -> String {
    DEFAULT_ARIA2_URL.to_string()
}

fn default_download_dir() -> String {
    "/downloads".to_string()
}

fn default_stopped_window() -> u32 {
    1000
}

/// Snapshot storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_snapshot_dir")]
    pub dir: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            dir: default_snapshot_dir(),
        }
    }
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("downloads")
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `config.toml` in current directory (optional)
    /// 3. Environment variables with `XDL_` prefix
    /// 4. The flat variables `XTREAM_HOSTNAME`, `XTREAM_USER`, `XTREAM_PASSWORD`,
    ///    `RPC_PASSWORD`, `ARIA2_URL` and `PORT`
    ///
    /// Prefixed environment variables use double underscore for nesting:
    /// - `XDL_SERVER__PORT=9000` sets `server.port`
    /// - `XDL_SNAPSHOT__DIR=/data` sets `snapshot.dir`
    pub fn load() -> Result<Self, AppError> {
        Self::load_from("config.toml")
    }

    /// Load configuration from a specific file path.
    pub fn load_from(config_path: &str) -> Result<Self, AppError> {
        let builder = ConfigLoader::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("aria2.url", DEFAULT_ARIA2_URL)?
            .set_default("aria2.download_dir", "/downloads")?
            .set_default("aria2.stopped_window", 1000)?
            .set_default("snapshot.dir", "downloads")?
            // Add config file (optional)
            .add_source(File::with_name(config_path).required(false))
            // XDL_SERVER__PORT=9000 -> server.port = 9000
            .add_source(
                Environment::with_prefix("XDL")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Config = apply_legacy_env(builder, |name| std::env::var(name).ok())?
            .build()?
            .try_deserialize()?;

        config.validate();

        Ok(config)
    }

    /// Warn about settings that leave parts of the service unusable.
    fn validate(&self) {
        if self.xtream.hostname.is_empty() {
            tracing::warn!("XTREAM_HOSTNAME not configured - provider requests will fail");
        }
        if self.xtream.username.is_empty() || self.xtream.password.is_empty() {
            tracing::warn!("Provider credentials not configured - provider requests will fail");
        }
        if self.aria2.secret.is_none() {
            tracing::warn!("RPC_PASSWORD not configured - calling aria2 without a token");
        }
    }

    /// Get the server socket address
    pub fn server_addr(&self) -> std::net::SocketAddr {
        use std::net::{IpAddr, Ipv4Addr, SocketAddr};
        let ip: IpAddr = self.server.host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid host '{}', using 0.0.0.0", self.server.host);
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        });
        SocketAddr::new(ip, self.server.port)
    }
}

fn apply_legacy_env<S, F>(
    mut builder: ConfigBuilder<S>,
    lookup: F,
) -> Result<ConfigBuilder<S>, AppError>
where
    S: config::builder::BuilderState,
    F: Fn(&str) -> Option<String>,
{
    for (var, key) in LEGACY_ENV_VARS {
        let value = lookup(var).filter(|v| !v.is_empty());
        builder = builder.set_override_option(*key, value)?;
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.aria2.url, "http://192.168.0.21:6800/jsonrpc");
        assert_eq!(config.aria2.download_dir, "/downloads");
        assert_eq!(config.aria2.stopped_window, 1000);
        assert_eq!(config.snapshot.dir, PathBuf::from("downloads"));
        assert!(config.xtream.request_timeout_secs.is_none());
    }

    #[test]
    fn test_server_addr() {
        let config = Config::default();
        let addr = config.server_addr();
        assert_eq!(addr.port(), 5000);
        assert!(addr.ip().is_unspecified());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[xtream]
hostname = "iptv.example.com:8080"
username = "alice"
password = "s3cret"

[aria2]
download_dir = "/srv/media"
"#
        )
        .unwrap();

        let config = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.xtream.hostname, "iptv.example.com:8080");
        assert_eq!(config.xtream.username, "alice");
        assert_eq!(config.aria2.download_dir, "/srv/media");
        assert_eq!(config.aria2.stopped_window, 1000);
    }

    #[test]
    fn test_legacy_env_overrides() {
        let builder = ConfigLoader::builder()
            .set_default("server.port", 5000)
            .unwrap();
        let config: Config = apply_legacy_env(builder, |name| match name {
            "XTREAM_HOSTNAME" => Some("provider.local".to_string()),
            "RPC_PASSWORD" => Some("token123".to_string()),
            "PORT" => Some("8181".to_string()),
            "ARIA2_URL" => Some(String::new()),
            _ => None,
        })
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap();

        assert_eq!(config.xtream.hostname, "provider.local");
        assert_eq!(config.aria2.secret.as_deref(), Some("token123"));
        assert_eq!(config.server.port, 8181);
        // Empty values fall back to defaults
        assert_eq!(config.aria2.url, DEFAULT_ARIA2_URL);
    }

    #[test]
    fn test_base_url() {
        let mut xtream = XtreamConfig {
            hostname: "iptv.example.com:8080".to_string(),
            ..Default::default()
        };
        assert_eq!(xtream.base_url(), "http://iptv.example.com:8080");

        xtream.hostname = "https://secure.example.com/".to_string();
        assert_eq!(xtream.base_url(), "https://secure.example.com");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config {
            xtream: XtreamConfig {
                password: "hunter2".to_string(),
                ..Default::default()
            },
            aria2: Aria2Config {
                secret: Some("rpc-token".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("rpc-token"));
        assert!(debug.contains("[REDACTED]"));
    }
}
