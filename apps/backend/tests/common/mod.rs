//! Test infrastructure for xtream-dl integration tests.
//!
//! Provides a `TestApp` wrapper around `axum_test::TestServer` running the
//! production router, with a scripted provider, a scripted aria2 daemon and an
//! in-memory snapshot store in place of the network and the filesystem.

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use xtream_dl::config::{Aria2Config, Config, XtreamConfig};
use xtream_dl::error::{AppError, Result};
use xtream_dl::services::aria2::{RpcRequest, RpcTransport, TransportReply};
use xtream_dl::services::{
    Aria2Client, Catalog, DownloadDispatcher, MemoryStore, SnapshotCache, StreamUrlBuilder,
    XtreamApi,
};
use xtream_dl::AppState;

/// Provider double answering each action with a canned body.
///
/// Actions without a body fail with `UpstreamUnavailable`.
#[derive(Default)]
pub struct FakeProvider {
    responses: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl FakeProvider {
    pub fn respond(&self, action: &str, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(action.to_string(), body);
    }

    /// Number of times `action` was queried.
    pub fn calls(&self, action: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| a == action)
            .count()
    }

    #[allow(dead_code)]
    pub fn last_params(&self, action: &str) -> Option<Vec<(String, String)>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(a, _)| a == action)
            .map(|(_, params)| params.clone())
    }
}

#[async_trait]
impl XtreamApi for FakeProvider {
    async fn query(&self, action: &str, params: &[(&str, String)]) -> Result<Value> {
        self.calls.lock().unwrap().push((
            action.to_string(),
            params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        ));

        self.responses
            .lock()
            .unwrap()
            .get(action)
            .cloned()
            .ok_or_else(|| AppError::UpstreamUnavailable(format!("{} is down", action)))
    }
}

/// aria2 double answering each method with a canned reply, recording every
/// request it receives.
#[derive(Default)]
pub struct FakeDaemon {
    replies: Mutex<HashMap<String, TransportReply>>,
    requests: Mutex<Vec<RpcRequest>>,
}

impl FakeDaemon {
    pub fn reply(&self, method: &str, body: Value) {
        self.reply_with_status(method, 200, body);
    }

    pub fn reply_with_status(&self, method: &str, status: u16, body: Value) {
        self.replies
            .lock()
            .unwrap()
            .insert(method.to_string(), TransportReply { status, body });
    }

    pub fn requests(&self) -> Vec<RpcRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RpcTransport for FakeDaemon {
    async fn post(&self, request: &RpcRequest) -> Result<TransportReply> {
        self.requests.lock().unwrap().push(request.clone());

        self.replies
            .lock()
            .unwrap()
            .get(&request.method)
            .cloned()
            .ok_or_else(|| AppError::DaemonUnreachable("connection refused".to_string()))
    }
}

/// Test application wrapper around axum_test::TestServer.
pub struct TestApp {
    server: TestServer,
    pub provider: Arc<FakeProvider>,
    pub daemon: Arc<FakeDaemon>,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    /// Create a new test application with fakes behind the production router.
    pub fn new() -> Self {
        let config = Config {
            xtream: XtreamConfig {
                hostname: "iptv.test:8080".to_string(),
                username: "alice".to_string(),
                password: "secret".to_string(),
                request_timeout_secs: None,
            },
            aria2: Aria2Config {
                secret: Some("rpc-token".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let provider = Arc::new(FakeProvider::default());
        let daemon = Arc::new(FakeDaemon::default());
        let store = Arc::new(MemoryStore::new());

        let urls = StreamUrlBuilder::new(&config.xtream);
        let catalog = Catalog::new(
            provider.clone(),
            SnapshotCache::new(store.clone()),
            urls.clone(),
        );
        let aria2 = Aria2Client::new(daemon.clone(), &config.aria2);
        let downloads = DownloadDispatcher::new(aria2, urls);

        let app = xtream_dl::app(AppState::new(catalog, downloads));
        let server = TestServer::new(app).expect("Failed to create test server");

        Self {
            server,
            provider,
            daemon,
            store,
        }
    }

    /// Get a reference to the test server.
    pub fn server(&self) -> &TestServer {
        &self.server
    }
}
