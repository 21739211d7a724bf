use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use xtream_dl::config::Config;
use xtream_dl::services::{
    Aria2Client, Catalog, DownloadDispatcher, FileStore, SnapshotCache, StreamUrlBuilder,
    XtreamClient,
};
use xtream_dl::AppState;

fn init_tracing() {
    // RUST_LOG controls log levels
    // Default: debug for our crate, info for axum, warn for dependencies
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("xtream_dl=debug,tower_http=debug,axum=info,warn")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() {
    // .env may set RUST_LOG, so it is read before tracing starts
    let dotenv = dotenvy::dotenv();
    init_tracing();

    tracing::info!("Starting xtream-dl v{}", env!("CARGO_PKG_VERSION"));

    match dotenv {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Failed to read .env: {}", e),
    }

    // Load configuration
    let config = match Config::load() {
        Ok(cfg) => {
            tracing::info!("Configuration loaded successfully");
            tracing::debug!("Server: {}:{}", cfg.server.host, cfg.server.port);
            tracing::debug!("Provider: {:?}", cfg.xtream);
            tracing::debug!("aria2: {:?}", cfg.aria2);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let provider = match XtreamClient::new_shared(&config.xtream) {
        Ok(client) => {
            tracing::info!("Provider client initialized for {}", config.xtream.base_url());
            client
        }
        Err(e) => {
            tracing::error!("Failed to create provider client: {}", e);
            std::process::exit(1);
        }
    };

    let aria2 = match Aria2Client::from_config(&config.aria2) {
        Ok(client) => {
            tracing::info!("aria2 client initialized for {}", config.aria2.url);
            client
        }
        Err(e) => {
            tracing::error!("Failed to create aria2 client: {}", e);
            std::process::exit(1);
        }
    };

    let store = FileStore::new(config.snapshot.dir.clone());
    tracing::info!("Snapshots stored in {}", store.dir().display());

    let urls = StreamUrlBuilder::new(&config.xtream);
    let catalog = Catalog::new(provider, SnapshotCache::new(Arc::new(store)), urls.clone());
    let downloads = DownloadDispatcher::new(aria2, urls);

    let addr = config.server_addr();
    let app = xtream_dl::app(AppState::new(catalog, downloads));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("xtream-dl listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
