//! Static file serving with rust-embed
//!
//! Embeds the browser UI into the binary for single-file deployment. Any path
//! that is not an API route resolves to an asset, or to `index.html` so the
//! client-side views can handle it.

use axum::{
    body::Body,
    http::{header, Response, StatusCode, Uri},
    response::IntoResponse,
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "static/"]
pub struct StaticAssets;

const INDEX: &str = "index.html";

/// Fallback handler: embedded asset for `uri`, else the SPA shell.
pub async fn spa_fallback(uri: Uri) -> impl IntoResponse {
    let path = uri.path().trim_start_matches('/');
    let path = if path.is_empty() { INDEX } else { path };

    match StaticAssets::get(path) {
        Some(content) => asset_response(path, content.data.into_owned(), true),
        None => match StaticAssets::get(INDEX) {
            Some(content) => asset_response(INDEX, content.data.into_owned(), false),
            None => not_found(),
        },
    }
}

fn asset_response(path: &str, data: Vec<u8>, cacheable: bool) -> Response<Body> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let cache = if cacheable && path != INDEX {
        "public, max-age=3600"
    } else {
        "no-cache"
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CACHE_CONTROL, cache)
        .body(Body::from(data))
        .unwrap_or_else(|_| not_found())
}

fn not_found() -> Response<Body> {
    let mut response = Response::new(Body::from("Not found"));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}
