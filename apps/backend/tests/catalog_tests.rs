//! Integration tests for the browsing endpoints.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{json, Value};
use xtream_dl::services::snapshot::{SnapshotKind, SnapshotStore};

fn seed_movies(app: &TestApp) {
    app.provider.respond(
        "get_vod_streams",
        json!([
            {"num": 1, "name": "EN - Heat (1995)", "stream_id": 5521, "category_id": "4", "container_extension": "mkv", "rating": "7.9"},
            {"num": 2, "name": "EN - Ronin (1998)", "stream_id": "5522", "category_id": "4", "container_extension": "mp4"}
        ]),
    );
    app.provider.respond(
        "get_vod_categories",
        json!([{"category_id": "4", "category_name": "Action", "parent_id": 0}]),
    );
}

fn seed_series(app: &TestApp) {
    app.provider.respond(
        "get_series",
        json!([
            {"num": 1, "name": "Breaking Bad", "series_id": 10, "releaseDate": "2008-01-20", "backdrop_path": ["https://img/bb.jpg"]},
            {"num": 2, "name": "The Wire", "series_id": "11", "rating": 9.3},
            {"num": 3, "name": "Better Call Saul", "series_id": 12}
        ]),
    );
}

#[tokio::test]
async fn test_playlist_builds_stream_urls() {
    let app = TestApp::new();
    app.provider.respond(
        "get_live_streams",
        json!([
            {"stream_id": 101, "name": "UK - BBC One", "stream_icon": "https://img/bbc.png", "category_id": "1", "stream_type": "live"},
            {"stream_id": 102, "name": "UK - ITV", "category_id": "2", "category_name": "Entertainment"}
        ]),
    );
    app.provider.respond(
        "get_live_categories",
        json!([{"category_id": "1", "category_name": "News"}]),
    );

    let response = app.server().get("/api/playlist").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        body[0],
        json!({
            "category_name": "News",
            "name": "UK - BBC One",
            "stream_icon": "https://img/bbc.png",
            "stream_url": "http://iptv.test:8080/live/alice/secret/101",
            "stream_type": "live"
        })
    );
    assert_eq!(body[1]["category_name"], "Entertainment");
    assert_eq!(body[1]["stream_icon"], "");
}

#[tokio::test]
async fn test_playlist_upstream_failure_is_500() {
    let app = TestApp::new();

    let response = app.server().get("/api/playlist").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "upstream_unavailable");
}

#[tokio::test]
async fn test_playlist_skips_channels_without_ids() {
    let app = TestApp::new();
    app.provider.respond(
        "get_live_streams",
        json!([
            {"stream_id": 101, "name": "UK - BBC One", "category_name": "News"},
            {"stream_id": null, "name": "---- UK ----", "category_name": "News"}
        ]),
    );

    let response = app.server().get("/api/playlist").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["stream_url"], "http://iptv.test:8080/live/alice/secret/101");
}

#[tokio::test]
async fn test_movies_skip_records_without_ids() {
    let app = TestApp::new();
    app.provider.respond(
        "get_vod_streams",
        json!([
            {"name": "EN - Heat (1995)", "stream_id": 5521, "container_extension": "mkv"},
            {"name": "EN - Placeholder", "container_extension": "mkv"}
        ]),
    );
    app.provider.respond(
        "get_vod_categories",
        json!([{"category_id": "4", "category_name": "Action"}, {"category_name": "Orphan"}]),
    );

    let response = app.server().get("/api/movies").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["movies"].as_array().unwrap().len(), 1);
    assert_eq!(body["categories"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_movies_served_from_snapshot_after_first_fetch() {
    let app = TestApp::new();
    seed_movies(&app);

    let first = app.server().get("/api/movies").await;
    first.assert_status_ok();
    let body: Value = first.json();
    assert_eq!(body["movies"].as_array().unwrap().len(), 2);
    assert_eq!(body["movies"][1]["stream_id"], 5522);
    assert_eq!(body["categories"][0]["category_name"], "Action");
    assert_eq!(app.provider.calls("get_vod_streams"), 1);
    assert!(app.store.contains(SnapshotKind::Movies));
    assert!(app.store.contains(SnapshotKind::MovieCategories));

    // Provider changes are not visible until a refresh
    app.provider.respond("get_vod_streams", json!([]));
    let second = app.server().get("/api/movies").await;
    let body: Value = second.json();
    assert_eq!(body["movies"].as_array().unwrap().len(), 2);
    assert_eq!(app.provider.calls("get_vod_streams"), 1);

    let refreshed = app
        .server()
        .get("/api/movies")
        .add_query_param("refresh", "true")
        .await;
    let body: Value = refreshed.json();
    assert!(body["movies"].as_array().unwrap().is_empty());
    assert_eq!(app.provider.calls("get_vod_streams"), 2);
}

#[tokio::test]
async fn test_refresh_other_than_true_keeps_snapshot() {
    let app = TestApp::new();
    seed_movies(&app);

    app.server().get("/api/movies").await.assert_status_ok();
    app.server()
        .get("/api/movies")
        .add_query_param("refresh", "false")
        .await
        .assert_status_ok();

    assert_eq!(app.provider.calls("get_vod_streams"), 1);
}

#[tokio::test]
async fn test_corrupt_movies_snapshot_is_500_without_refetch() {
    let app = TestApp::new();
    seed_movies(&app);
    app.store.insert(SnapshotKind::Movies, "{\"movies\": [{");

    let response = app.server().get("/api/movies").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "snapshot_corrupt");
    assert_eq!(app.provider.calls("get_vod_streams"), 0);
}

#[tokio::test]
async fn test_series_listing_and_refresh() {
    let app = TestApp::new();
    seed_series(&app);

    let response = app.server().get("/api/series").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(body[0]["releaseDate"], "2008-01-20");
    assert_eq!(body[1]["series_id"], 11);
    assert_eq!(body[1]["rating"], "9.3");

    app.server().get("/api/series").await.assert_status_ok();
    assert_eq!(app.provider.calls("get_series"), 1);

    app.server()
        .get("/api/series")
        .add_query_param("refresh", "true")
        .await
        .assert_status_ok();
    assert_eq!(app.provider.calls("get_series"), 2);

    let stored = app.store.read(SnapshotKind::Series).await.unwrap().unwrap();
    let stored: Value = serde_json::from_slice(&stored).unwrap();
    assert_eq!(stored.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_series_detail() {
    let app = TestApp::new();
    app.provider.respond(
        "get_series_info",
        json!({
            "seasons": [{"season_number": 1, "name": "Season 1", "episode_count": "2"}],
            "info": {"name": "Breaking Bad", "plot": "Chemistry.", "backdrop_path": []},
            "episodes": {
                "1": [
                    {"id": "9001", "episode_num": 1, "title": "Breaking Bad - S01E01 - Pilot", "container_extension": "mkv", "season": 1,
                     "info": {"duration": "00:58:00", "plot": "Walt starts cooking."}},
                    {"id": "9002", "episode_num": 2, "title": "Breaking Bad - S01E02", "container_extension": "mkv", "season": 1, "info": []}
                ]
            }
        }),
    );

    let response = app.server().get("/api/series/10").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["info"]["name"], "Breaking Bad");
    assert_eq!(body["episodes"]["1"][0]["id"], "9001");
    assert_eq!(body["episodes"]["1"][0]["info"]["duration"], "00:58:00");
    assert_eq!(body["seasons"][0]["episode_count"], 2);
    assert_eq!(
        app.provider.last_params("get_series_info"),
        Some(vec![("series_id".to_string(), "10".to_string())])
    );
}

#[tokio::test]
async fn test_series_detail_without_info_is_404() {
    let app = TestApp::new();
    app.provider
        .respond("get_series_info", json!({"info": [], "episodes": []}));

    let response = app.server().get("/api/series/999").await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_series_search_is_live_and_case_insensitive() {
    let app = TestApp::new();
    seed_series(&app);

    let response = app.server().get("/api/series/search/BAD").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Breaking Bad"]);

    let response = app.server().get("/api/series/search/be").await;
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 2);

    assert_eq!(app.provider.calls("get_series"), 2);
    assert!(!app.store.contains(SnapshotKind::Series));
}

#[tokio::test]
async fn test_series_search_skips_records_without_ids() {
    let app = TestApp::new();
    app.provider.respond(
        "get_series",
        json!([
            {"series_id": 7, "name": "The Wire"},
            {"series_id": "", "name": "Placeholder"}
        ]),
    );

    let response = app.server().get("/api/series/search/wire").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["series_id"], 7);
    assert_eq!(body[0]["name"], "The Wire");
}

#[tokio::test]
async fn test_categories_passthrough() {
    let app = TestApp::new();
    app.provider.respond(
        "get_series_categories",
        json!([{"category_id": 7, "category_name": "Drama", "parent_id": 0}]),
    );

    let response = app.server().get("/api/categories/series").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        body,
        json!([{"category_id": "7", "category_name": "Drama", "parent_id": 0}])
    );
}

#[tokio::test]
async fn test_unknown_category_type_is_400() {
    let app = TestApp::new();

    let response = app.server().get("/api/categories/radio").await;

    response.assert_status_bad_request();
    assert_eq!(app.provider.calls("get_radio_categories"), 0);
}
