use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use chanarr::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const USER: &str = "alice";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    let state = chanarr::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    chanarr::api::router(state).await
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Forwarded-User", USER);

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn create_playlist(app: &Router, name: &str) -> String {
    let response = send(app, "POST", "/api/playlists", Some(json!({ "name": name }))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_auth_required() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Authentication required");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .header("X-Forwarded-User", "   ")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, "GET", "/api/system/status", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["user"], USER);
    assert_eq!(body["data"]["catalog"]["playlists"], 0);
}

#[tokio::test]
async fn test_public_endpoints() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["database"], true);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/decision?access=protected")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["user"], Value::Null);
    assert_eq!(body["data"]["decision"]["decision"], "redirect");
    assert_eq!(body["data"]["decision"]["to"], "/login");

    let response = send(&app, "GET", "/api/auth/decision?access=entry", None).await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["user"], USER);
    assert_eq!(body["data"]["decision"]["to"], "/");

    let response = send(&app, "GET", "/api/auth/me", None).await;
    assert_eq!(json_body(response).await["data"], USER);
}

#[tokio::test]
async fn test_playlist_crud() {
    let app = spawn_app().await;
    let id = create_playlist(&app, "News").await;

    let response = send(&app, "GET", "/api/playlists", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["channel_count"], 0);
    assert_eq!(body["data"][0]["enabled"], true);

    let response = send(
        &app,
        "PATCH",
        &format!("/api/playlists/{id}"),
        Some(json!({ "name": "World News", "url": "http://lists.test/news.m3u" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["name"], "World News");
    assert_eq!(body["data"]["url"], "http://lists.test/news.m3u");

    let response = send(
        &app,
        "PUT",
        &format!("/api/playlists/{id}/toggle"),
        Some(json!({ "enabled": false })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["enabled"], false);

    let response = send(&app, "DELETE", &format!("/api/playlists/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["policy"], "cascade");
    assert_eq!(body["data"]["affected_channels"], 0);

    let response = send(&app, "GET", &format!("/api/playlists/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["success"], false);
}

#[tokio::test]
async fn test_channel_lifecycle() {
    let app = spawn_app().await;
    let playlist = create_playlist(&app, "Sports").await;

    let response = send(
        &app,
        "POST",
        "/api/channels",
        Some(json!({
            "name": "Arena",
            "url": "http://streams.test/arena",
            "playlist_id": playlist,
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let channel = json_body(response).await["data"].clone();
    assert_eq!(channel["status"], "pending");
    let channel_id = channel["id"].as_str().unwrap().to_string();

    let response = send(
        &app,
        "PATCH",
        &format!("/api/channels/{channel_id}"),
        Some(json!({ "status": "active" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["status"], "active");

    let response = send(&app, "GET", &format!("/api/playlists/{playlist}"), None).await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["channel_count"], 1);
    assert_eq!(body["data"]["stats"]["active"], 1);
    assert_eq!(body["data"]["stats"]["pending"], 0);

    let response = send(&app, "GET", "/api/channels?status=active", None).await;
    assert_eq!(json_body(response).await["data"].as_array().unwrap().len(), 1);

    let response = send(
        &app,
        "GET",
        &format!("/api/channels?status=broken&playlist_id={playlist}"),
        None,
    )
    .await;
    assert!(json_body(response).await["data"].as_array().unwrap().is_empty());

    let response = send(&app, "DELETE", &format!("/api/channels/{channel_id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["deleted"], true);

    let response = send(&app, "DELETE", &format!("/api/channels/{channel_id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["deleted"], false);

    let response = send(&app, "GET", &format!("/api/channels/{channel_id}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_validation_errors() {
    let app = spawn_app().await;

    let response = send(
        &app,
        "POST",
        "/api/channels",
        Some(json!({ "name": " ", "url": "http://streams.test/x" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("name"));

    let response = send(
        &app,
        "POST",
        "/api/channels",
        Some(json!({
            "name": "Ghost",
            "url": "http://streams.test/ghost",
            "playlist_id": "missing",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "POST", "/api/playlists", Some(json!({ "name": "" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bulk_import() {
    let app = spawn_app().await;
    let playlist = create_playlist(&app, "Movies").await;

    let response = send(
        &app,
        "POST",
        &format!("/api/playlists/{playlist}/channels"),
        Some(json!({
            "channels": [
                { "name": "One", "url": "http://streams.test/1" },
                { "name": "Two", "url": "http://streams.test/2", "status": "broken" },
            ]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_body(response).await["data"].as_array().unwrap().len(), 2);

    let response = send(
        &app,
        "POST",
        &format!("/api/playlists/{playlist}/channels"),
        Some(json!({
            "channels": [
                { "name": "Three", "url": "http://streams.test/3" },
                { "name": "", "url": "http://streams.test/4" },
            ]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", &format!("/api/playlists/{playlist}"), None).await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["channel_count"], 2);
    assert_eq!(body["data"]["stats"]["broken"], 1);

    let response = send(
        &app,
        "POST",
        "/api/playlists/missing/channels",
        Some(json!({ "channels": [{ "name": "x", "url": "y" }] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        "POST",
        &format!("/api/playlists/{playlist}/recompute"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["pending"], 1);
}

#[tokio::test]
async fn test_m3u_upload_and_refresh_without_source() {
    let app = spawn_app().await;
    let playlist = create_playlist(&app, "Uploaded").await;

    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/playlists/{playlist}/m3u"))
        .header("X-Forwarded-User", USER)
        .header(header::CONTENT_TYPE, "audio/x-mpegurl")
        .body(Body::from(
            "#EXTM3U\n#EXTINF:-1,First\nhttp://streams.test/a\n#EXTINF:-1,Second\nhttp://streams.test/b\n",
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["parsed"], 2);
    assert_eq!(body["data"]["imported"], 2);

    let response = send(
        &app,
        "POST",
        &format!("/api/playlists/{playlist}/refresh"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_summary_and_metrics() {
    let app = spawn_app().await;
    let playlist = create_playlist(&app, "Counted").await;
    send(
        &app,
        "POST",
        &format!("/api/playlists/{playlist}/channels"),
        Some(json!({ "channels": [{ "name": "a", "url": "http://streams.test/a" }] })),
    )
    .await;

    let response = send(&app, "GET", "/api/catalog/summary", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["playlists"], 1);
    assert_eq!(body["data"]["channels"], 1);
    assert_eq!(body["data"]["stats"]["pending"], 1);

    let response = send(&app, "GET", "/api/metrics", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("Metrics not enabled"));
}
