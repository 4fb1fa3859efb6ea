//! M3U import, source refresh and channel checks against a local HTTP server.

use axum::Router;
use axum::http::{Method, StatusCode};
use axum::routing::{any, get};
use chanarr::config::{CatalogConfig, CheckerConfig};
use chanarr::db::Store;
use chanarr::domain::{ChannelStatus, PlaylistId};
use chanarr::models::{ChannelFilter, NewChannel, NewChannelRecord, NewPlaylist};
use chanarr::services::{
    CatalogError, CatalogService, ChannelChecker, SeaOrmCatalogService, SourceService,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;

const NEWS_M3U: &str = "#EXTM3U\n\
#EXTINF:-1 tvg-id=\"one\" group-title=\"News\",News One\n\
http://streams.test/news1\n\
#EXTINF:-1 group-title=\"News\",News Two\n\
http://streams.test/news2\n\
#EXTINF:-1,News One Again\n\
http://streams.test/news1\n";

async fn catalog() -> Arc<dyn CatalogService> {
    let store = Store::new("sqlite::memory:").await.unwrap();
    let (bus, _) = broadcast::channel(64);
    Arc::new(SeaOrmCatalogService::new(
        store,
        CatalogConfig::default(),
        bus,
    ))
}

fn sources(catalog: &Arc<dyn CatalogService>, max_body_bytes: usize) -> SourceService {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    SourceService::with_client(catalog.clone(), client, max_body_bytes)
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn stream_server() -> SocketAddr {
    let app = Router::new()
        .route("/list.m3u", get(|| async { NEWS_M3U }))
        .route("/ok", get(|| async { "stream" }))
        .route("/gone", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/get-only",
            any(|method: Method| async move {
                if method == Method::HEAD {
                    StatusCode::METHOD_NOT_ALLOWED
                } else {
                    StatusCode::OK
                }
            }),
        );
    serve(app).await
}

/// An address nothing listens on.
async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

#[tokio::test]
async fn import_skips_urls_already_present() {
    let catalog = catalog().await;
    let playlist = catalog
        .create_playlist(NewPlaylist::named("News"))
        .await
        .unwrap();
    let sources = sources(&catalog, 1024 * 1024);

    let first = sources.import_m3u(&playlist.id, NEWS_M3U).await.unwrap();
    assert_eq!(first.parsed, 3);
    assert_eq!(first.imported, 2);
    assert_eq!(first.skipped, 1);

    let second = sources.import_m3u(&playlist.id, NEWS_M3U).await.unwrap();
    assert_eq!(second.imported, 0);
    assert_eq!(second.skipped, 3);

    let channels = catalog
        .list_channels(ChannelFilter::playlist(playlist.id.clone()))
        .await
        .unwrap();
    let names: Vec<&str> = channels.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["News One", "News Two"]);
    assert_eq!(
        catalog.get_playlist(&playlist.id).await.unwrap().channel_count,
        2
    );
}

#[tokio::test]
async fn import_into_missing_playlist_fails() {
    let catalog = catalog().await;
    let err = sources(&catalog, 1024)
        .import_m3u(&PlaylistId::from("missing"), NEWS_M3U)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
}

#[tokio::test]
async fn refresh_downloads_the_source_url() {
    let addr = stream_server().await;
    let catalog = catalog().await;
    let playlist = catalog
        .create_playlist(NewPlaylist {
            name: "Remote".to_string(),
            url: Some(format!("http://{addr}/list.m3u")),
            enabled: None,
        })
        .await
        .unwrap();

    let summary = sources(&catalog, 1024 * 1024)
        .refresh(&playlist.id)
        .await
        .unwrap();
    assert_eq!(summary.playlist_id, Some(playlist.id.clone()));
    assert_eq!(summary.imported, 2);

    let again = sources(&catalog, 1024 * 1024)
        .refresh(&playlist.id)
        .await
        .unwrap();
    assert_eq!(again.imported, 0);
}

#[tokio::test]
async fn refresh_reports_source_problems() {
    let addr = stream_server().await;
    let catalog = catalog().await;

    let no_url = catalog
        .create_playlist(NewPlaylist::named("Local"))
        .await
        .unwrap();
    let err = sources(&catalog, 1024).refresh(&no_url.id).await.unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));

    let missing = catalog
        .create_playlist(NewPlaylist {
            name: "Missing".to_string(),
            url: Some(format!("http://{addr}/gone")),
            enabled: None,
        })
        .await
        .unwrap();
    let err = sources(&catalog, 1024).refresh(&missing.id).await.unwrap_err();
    assert!(matches!(err, CatalogError::Source(_)));

    let oversized = catalog
        .create_playlist(NewPlaylist {
            name: "Big".to_string(),
            url: Some(format!("http://{addr}/list.m3u")),
            enabled: None,
        })
        .await
        .unwrap();
    let err = sources(&catalog, 16).refresh(&oversized.id).await.unwrap_err();
    assert!(matches!(err, CatalogError::Source(msg) if msg.contains("byte limit")));
    assert_eq!(
        catalog.get_playlist(&oversized.id).await.unwrap().channel_count,
        0
    );
}

#[tokio::test]
async fn probe_maps_responses_to_statuses() {
    let addr = stream_server().await;
    let closed = closed_addr().await;
    let checker = ChannelChecker::new(catalog().await, &CheckerConfig::default()).unwrap();

    assert_eq!(
        checker.probe(&format!("http://{addr}/ok")).await,
        Some(ChannelStatus::Active)
    );
    assert_eq!(
        checker.probe(&format!("http://{addr}/gone")).await,
        Some(ChannelStatus::Broken)
    );
    assert_eq!(
        checker.probe(&format!("http://{addr}/get-only")).await,
        Some(ChannelStatus::Active)
    );
    assert_eq!(
        checker.probe(&format!("http://{closed}/ok")).await,
        Some(ChannelStatus::Inactive)
    );
    assert_eq!(checker.probe("rtmp://streams.test/live").await, None);
}

#[tokio::test]
async fn check_playlist_records_every_probe() {
    let addr = stream_server().await;
    let catalog = catalog().await;
    let playlist = catalog
        .create_playlist(NewPlaylist::named("Checked"))
        .await
        .unwrap();
    catalog
        .bulk_import_channels(
            &playlist.id,
            vec![
                NewChannelRecord::new("Up", format!("http://{addr}/ok")),
                NewChannelRecord::new("Down", format!("http://{addr}/gone")),
                NewChannelRecord::new("Rtmp", "rtmp://streams.test/live"),
            ],
        )
        .await
        .unwrap();

    let checker = ChannelChecker::new(catalog.clone(), &CheckerConfig::default()).unwrap();
    let report = checker.check_playlist(&playlist.id, "ops").await.unwrap();

    assert_eq!(report.checked, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.results.active, 1);
    assert_eq!(report.results.broken, 1);

    let stats = catalog.get_playlist(&playlist.id).await.unwrap().stats;
    assert_eq!(stats.active, 1);
    assert_eq!(stats.broken, 1);
    assert_eq!(stats.pending, 1);

    let channels = catalog
        .list_channels(ChannelFilter::playlist(playlist.id.clone()))
        .await
        .unwrap();
    for channel in channels {
        if channel.name == "Rtmp" {
            assert!(channel.checked_by.is_none());
        } else {
            assert_eq!(channel.checked_by.as_deref(), Some("ops"));
            assert!(channel.last_checked.is_some());
        }
    }
}

#[tokio::test]
async fn check_channel_rejects_unprobeable_urls() {
    let catalog = catalog().await;
    let channel = catalog
        .create_channel(NewChannel {
            name: "Udp".to_string(),
            url: "udp://239.0.0.1:1234".to_string(),
            ..NewChannel::default()
        })
        .await
        .unwrap();

    let checker = ChannelChecker::new(catalog.clone(), &CheckerConfig::default()).unwrap();
    let err = checker.check_channel(&channel.id, "ops").await.unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));
}
