use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::domain::events::CatalogEvent;
use crate::services::{CatalogService, ChannelChecker, SourceService};
use crate::state::SharedState;

pub mod auth;
mod channels;
mod error;
pub mod events;
mod observability;
mod playlists;
mod system;
mod types;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::{RwLock, broadcast};

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    /// Header carrying the proxy-authenticated user name.
    pub user_header: String,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    #[must_use]
    pub fn event_bus(&self) -> &broadcast::Sender<CatalogEvent> {
        &self.shared.event_bus
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn CatalogService> {
        &self.shared.catalog
    }

    #[must_use]
    pub fn sources(&self) -> &Arc<SourceService> {
        &self.shared.sources
    }

    #[must_use]
    pub fn checker(&self) -> &Arc<ChannelChecker> {
        &self.shared.checker
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    let user_header = shared.config.read().await.server.user_header.clone();

    Arc::new(AppState {
        shared,
        user_header,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle).await)
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state
        .config()
        .read()
        .await
        .server
        .cors_allowed_origins
        .clone();

    let api_router = Router::new()
        .merge(create_protected_router(state.clone()))
        .route("/system/health", get(system::health))
        .route("/auth/decision", get(auth::route_decision))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::track_requests))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/channels",
            get(channels::list_channels).post(channels::create_channel),
        )
        .route(
            "/channels/{id}",
            get(channels::get_channel)
                .patch(channels::update_channel)
                .delete(channels::delete_channel),
        )
        .route("/channels/{id}/check", post(channels::check_channel))
        .route(
            "/playlists",
            get(playlists::list_playlists).post(playlists::create_playlist),
        )
        .route(
            "/playlists/{id}",
            get(playlists::get_playlist)
                .patch(playlists::update_playlist)
                .delete(playlists::delete_playlist),
        )
        .route("/playlists/{id}/toggle", put(playlists::toggle_playlist))
        .route("/playlists/{id}/channels", post(playlists::import_channels))
        .route("/playlists/{id}/m3u", post(playlists::import_m3u))
        .route("/playlists/{id}/refresh", post(playlists::refresh_playlist))
        .route("/playlists/{id}/recompute", post(playlists::recompute_stats))
        .route("/playlists/{id}/check", post(playlists::check_playlist))
        .route("/catalog/summary", get(system::get_summary))
        .route("/system/status", get(system::get_status))
        .route("/auth/me", get(auth::get_current_user))
        .route("/metrics", get(observability::get_metrics))
        .merge(events::router())
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
