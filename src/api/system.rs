//! System and catalog-wide endpoints.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, SystemStatus};
use crate::models::CatalogSummary;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ready: bool,
    pub database: bool,
}

/// `GET /api/system/status`
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    let catalog = state.catalog().catalog_summary().await?;

    Ok(Json(ApiResponse::success(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        user: user.0,
        catalog,
    })))
}

/// `GET /api/catalog/summary`
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CatalogSummary>>, ApiError> {
    let summary = state.catalog().catalog_summary().await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// `GET /api/system/health`
///
/// Unauthenticated readiness probe.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let database = state.store().ping().await.is_ok();
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::success(HealthResponse {
            ready: database,
            database,
        })),
    )
        .into_response()
}
