use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, BulkImportRequest, ToggleRequest};
use crate::domain::PlaylistId;
use crate::models::{
    Channel, NewPlaylist, Playlist, PlaylistPatch, PlaylistRemoval, PlaylistStats,
};
use crate::services::{CheckReport, ImportSummary};

pub async fn list_playlists(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Playlist>>>, ApiError> {
    let playlists = state.catalog().list_playlists().await?;
    Ok(Json(ApiResponse::success(playlists)))
}

pub async fn create_playlist(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewPlaylist>,
) -> Result<(StatusCode, Json<ApiResponse<Playlist>>), ApiError> {
    let playlist = state.catalog().create_playlist(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(playlist))))
}

pub async fn get_playlist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Playlist>>, ApiError> {
    let playlist = state.catalog().get_playlist(&PlaylistId::from(id)).await?;
    Ok(Json(ApiResponse::success(playlist)))
}

pub async fn update_playlist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<PlaylistPatch>,
) -> Result<Json<ApiResponse<Playlist>>, ApiError> {
    let playlist = state
        .catalog()
        .update_playlist(&PlaylistId::from(id), patch)
        .await?;
    Ok(Json(ApiResponse::success(playlist)))
}

/// DELETE /playlists/{id}
/// Member channels are deleted or detached according to the configured policy.
pub async fn delete_playlist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PlaylistRemoval>>, ApiError> {
    let removal = state
        .catalog()
        .delete_playlist(&PlaylistId::from(id))
        .await?;
    Ok(Json(ApiResponse::success(removal)))
}

pub async fn toggle_playlist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<ApiResponse<Playlist>>, ApiError> {
    let playlist = state
        .catalog()
        .set_playlist_enabled(&PlaylistId::from(id), payload.enabled)
        .await?;
    Ok(Json(ApiResponse::success(playlist)))
}

/// POST /playlists/{id}/channels
/// All records are created or none are.
pub async fn import_channels(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<BulkImportRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<Channel>>>), ApiError> {
    let channels = state
        .catalog()
        .bulk_import_channels(&PlaylistId::from(id), payload.channels)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(channels))))
}

/// POST /playlists/{id}/m3u
/// Body is the raw M3U document.
pub async fn import_m3u(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: String,
) -> Result<Json<ApiResponse<ImportSummary>>, ApiError> {
    let summary = state
        .sources()
        .import_m3u(&PlaylistId::from(id), &body)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

pub async fn refresh_playlist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ImportSummary>>, ApiError> {
    let summary = state.sources().refresh(&PlaylistId::from(id)).await?;
    Ok(Json(ApiResponse::success(summary)))
}

pub async fn recompute_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PlaylistStats>>, ApiError> {
    let stats = state
        .catalog()
        .recompute_playlist_stats(&PlaylistId::from(id))
        .await?;
    Ok(Json(ApiResponse::success(stats)))
}

pub async fn check_playlist(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CheckReport>>, ApiError> {
    let report = state
        .checker()
        .check_playlist(&PlaylistId::from(id), user.name())
        .await?;
    Ok(Json(ApiResponse::success(report)))
}
