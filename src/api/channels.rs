use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, ChannelQuery, DeleteResult};
use crate::domain::ChannelId;
use crate::models::{Channel, ChannelPatch, NewChannel};

pub async fn list_channels(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChannelQuery>,
) -> Result<Json<ApiResponse<Vec<Channel>>>, ApiError> {
    let channels = state.catalog().list_channels(query.into()).await?;
    Ok(Json(ApiResponse::success(channels)))
}

pub async fn create_channel(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewChannel>,
) -> Result<(StatusCode, Json<ApiResponse<Channel>>), ApiError> {
    let channel = state.catalog().create_channel(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(channel))))
}

pub async fn get_channel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Channel>>, ApiError> {
    let channel = state.catalog().get_channel(&ChannelId::from(id)).await?;
    Ok(Json(ApiResponse::success(channel)))
}

pub async fn update_channel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<ChannelPatch>,
) -> Result<Json<ApiResponse<Channel>>, ApiError> {
    let channel = state
        .catalog()
        .update_channel(&ChannelId::from(id), patch)
        .await?;
    Ok(Json(ApiResponse::success(channel)))
}

/// Deleting an unknown channel succeeds with `deleted: false`.
pub async fn delete_channel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeleteResult>>, ApiError> {
    let deleted = state.catalog().delete_channel(&ChannelId::from(id)).await?;
    Ok(Json(ApiResponse::success(DeleteResult { deleted })))
}

/// POST /channels/{id}/check
/// Probes the stream now and records the outcome under the caller's name.
pub async fn check_channel(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Channel>>, ApiError> {
    let channel = state
        .checker()
        .check_channel(&ChannelId::from(id), user.name())
        .await?;
    Ok(Json(ApiResponse::success(channel)))
}
