use serde::{Deserialize, Serialize};

use crate::domain::{ChannelStatus, PlaylistId};
use crate::models::{CatalogSummary, ChannelFilter, NewChannelRecord};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Query string of `GET /channels`.
#[derive(Debug, Default, Deserialize)]
pub struct ChannelQuery {
    pub status: Option<ChannelStatus>,
    pub playlist_id: Option<PlaylistId>,
}

impl From<ChannelQuery> for ChannelFilter {
    fn from(query: ChannelQuery) -> Self {
        Self {
            status: query.status,
            playlist_id: query.playlist_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkImportRequest {
    pub channels: Vec<NewChannelRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub user: String,
    pub catalog: CatalogSummary,
}
