use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ChannelId, ChannelStatus, PlaylistId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub url: String,
    pub status: ChannelStatus,
    pub playlist_id: Option<PlaylistId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_checked: Option<DateTime<Utc>>,
    /// Identity of the administrator who last verified the status.
    pub checked_by: Option<String>,
}

/// Input for creating a single channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChannel {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub status: Option<ChannelStatus>,
    #[serde(default)]
    pub playlist_id: Option<PlaylistId>,
}

/// One row of a bulk import. The playlist comes from the import call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChannelRecord {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub status: Option<ChannelStatus>,
}

impl NewChannelRecord {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            status: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChannelPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<ChannelStatus>,
    /// `Some(None)` detaches the channel from its playlist.
    #[serde(default, deserialize_with = "super::double_option")]
    pub playlist_id: Option<Option<PlaylistId>>,
}

impl ChannelPatch {
    #[must_use]
    pub fn status(status: ChannelStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChannelFilter {
    #[serde(default)]
    pub status: Option<ChannelStatus>,
    #[serde(default)]
    pub playlist_id: Option<PlaylistId>,
}

impl ChannelFilter {
    #[must_use]
    pub fn playlist(id: PlaylistId) -> Self {
        Self {
            status: None,
            playlist_id: Some(id),
        }
    }
}
