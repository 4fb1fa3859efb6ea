use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Channel;
use crate::domain::{CascadePolicy, ChannelStatus, PlaylistId};

/// Per-status counts of a playlist's member channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistStats {
    pub pending: u64,
    pub active: u64,
    pub inactive: u64,
    pub broken: u64,
}

impl PlaylistStats {
    /// Counts statuses from an iterator.
    ///
    /// ```
    /// use chanarr::domain::ChannelStatus;
    /// use chanarr::models::PlaylistStats;
    ///
    /// let stats = PlaylistStats::tally([ChannelStatus::Active, ChannelStatus::Pending]);
    /// assert_eq!(stats.total(), 2);
    /// assert_eq!(stats.active, 1);
    /// ```
    pub fn tally(statuses: impl IntoIterator<Item = ChannelStatus>) -> Self {
        statuses.into_iter().fold(Self::default(), |mut stats, s| {
            stats.add(s, 1);
            stats
        })
    }

    pub const fn add(&mut self, status: ChannelStatus, count: u64) {
        match status {
            ChannelStatus::Pending => self.pending += count,
            ChannelStatus::Active => self.active += count,
            ChannelStatus::Inactive => self.inactive += count,
            ChannelStatus::Broken => self.broken += count,
        }
    }

    #[must_use]
    pub const fn get(&self, status: ChannelStatus) -> u64 {
        match status {
            ChannelStatus::Pending => self.pending,
            ChannelStatus::Active => self.active,
            ChannelStatus::Inactive => self.inactive,
            ChannelStatus::Broken => self.broken,
        }
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.pending + self.active + self.inactive + self.broken
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    /// Source the playlist was (or can be) fetched from.
    pub url: Option<String>,
    pub enabled: bool,
    /// Always equal to `stats.total()`.
    pub channel_count: u64,
    pub stats: PlaylistStats,
    pub added_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlaylist {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl NewPlaylist {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlaylistPatch {
    #[serde(default)]
    pub name: Option<String>,
    /// `Some(None)` clears the source url.
    #[serde(default, deserialize_with = "super::double_option")]
    pub url: Option<Option<String>>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// Outcome of a playlist deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistRemoval {
    pub playlist_id: PlaylistId,
    pub policy: CascadePolicy,
    /// Channels deleted (cascade) or detached (orphan).
    pub affected_channels: u64,
}

/// A playlist together with its member channels, as seen by watchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistSnapshot {
    pub playlist: Playlist,
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub playlists: u64,
    pub enabled_playlists: u64,
    pub channels: u64,
    pub unassigned_channels: u64,
    pub stats: PlaylistStats,
}
