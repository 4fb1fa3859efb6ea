//! Catalog change events.
//!
//! Published on the event bus after a mutation commits. Subscribers (the SSE
//! endpoint, playlist watchers) only ever observe committed state.

use serde::Serialize;

use super::{CascadePolicy, ChannelId, ChannelStatus, PlaylistId};
use crate::models::PlaylistStats;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum CatalogEvent {
    ChannelCreated {
        channel_id: ChannelId,
        playlist_id: Option<PlaylistId>,
    },
    ChannelUpdated {
        channel_id: ChannelId,
        playlist_id: Option<PlaylistId>,
        previous_playlist_id: Option<PlaylistId>,
    },
    ChannelChecked {
        channel_id: ChannelId,
        playlist_id: Option<PlaylistId>,
        status: ChannelStatus,
        checked_by: String,
    },
    ChannelDeleted {
        channel_id: ChannelId,
        playlist_id: Option<PlaylistId>,
    },
    ChannelsImported {
        playlist_id: PlaylistId,
        count: usize,
    },

    PlaylistCreated {
        playlist_id: PlaylistId,
    },
    PlaylistUpdated {
        playlist_id: PlaylistId,
    },
    PlaylistDeleted {
        playlist_id: PlaylistId,
        policy: CascadePolicy,
        affected_channels: u64,
    },
    StatsRecomputed {
        playlist_id: PlaylistId,
        stats: PlaylistStats,
    },
}

impl CatalogEvent {
    /// Returns true if the event may change what a watcher of `playlist`
    /// sees: the playlist record itself or any of its member channels.
    #[must_use]
    pub fn touches_playlist(&self, playlist: &PlaylistId) -> bool {
        let is = |id: &Option<PlaylistId>| id.as_ref() == Some(playlist);
        match self {
            Self::ChannelCreated { playlist_id, .. }
            | Self::ChannelChecked { playlist_id, .. }
            | Self::ChannelDeleted { playlist_id, .. } => is(playlist_id),
            Self::ChannelUpdated {
                playlist_id,
                previous_playlist_id,
                ..
            } => is(playlist_id) || is(previous_playlist_id),
            Self::ChannelsImported { playlist_id, .. }
            | Self::PlaylistCreated { playlist_id }
            | Self::PlaylistUpdated { playlist_id }
            | Self::PlaylistDeleted { playlist_id, .. }
            | Self::StatsRecomputed { playlist_id, .. } => playlist_id == playlist,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_move_touches_both_playlists() {
        let event = CatalogEvent::ChannelUpdated {
            channel_id: ChannelId::from("c"),
            playlist_id: Some(PlaylistId::from("new")),
            previous_playlist_id: Some(PlaylistId::from("old")),
        };
        assert!(event.touches_playlist(&PlaylistId::from("new")));
        assert!(event.touches_playlist(&PlaylistId::from("old")));
        assert!(!event.touches_playlist(&PlaylistId::from("other")));
    }

    #[test]
    fn unassigned_channel_touches_nothing() {
        let event = CatalogEvent::ChannelCreated {
            channel_id: ChannelId::from("c"),
            playlist_id: None,
        };
        assert!(!event.touches_playlist(&PlaylistId::from("p")));
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = CatalogEvent::PlaylistCreated {
            playlist_id: PlaylistId::from("p1"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PlaylistCreated");
        assert_eq!(json["payload"]["playlist_id"], "p1");
    }
}
