pub mod channel;
pub mod playlist;

pub use channel::{Channel, ChannelFilter, ChannelPatch, NewChannel, NewChannelRecord};
pub use playlist::{
    CatalogSummary, NewPlaylist, Playlist, PlaylistPatch, PlaylistRemoval, PlaylistSnapshot,
    PlaylistStats,
};

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) when deserializing patches.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}
