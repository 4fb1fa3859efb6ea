//! Domain service for the channel catalog.
//!
//! The catalog owns every write to channels and playlists. Each mutation runs
//! in one database transaction together with the stats recomputation of the
//! playlists it touches, so `Playlist::stats` is never observed stale.

use crate::domain::{ChannelId, ChannelStatus, PlaylistId};
use crate::models::{
    CatalogSummary, Channel, ChannelFilter, ChannelPatch, NewChannel, NewChannelRecord,
    NewPlaylist, Playlist, PlaylistPatch, PlaylistRemoval, PlaylistSnapshot, PlaylistStats,
};
use thiserror::Error;

/// Typed failures returned by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Malformed or missing input, or a reference to a playlist that does not exist.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A write kept losing the race for the database or the stats version
    /// after the bounded retries.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Fetching a remote playlist source failed.
    #[error("Source error: {0}")]
    Source(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl CatalogError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    #[must_use]
    pub fn channel_not_found(id: &ChannelId) -> Self {
        Self::NotFound {
            kind: "Channel",
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn playlist_not_found(id: &PlaylistId) -> Self {
        Self::NotFound {
            kind: "Playlist",
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn missing_playlist_reference(id: &PlaylistId) -> Self {
        Self::Validation(format!("playlist {id} does not exist"))
    }
}

impl From<sea_orm::DbErr> for CatalogError {
    fn from(err: sea_orm::DbErr) -> Self {
        let message = err.to_string();
        if is_lock_contention(&message) {
            Self::Conflict(message)
        } else {
            Self::Database(message)
        }
    }
}

/// SQLite reports a lost race for the write lock as BUSY/LOCKED. The
/// transaction that got it can be rerun as a whole.
fn is_lock_contention(message: &str) -> bool {
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("SQLITE_BUSY")
}

/// Catalog operations consumed by the HTTP layer, the CLI and the
/// source/checker services.
#[async_trait::async_trait]
pub trait CatalogService: Send + Sync {
    /// Creates a channel with a fresh id, `created_at == updated_at == now`
    /// and `status` defaulting to pending.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Validation`] if name or url is blank, or the
    ///   referenced playlist does not exist
    async fn create_channel(&self, input: NewChannel) -> Result<Channel, CatalogError>;

    async fn get_channel(&self, id: &ChannelId) -> Result<Channel, CatalogError>;

    /// Lists channels matching every set field of `filter`. An empty result is
    /// not an error.
    async fn list_channels(&self, filter: ChannelFilter) -> Result<Vec<Channel>, CatalogError>;

    /// Merges `patch` into the channel and bumps `updated_at`. A status or
    /// membership change recomputes the old and new playlists in the same
    /// transaction.
    async fn update_channel(
        &self,
        id: &ChannelId,
        patch: ChannelPatch,
    ) -> Result<Channel, CatalogError>;

    /// Stores the outcome of an administrative status check.
    async fn record_check(
        &self,
        id: &ChannelId,
        status: ChannelStatus,
        actor: &str,
    ) -> Result<Channel, CatalogError>;

    /// Deletes a channel. Returns false, without error, if it did not exist.
    async fn delete_channel(&self, id: &ChannelId) -> Result<bool, CatalogError>;

    /// Creates all records in `playlist`, or none of them.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] if the playlist does not exist
    /// - [`CatalogError::Validation`] naming the first malformed record
    async fn bulk_import_channels(
        &self,
        playlist: &PlaylistId,
        records: Vec<NewChannelRecord>,
    ) -> Result<Vec<Channel>, CatalogError>;

    async fn create_playlist(&self, input: NewPlaylist) -> Result<Playlist, CatalogError>;

    async fn get_playlist(&self, id: &PlaylistId) -> Result<Playlist, CatalogError>;

    async fn list_playlists(&self) -> Result<Vec<Playlist>, CatalogError>;

    async fn update_playlist(
        &self,
        id: &PlaylistId,
        patch: PlaylistPatch,
    ) -> Result<Playlist, CatalogError>;

    async fn set_playlist_enabled(
        &self,
        id: &PlaylistId,
        enabled: bool,
    ) -> Result<Playlist, CatalogError> {
        self.update_playlist(
            id,
            PlaylistPatch {
                enabled: Some(enabled),
                ..PlaylistPatch::default()
            },
        )
        .await
    }

    /// Deletes the playlist and applies the configured cascade policy to its
    /// channels, atomically.
    async fn delete_playlist(&self, id: &PlaylistId) -> Result<PlaylistRemoval, CatalogError>;

    /// Recounts member channels by status and stores the aggregate. Safe to
    /// call redundantly.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Conflict`] if concurrent writers won every attempt
    async fn recompute_playlist_stats(
        &self,
        id: &PlaylistId,
    ) -> Result<PlaylistStats, CatalogError>;

    /// Reads a playlist and its channels from one consistent view.
    async fn playlist_snapshot(&self, id: &PlaylistId) -> Result<PlaylistSnapshot, CatalogError>;

    async fn catalog_summary(&self) -> Result<CatalogSummary, CatalogError>;
}

/// Trims `value` and rejects it if nothing is left.
pub fn required_text(field: &str, value: &str) -> Result<String, CatalogError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::validation(format!(
            "{field} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Blank optional text is stored as absent.
#[must_use]
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Normalizes every record of a bulk import, failing on the first bad one.
pub fn validate_records(
    records: Vec<NewChannelRecord>,
) -> Result<Vec<NewChannelRecord>, CatalogError> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let check = |field: &str, value: &str| {
                required_text(field, value).map_err(|e| match e {
                    CatalogError::Validation(msg) => {
                        CatalogError::Validation(format!("record {index}: {msg}"))
                    }
                    other => other,
                })
            };
            Ok(NewChannelRecord {
                name: check("name", &record.name)?,
                url: check("url", &record.url)?,
                status: record.status,
            })
        })
        .collect()
}

/// Playlists whose stats must be recomputed after a channel moved from
/// `before` to `after`. Empty when neither membership nor status changed.
#[must_use]
pub fn affected_playlists(
    before: Option<&PlaylistId>,
    after: Option<&PlaylistId>,
    status_changed: bool,
) -> Vec<PlaylistId> {
    if before == after && !status_changed {
        return Vec::new();
    }

    let mut ids: Vec<PlaylistId> = before.into_iter().chain(after).cloned().collect();
    ids.dedup();
    ids
}
