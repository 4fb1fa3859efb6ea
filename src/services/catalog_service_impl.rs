//! `SeaORM` implementation of the `CatalogService` trait.

use crate::config::CatalogConfig;
use crate::db::{ChannelRepository, PlaylistRepository, Store};
use crate::domain::events::CatalogEvent;
use crate::domain::{CascadePolicy, ChannelId, ChannelStatus, PlaylistId, now};
use crate::models::{
    CatalogSummary, Channel, ChannelFilter, ChannelPatch, NewChannel, NewChannelRecord,
    NewPlaylist, Playlist, PlaylistPatch, PlaylistRemoval, PlaylistSnapshot, PlaylistStats,
};
use crate::services::catalog_service::{
    CatalogError, CatalogService, affected_playlists, optional_text, required_text,
    validate_records,
};
use sea_orm::ConnectionTrait;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

type Recomputed = Vec<(PlaylistId, PlaylistStats)>;

/// Recounts `playlist` and writes the aggregate on `conn`.
///
/// The write only lands if `stats_version` is unchanged since the read;
/// otherwise the attempt fails with [`CatalogError::Conflict`] and the
/// surrounding transaction has to be rerun.
pub async fn recompute_stats_on<C: ConnectionTrait>(
    conn: &C,
    playlist: &PlaylistId,
) -> Result<PlaylistStats, CatalogError> {
    let playlists = PlaylistRepository::new(conn);
    let channels = ChannelRepository::new(conn);

    let version = playlists
        .stats_version(playlist)
        .await?
        .ok_or_else(|| CatalogError::playlist_not_found(playlist))?;

    let stats = channels.status_counts(playlist).await?;

    if !playlists
        .write_stats_if_version(playlist, version, &stats)
        .await?
    {
        return Err(CatalogError::Conflict(format!(
            "stats for playlist {playlist} changed during recomputation"
        )));
    }

    debug!(
        playlist_id = %playlist,
        channel_count = stats.total(),
        "Playlist stats recomputed"
    );
    Ok(stats)
}

fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(25 * u64::from(attempt.min(8)))
}

/// SeaORM-based implementation of [`CatalogService`].
pub struct SeaOrmCatalogService {
    store: Store,
    settings: CatalogConfig,
    event_bus: broadcast::Sender<CatalogEvent>,
    /// SQLite takes one writer at a time; writers of this process queue here
    /// instead of racing for the database lock.
    write_gate: Mutex<()>,
}

impl SeaOrmCatalogService {
    #[must_use]
    pub fn new(
        store: Store,
        settings: CatalogConfig,
        event_bus: broadcast::Sender<CatalogEvent>,
    ) -> Self {
        Self {
            store,
            settings,
            event_bus,
            write_gate: Mutex::new(()),
        }
    }

    #[must_use]
    pub const fn policy(&self) -> CascadePolicy {
        self.settings.playlist_delete_policy
    }

    fn publish(&self, event: CatalogEvent) {
        let _ = self.event_bus.send(event);
    }

    fn publish_stats(&self, recomputed: Recomputed) {
        for (playlist_id, stats) in recomputed {
            self.publish(CatalogEvent::StatsRecomputed { playlist_id, stats });
        }
    }

    /// Runs one write transaction, rerunning it while it fails with
    /// [`CatalogError::Conflict`], at most `stats_max_attempts` times.
    async fn write<T, F, Fut>(
        &self,
        operation: &'static str,
        mut attempt: F,
    ) -> Result<T, CatalogError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CatalogError>>,
    {
        let _gate = self.write_gate.lock().await;
        let max_attempts = self.settings.stats_max_attempts.max(1);

        let mut tries = 1;
        loop {
            match attempt().await {
                Err(CatalogError::Conflict(reason)) if tries < max_attempts => {
                    metrics::counter!("catalog_write_retries_total", "operation" => operation)
                        .increment(1);
                    warn!(
                        operation,
                        attempt = tries,
                        %reason,
                        "Catalog write conflicted, retrying"
                    );
                    tokio::time::sleep(retry_delay(tries)).await;
                    tries += 1;
                }
                Err(CatalogError::Conflict(reason)) => {
                    metrics::counter!("catalog_stats_conflicts_total", "operation" => operation)
                        .increment(1);
                    return Err(CatalogError::Conflict(format!(
                        "{operation} gave up after {max_attempts} attempts: {reason}"
                    )));
                }
                result => return result,
            }
        }
    }

    async fn recompute_all<C: ConnectionTrait>(
        conn: &C,
        playlists: Vec<PlaylistId>,
    ) -> Result<Recomputed, CatalogError> {
        let mut recomputed = Vec::with_capacity(playlists.len());
        for playlist in playlists {
            let stats = recompute_stats_on(conn, &playlist).await?;
            recomputed.push((playlist, stats));
        }
        Ok(recomputed)
    }

    async fn ensure_playlist_reference<C: ConnectionTrait>(
        conn: &C,
        playlist: &PlaylistId,
    ) -> Result<(), CatalogError> {
        if PlaylistRepository::new(conn).exists(playlist).await? {
            Ok(())
        } else {
            Err(CatalogError::missing_playlist_reference(playlist))
        }
    }

    async fn try_create_channel(&self, channel: Channel) -> Result<Recomputed, CatalogError> {
        let txn = self.store.begin().await?;

        if let Some(playlist) = &channel.playlist_id {
            Self::ensure_playlist_reference(&txn, playlist).await?;
        }

        ChannelRepository::new(&txn).insert(&channel).await?;
        let recomputed =
            Self::recompute_all(&txn, channel.playlist_id.iter().cloned().collect()).await?;

        txn.commit().await?;
        Ok(recomputed)
    }

    async fn try_update_channel(
        &self,
        id: &ChannelId,
        patch: ChannelPatch,
    ) -> Result<(Channel, Option<PlaylistId>, Recomputed), CatalogError> {
        let txn = self.store.begin().await?;
        let channels = ChannelRepository::new(&txn);

        let mut channel = channels
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::channel_not_found(id))?;

        let previous_playlist = channel.playlist_id.clone();
        let previous_status = channel.status;

        if let Some(name) = patch.name {
            channel.name = required_text("name", &name)?;
        }
        if let Some(url) = patch.url {
            channel.url = required_text("url", &url)?;
        }
        if let Some(status) = patch.status {
            channel.status = status;
        }
        if let Some(target) = patch.playlist_id {
            if let Some(playlist) = &target {
                Self::ensure_playlist_reference(&txn, playlist).await?;
            }
            channel.playlist_id = target;
        }
        channel.updated_at = now();

        channels.update(&channel).await?;

        let affected = affected_playlists(
            previous_playlist.as_ref(),
            channel.playlist_id.as_ref(),
            previous_status != channel.status,
        );
        let recomputed = Self::recompute_all(&txn, affected).await?;

        txn.commit().await?;
        Ok((channel, previous_playlist, recomputed))
    }

    async fn try_record_check(
        &self,
        id: &ChannelId,
        status: ChannelStatus,
        actor: String,
    ) -> Result<(Channel, Recomputed), CatalogError> {
        let txn = self.store.begin().await?;
        let channels = ChannelRepository::new(&txn);

        let mut channel = channels
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::channel_not_found(id))?;

        let checked_at = now();
        channel.status = status;
        channel.last_checked = Some(checked_at);
        channel.checked_by = Some(actor);
        channel.updated_at = checked_at;

        channels.update(&channel).await?;
        let recomputed =
            Self::recompute_all(&txn, channel.playlist_id.iter().cloned().collect()).await?;

        txn.commit().await?;
        Ok((channel, recomputed))
    }

    async fn try_delete_channel(
        &self,
        id: &ChannelId,
    ) -> Result<Option<(Channel, Recomputed)>, CatalogError> {
        let txn = self.store.begin().await?;
        let channels = ChannelRepository::new(&txn);

        let Some(channel) = channels.get(id).await? else {
            return Ok(None);
        };

        channels.delete(id).await?;
        let recomputed =
            Self::recompute_all(&txn, channel.playlist_id.iter().cloned().collect()).await?;

        txn.commit().await?;
        Ok(Some((channel, recomputed)))
    }

    async fn try_bulk_import(
        &self,
        playlist: &PlaylistId,
        imported: &[Channel],
    ) -> Result<Recomputed, CatalogError> {
        let txn = self.store.begin().await?;

        if !PlaylistRepository::new(&txn).exists(playlist).await? {
            return Err(CatalogError::playlist_not_found(playlist));
        }

        ChannelRepository::new(&txn)
            .insert_many(imported, self.settings.bulk_chunk_size)
            .await?;
        let recomputed = Self::recompute_all(&txn, vec![playlist.clone()]).await?;

        txn.commit().await?;
        Ok(recomputed)
    }

    async fn try_update_playlist(
        &self,
        id: &PlaylistId,
        patch: PlaylistPatch,
    ) -> Result<Playlist, CatalogError> {
        let txn = self.store.begin().await?;
        let playlists = PlaylistRepository::new(&txn);

        let mut playlist = playlists
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::playlist_not_found(id))?;

        if let Some(name) = patch.name {
            playlist.name = required_text("name", &name)?;
        }
        if let Some(url) = patch.url {
            playlist.url = optional_text(url.as_deref());
        }
        if let Some(enabled) = patch.enabled {
            playlist.enabled = enabled;
        }
        playlist.updated_at = now();

        playlists.update_details(&playlist).await?;
        txn.commit().await?;
        Ok(playlist)
    }

    async fn try_delete_playlist(
        &self,
        id: &PlaylistId,
        policy: CascadePolicy,
    ) -> Result<u64, CatalogError> {
        let txn = self.store.begin().await?;
        let playlists = PlaylistRepository::new(&txn);
        let channels = ChannelRepository::new(&txn);

        if !playlists.exists(id).await? {
            return Err(CatalogError::playlist_not_found(id));
        }

        let affected_channels = match policy {
            CascadePolicy::Cascade => channels.delete_for_playlist(id).await?,
            CascadePolicy::Orphan => channels.detach_from_playlist(id, now()).await?,
        };
        playlists.delete(id).await?;

        txn.commit().await?;
        Ok(affected_channels)
    }

    async fn try_recompute(&self, id: &PlaylistId) -> Result<PlaylistStats, CatalogError> {
        let txn = self.store.begin().await?;
        let stats = recompute_stats_on(&txn, id).await?;
        txn.commit().await?;
        Ok(stats)
    }
}

#[async_trait::async_trait]
impl CatalogService for SeaOrmCatalogService {
    async fn create_channel(&self, input: NewChannel) -> Result<Channel, CatalogError> {
        let name = required_text("name", &input.name)?;
        let url = required_text("url", &input.url)?;

        let created_at = now();
        let channel = Channel {
            id: ChannelId::generate(),
            name,
            url,
            status: input.status.unwrap_or_default(),
            playlist_id: input.playlist_id,
            created_at,
            updated_at: created_at,
            last_checked: None,
            checked_by: None,
        };

        let recomputed = self
            .write("create_channel", || self.try_create_channel(channel.clone()))
            .await?;

        info!(channel_id = %channel.id, name = %channel.name, "Channel created");
        self.publish(CatalogEvent::ChannelCreated {
            channel_id: channel.id.clone(),
            playlist_id: channel.playlist_id.clone(),
        });
        self.publish_stats(recomputed);

        Ok(channel)
    }

    async fn get_channel(&self, id: &ChannelId) -> Result<Channel, CatalogError> {
        self.store
            .channels()
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::channel_not_found(id))
    }

    async fn list_channels(&self, filter: ChannelFilter) -> Result<Vec<Channel>, CatalogError> {
        Ok(self.store.channels().list(&filter).await?)
    }

    async fn update_channel(
        &self,
        id: &ChannelId,
        patch: ChannelPatch,
    ) -> Result<Channel, CatalogError> {
        let (channel, previous_playlist, recomputed) = self
            .write("update_channel", || self.try_update_channel(id, patch.clone()))
            .await?;

        debug!(channel_id = %channel.id, status = %channel.status, "Channel updated");
        self.publish(CatalogEvent::ChannelUpdated {
            channel_id: channel.id.clone(),
            playlist_id: channel.playlist_id.clone(),
            previous_playlist_id: previous_playlist,
        });
        self.publish_stats(recomputed);

        Ok(channel)
    }

    async fn record_check(
        &self,
        id: &ChannelId,
        status: ChannelStatus,
        actor: &str,
    ) -> Result<Channel, CatalogError> {
        let actor = required_text("checked_by", actor)?;

        let (channel, recomputed) = self
            .write("record_check", || {
                self.try_record_check(id, status, actor.clone())
            })
            .await?;

        info!(
            channel_id = %channel.id,
            status = %status,
            checked_by = %actor,
            "Channel status checked"
        );
        self.publish(CatalogEvent::ChannelChecked {
            channel_id: channel.id.clone(),
            playlist_id: channel.playlist_id.clone(),
            status,
            checked_by: actor,
        });
        self.publish_stats(recomputed);

        Ok(channel)
    }

    async fn delete_channel(&self, id: &ChannelId) -> Result<bool, CatalogError> {
        let Some((channel, recomputed)) = self
            .write("delete_channel", || self.try_delete_channel(id))
            .await?
        else {
            debug!(channel_id = %id, "Delete of unknown channel ignored");
            return Ok(false);
        };

        info!(channel_id = %id, "Channel deleted");
        self.publish(CatalogEvent::ChannelDeleted {
            channel_id: channel.id,
            playlist_id: channel.playlist_id,
        });
        self.publish_stats(recomputed);

        Ok(true)
    }

    async fn bulk_import_channels(
        &self,
        playlist: &PlaylistId,
        records: Vec<NewChannelRecord>,
    ) -> Result<Vec<Channel>, CatalogError> {
        let records = validate_records(records)?;

        if records.is_empty() {
            return if self.store.playlists().exists(playlist).await? {
                Ok(Vec::new())
            } else {
                Err(CatalogError::playlist_not_found(playlist))
            };
        }

        let created_at = now();
        let imported: Vec<Channel> = records
            .into_iter()
            .map(|record| Channel {
                id: ChannelId::generate(),
                name: record.name,
                url: record.url,
                status: record.status.unwrap_or_default(),
                playlist_id: Some(playlist.clone()),
                created_at,
                updated_at: created_at,
                last_checked: None,
                checked_by: None,
            })
            .collect();

        let recomputed = self
            .write("bulk_import_channels", || {
                self.try_bulk_import(playlist, &imported)
            })
            .await?;

        let count = imported.len();
        metrics::counter!("catalog_channels_imported_total").increment(count as u64);
        info!(playlist_id = %playlist, count, "Channels imported");
        self.publish(CatalogEvent::ChannelsImported {
            playlist_id: playlist.clone(),
            count,
        });
        self.publish_stats(recomputed);

        Ok(imported)
    }

    async fn create_playlist(&self, input: NewPlaylist) -> Result<Playlist, CatalogError> {
        let name = required_text("name", &input.name)?;
        let created_at = now();

        let playlist = Playlist {
            id: PlaylistId::generate(),
            name,
            url: optional_text(input.url.as_deref()),
            enabled: input.enabled.unwrap_or(true),
            channel_count: 0,
            stats: PlaylistStats::default(),
            added_at: created_at,
            created_at,
            updated_at: created_at,
        };

        self.write("create_playlist", || async {
            self.store
                .playlists()
                .insert(&playlist)
                .await
                .map_err(CatalogError::from)
        })
        .await?;

        info!(playlist_id = %playlist.id, name = %playlist.name, "Playlist created");
        self.publish(CatalogEvent::PlaylistCreated {
            playlist_id: playlist.id.clone(),
        });

        Ok(playlist)
    }

    async fn get_playlist(&self, id: &PlaylistId) -> Result<Playlist, CatalogError> {
        self.store
            .playlists()
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::playlist_not_found(id))
    }

    async fn list_playlists(&self) -> Result<Vec<Playlist>, CatalogError> {
        Ok(self.store.playlists().list().await?)
    }

    async fn update_playlist(
        &self,
        id: &PlaylistId,
        patch: PlaylistPatch,
    ) -> Result<Playlist, CatalogError> {
        let playlist = self
            .write("update_playlist", || self.try_update_playlist(id, patch.clone()))
            .await?;

        debug!(playlist_id = %playlist.id, enabled = playlist.enabled, "Playlist updated");
        self.publish(CatalogEvent::PlaylistUpdated {
            playlist_id: playlist.id.clone(),
        });

        Ok(playlist)
    }

    async fn delete_playlist(&self, id: &PlaylistId) -> Result<PlaylistRemoval, CatalogError> {
        let policy = self.policy();
        let affected_channels = self
            .write("delete_playlist", || self.try_delete_playlist(id, policy))
            .await?;

        info!(
            playlist_id = %id,
            ?policy,
            affected_channels,
            "Playlist deleted"
        );
        self.publish(CatalogEvent::PlaylistDeleted {
            playlist_id: id.clone(),
            policy,
            affected_channels,
        });

        Ok(PlaylistRemoval {
            playlist_id: id.clone(),
            policy,
            affected_channels,
        })
    }

    async fn recompute_playlist_stats(
        &self,
        id: &PlaylistId,
    ) -> Result<PlaylistStats, CatalogError> {
        let stats = self
            .write("recompute_playlist_stats", || self.try_recompute(id))
            .await?;

        self.publish_stats(vec![(id.clone(), stats)]);
        Ok(stats)
    }

    async fn playlist_snapshot(&self, id: &PlaylistId) -> Result<PlaylistSnapshot, CatalogError> {
        let txn = self.store.begin().await?;

        let playlist = PlaylistRepository::new(&txn)
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::playlist_not_found(id))?;
        let channels = ChannelRepository::new(&txn)
            .list(&ChannelFilter::playlist(id.clone()))
            .await?;

        txn.commit().await?;

        Ok(PlaylistSnapshot { playlist, channels })
    }

    async fn catalog_summary(&self) -> Result<CatalogSummary, CatalogError> {
        let playlists = self.store.playlists();
        let channels = self.store.channels();

        let (playlist_count, enabled, stats, unassigned) = tokio::try_join!(
            playlists.count(),
            playlists.count_enabled(),
            channels.status_counts_all(),
            channels.count_unassigned(),
        )?;

        Ok(CatalogSummary {
            playlists: playlist_count,
            enabled_playlists: enabled,
            channels: stats.total(),
            unassigned_channels: unassigned,
            stats,
        })
    }
}
