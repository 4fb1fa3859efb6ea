//! Live views of a playlist as a stream of snapshots.
//!
//! A watch is a plain `Stream`: it does nothing until polled, and dropping it
//! unsubscribes. Calling [`watch_playlist`] again starts over from a fresh
//! snapshot, so a consumer that fell behind can always restart.

use crate::domain::PlaylistId;
use crate::domain::events::CatalogEvent;
use crate::models::PlaylistSnapshot;
use crate::services::catalog_service::{CatalogError, CatalogService};
use futures::stream::{self, Stream};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum PlaylistUpdate {
    Snapshot(PlaylistSnapshot),
    /// The playlist was deleted. Always the last item of a watch.
    Removed { playlist_id: PlaylistId },
}

enum WatchState {
    Idle {
        catalog: Arc<dyn CatalogService>,
        bus: broadcast::Sender<CatalogEvent>,
        playlist: PlaylistId,
    },
    Live {
        catalog: Arc<dyn CatalogService>,
        rx: broadcast::Receiver<CatalogEvent>,
        playlist: PlaylistId,
    },
    Done,
}

enum Change {
    Refresh,
    Removed,
    Closed,
}

/// Watches `playlist`: yields the current snapshot first, then a fresh one
/// after every committed change affecting it.
///
/// The stream ends after [`PlaylistUpdate::Removed`], after an error, or when
/// the event bus shuts down.
pub fn watch_playlist(
    catalog: Arc<dyn CatalogService>,
    bus: &broadcast::Sender<CatalogEvent>,
    playlist: PlaylistId,
) -> impl Stream<Item = Result<PlaylistUpdate, CatalogError>> + Send + use<> {
    let initial = WatchState::Idle {
        catalog,
        bus: bus.clone(),
        playlist,
    };

    stream::unfold(initial, |state| async move {
        match state {
            WatchState::Idle {
                catalog,
                bus,
                playlist,
            } => {
                // Subscribe before reading so no commit falls between the two.
                let rx = bus.subscribe();
                emit_snapshot(catalog, rx, playlist).await
            }
            WatchState::Live {
                catalog,
                mut rx,
                playlist,
            } => match next_change(&mut rx, &playlist).await {
                Change::Refresh => emit_snapshot(catalog, rx, playlist).await,
                Change::Removed => Some((
                    Ok(PlaylistUpdate::Removed {
                        playlist_id: playlist,
                    }),
                    WatchState::Done,
                )),
                Change::Closed => None,
            },
            WatchState::Done => None,
        }
    })
}

async fn emit_snapshot(
    catalog: Arc<dyn CatalogService>,
    rx: broadcast::Receiver<CatalogEvent>,
    playlist: PlaylistId,
) -> Option<(Result<PlaylistUpdate, CatalogError>, WatchState)> {
    match catalog.playlist_snapshot(&playlist).await {
        Ok(snapshot) => Some((
            Ok(PlaylistUpdate::Snapshot(snapshot)),
            WatchState::Live {
                catalog,
                rx,
                playlist,
            },
        )),
        Err(CatalogError::NotFound { .. }) => Some((
            Ok(PlaylistUpdate::Removed {
                playlist_id: playlist,
            }),
            WatchState::Done,
        )),
        Err(e) => {
            warn!(playlist_id = %playlist, error = %e, "Playlist watch failed");
            Some((Err(e), WatchState::Done))
        }
    }
}

fn is_removal(event: &CatalogEvent, playlist: &PlaylistId) -> bool {
    matches!(event, CatalogEvent::PlaylistDeleted { playlist_id, .. } if playlist_id == playlist)
}

/// Waits for the next relevant event, then folds any already queued ones
/// into the same refresh.
async fn next_change(rx: &mut broadcast::Receiver<CatalogEvent>, playlist: &PlaylistId) -> Change {
    loop {
        match rx.recv().await {
            Ok(event) if is_removal(&event, playlist) => return Change::Removed,
            Ok(event) if event.touches_playlist(playlist) => break,
            Ok(_) => {}
            Err(RecvError::Lagged(missed)) => {
                debug!(playlist_id = %playlist, missed, "Playlist watcher lagged, resyncing");
                break;
            }
            Err(RecvError::Closed) => return Change::Closed,
        }
    }

    loop {
        match rx.try_recv() {
            Ok(event) if is_removal(&event, playlist) => return Change::Removed,
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => return Change::Refresh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CascadePolicy, ChannelId};

    #[tokio::test]
    async fn queued_events_fold_into_one_refresh() {
        let (tx, mut rx) = broadcast::channel(16);
        let playlist = PlaylistId::from("p1");

        for n in 0..3 {
            tx.send(CatalogEvent::ChannelCreated {
                channel_id: ChannelId::from(format!("c{n}")),
                playlist_id: Some(playlist.clone()),
            })
            .unwrap();
        }

        assert!(matches!(next_change(&mut rx, &playlist).await, Change::Refresh));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unrelated_events_are_ignored_until_removal() {
        let (tx, mut rx) = broadcast::channel(16);
        let playlist = PlaylistId::from("p1");

        tx.send(CatalogEvent::PlaylistUpdated {
            playlist_id: PlaylistId::from("other"),
        })
        .unwrap();
        tx.send(CatalogEvent::PlaylistDeleted {
            playlist_id: playlist.clone(),
            policy: CascadePolicy::Cascade,
            affected_channels: 0,
        })
        .unwrap();

        assert!(matches!(next_change(&mut rx, &playlist).await, Change::Removed));
    }

    #[tokio::test]
    async fn closed_bus_ends_the_watch() {
        let (tx, mut rx) = broadcast::channel::<CatalogEvent>(4);
        drop(tx);
        assert!(matches!(
            next_change(&mut rx, &PlaylistId::from("p1")).await,
            Change::Closed
        ));
    }
}
