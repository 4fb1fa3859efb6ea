//! Playlist command handlers

use crate::domain::{CascadePolicy, PlaylistId};
use crate::models::NewPlaylist;
use crate::state::SharedState;

pub async fn cmd_playlist_list(state: &SharedState) -> anyhow::Result<()> {
    let playlists = state.catalog.list_playlists().await?;

    if playlists.is_empty() {
        println!("No playlists yet.");
        println!();
        println!("Create one with: chanarr playlist add \"name\" --url <m3u url>");
        return Ok(());
    }

    println!("Playlists ({} total)", playlists.len());
    println!("{:-<70}", "");

    for playlist in playlists {
        let indicator = if playlist.enabled { "●" } else { "○" };
        println!(
            "{} {} [{} channels]",
            indicator, playlist.name, playlist.channel_count
        );
        println!(
            "  ID: {} | active {} | pending {} | inactive {} | broken {}",
            playlist.id,
            playlist.stats.active,
            playlist.stats.pending,
            playlist.stats.inactive,
            playlist.stats.broken
        );
        if let Some(url) = &playlist.url {
            println!("  Source: {url}");
        }
    }

    println!();
    println!("Legend: ● Enabled | ○ Disabled");

    Ok(())
}

pub async fn cmd_playlist_add(
    state: &SharedState,
    name: &str,
    url: Option<String>,
    disabled: bool,
) -> anyhow::Result<()> {
    let playlist = state
        .catalog
        .create_playlist(NewPlaylist {
            name: name.to_string(),
            url,
            enabled: Some(!disabled),
        })
        .await?;

    println!("✓ Created playlist {} ({})", playlist.name, playlist.id);
    Ok(())
}

pub async fn cmd_playlist_remove(state: &SharedState, id: &str) -> anyhow::Result<()> {
    let removal = state.catalog.delete_playlist(&PlaylistId::from(id)).await?;

    match removal.policy {
        CascadePolicy::Cascade => println!(
            "✓ Removed playlist {id} and {} channel(s)",
            removal.affected_channels
        ),
        CascadePolicy::Orphan => println!(
            "✓ Removed playlist {id}; {} channel(s) kept without a playlist",
            removal.affected_channels
        ),
    }
    Ok(())
}

pub async fn cmd_playlist_toggle(
    state: &SharedState,
    id: &str,
    enabled: bool,
) -> anyhow::Result<()> {
    let playlist = state
        .catalog
        .set_playlist_enabled(&PlaylistId::from(id), enabled)
        .await?;

    let label = if playlist.enabled { "enabled" } else { "disabled" };
    println!("✓ Playlist {} is now {label}", playlist.name);
    Ok(())
}
