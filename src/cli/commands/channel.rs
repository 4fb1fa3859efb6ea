//! Channel command handlers

use anyhow::Context;

use crate::domain::{ChannelId, ChannelStatus, PlaylistId};
use crate::models::{ChannelFilter, NewChannel};
use crate::state::SharedState;

const fn status_indicator(status: ChannelStatus) -> &'static str {
    match status {
        ChannelStatus::Active => "🟢",
        ChannelStatus::Pending => "•",
        ChannelStatus::Inactive => "○",
        ChannelStatus::Broken => "✗",
    }
}

pub async fn cmd_channel_list(
    state: &SharedState,
    playlist: Option<&str>,
    status: Option<&str>,
) -> anyhow::Result<()> {
    let status = status
        .map(str::parse::<ChannelStatus>)
        .transpose()
        .context("Use one of: pending, active, inactive, broken")?;

    let channels = state
        .catalog
        .list_channels(ChannelFilter {
            status,
            playlist_id: playlist.map(PlaylistId::from),
        })
        .await?;

    if channels.is_empty() {
        println!("No channels found.");
        return Ok(());
    }

    println!("Channels ({} total)", channels.len());
    println!("{:-<70}", "");

    for channel in channels {
        println!(
            "{} {} [{}]",
            status_indicator(channel.status),
            channel.name,
            channel.status
        );
        println!("  ID: {} | {}", channel.id, channel.url);
        if let (Some(at), Some(by)) = (channel.last_checked, &channel.checked_by) {
            println!("  Checked {} by {by}", at.format("%Y-%m-%d %H:%M"));
        }
    }

    println!();
    println!("Legend: 🟢 Active | • Pending | ○ Inactive | ✗ Broken");

    Ok(())
}

pub async fn cmd_channel_add(
    state: &SharedState,
    name: &str,
    url: &str,
    playlist: Option<&str>,
) -> anyhow::Result<()> {
    let channel = state
        .catalog
        .create_channel(NewChannel {
            name: name.to_string(),
            url: url.to_string(),
            status: None,
            playlist_id: playlist.map(PlaylistId::from),
        })
        .await?;

    println!("✓ Created channel {} ({})", channel.name, channel.id);
    Ok(())
}

pub async fn cmd_channel_remove(state: &SharedState, id: &str) -> anyhow::Result<()> {
    if state.catalog.delete_channel(&ChannelId::from(id)).await? {
        println!("✓ Removed channel {id}");
    } else {
        println!("Channel {id} does not exist, nothing to remove");
    }
    Ok(())
}
