//! Catalog summary command handler

use crate::state::SharedState;

pub async fn cmd_summary(state: &SharedState) -> anyhow::Result<()> {
    let summary = state.catalog.catalog_summary().await?;

    println!("Catalog");
    println!("{:-<40}", "");
    println!(
        "Playlists:  {} ({} enabled)",
        summary.playlists, summary.enabled_playlists
    );
    println!(
        "Channels:   {} ({} without playlist)",
        summary.channels, summary.unassigned_channels
    );
    println!("  Active:   {}", summary.stats.active);
    println!("  Pending:  {}", summary.stats.pending);
    println!("  Inactive: {}", summary.stats.inactive);
    println!("  Broken:   {}", summary.stats.broken);

    Ok(())
}
