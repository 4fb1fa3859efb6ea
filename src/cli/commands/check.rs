//! Channel check command handler

use crate::domain::PlaylistId;
use crate::state::SharedState;

pub async fn cmd_check_playlist(
    state: &SharedState,
    playlist: &str,
    actor: &str,
) -> anyhow::Result<()> {
    println!("Checking channels of playlist {playlist}...");

    let report = state
        .checker
        .check_playlist(&PlaylistId::from(playlist), actor)
        .await?;

    println!(
        "✓ Checked {} channel(s), skipped {}",
        report.checked, report.skipped
    );
    println!(
        "  active {} | inactive {} | broken {}",
        report.results.active, report.results.inactive, report.results.broken
    );
    Ok(())
}
