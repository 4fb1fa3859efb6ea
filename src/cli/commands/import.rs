//! M3U import command handlers

use anyhow::Context;
use std::path::Path;

use crate::domain::PlaylistId;
use crate::services::ImportSummary;
use crate::state::SharedState;

fn print_summary(summary: &ImportSummary) {
    println!(
        "✓ Imported {} of {} entries ({} already present)",
        summary.imported, summary.parsed, summary.skipped
    );
}

pub async fn cmd_import_m3u(
    state: &SharedState,
    playlist: &str,
    file: &Path,
) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read playlist file: {}", file.display()))?;

    let summary = state
        .sources
        .import_m3u(&PlaylistId::from(playlist), &text)
        .await?;

    print_summary(&summary);
    Ok(())
}

pub async fn cmd_refresh_playlist(state: &SharedState, playlist: &str) -> anyhow::Result<()> {
    let summary = state.sources.refresh(&PlaylistId::from(playlist)).await?;
    print_summary(&summary);
    Ok(())
}
