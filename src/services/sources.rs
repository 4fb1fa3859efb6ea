//! Importing channels from M3U playlist sources.

use crate::config::SourcesConfig;
use crate::domain::PlaylistId;
use crate::models::{ChannelFilter, NewChannelRecord};
use crate::services::catalog_service::{CatalogError, CatalogService};
use crate::services::m3u;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of importing one M3U document into a playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub playlist_id: Option<PlaylistId>,
    /// Entries found in the document.
    pub parsed: usize,
    pub imported: usize,
    /// Entries whose url was already in the playlist or repeated in the document.
    pub skipped: usize,
}

pub struct SourceService {
    catalog: Arc<dyn CatalogService>,
    client: Client,
    max_body_bytes: usize,
}

impl SourceService {
    pub fn new(catalog: Arc<dyn CatalogService>, config: &SourcesConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self::with_client(catalog, client, config.max_body_bytes))
    }

    #[must_use]
    pub fn with_client(
        catalog: Arc<dyn CatalogService>,
        client: Client,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            catalog,
            client,
            max_body_bytes,
        }
    }

    /// Parses `text` and bulk-imports every entry whose url is not yet in
    /// the playlist. The import is all-or-nothing.
    pub async fn import_m3u(
        &self,
        playlist: &PlaylistId,
        text: &str,
    ) -> Result<ImportSummary, CatalogError> {
        let entries = m3u::parse_playlist(text);
        let parsed = entries.len();

        // Surfaces NotFound before any parsing result is acted upon.
        self.catalog.get_playlist(playlist).await?;

        let mut seen: HashSet<String> = self
            .catalog
            .list_channels(ChannelFilter::playlist(playlist.clone()))
            .await?
            .into_iter()
            .map(|channel| channel.url)
            .collect();

        let records: Vec<NewChannelRecord> = entries
            .iter()
            .filter(|entry| seen.insert(entry.url.clone()))
            .map(m3u::M3uEntry::to_record)
            .collect();

        let skipped = parsed - records.len();
        let imported = self
            .catalog
            .bulk_import_channels(playlist, records)
            .await?
            .len();

        info!(
            playlist_id = %playlist,
            parsed,
            imported,
            skipped,
            "M3U import finished"
        );

        Ok(ImportSummary {
            playlist_id: Some(playlist.clone()),
            parsed,
            imported,
            skipped,
        })
    }

    /// Downloads the playlist's source url and imports it.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Validation`] if the playlist has no url
    /// - [`CatalogError::Source`] if the download fails or is too large
    pub async fn refresh(&self, playlist: &PlaylistId) -> Result<ImportSummary, CatalogError> {
        let current = self.catalog.get_playlist(playlist).await?;
        let Some(source) = current.url else {
            return Err(CatalogError::validation(format!(
                "playlist {playlist} has no source url"
            )));
        };

        let text = self.fetch(&source).await.map_err(|e| {
            warn!(
                playlist_id = %playlist,
                url = %source,
                error = %e,
                "Playlist source fetch failed"
            );
            e
        })?;

        self.import_m3u(playlist, &text).await
    }

    async fn fetch(&self, source: &str) -> Result<String, CatalogError> {
        let url = url::Url::parse(source)
            .map_err(|e| CatalogError::validation(format!("invalid source url {source}: {e}")))?;

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::Source(format!("request to {source} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Source(format!(
                "{source} answered with HTTP {status}"
            )));
        }

        let too_large = || {
            CatalogError::Source(format!(
                "{source} exceeds the {} byte limit",
                self.max_body_bytes
            ))
        };

        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes as u64)
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| CatalogError::Source(format!("reading {source} failed: {e}")))?
        {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
