//! On-demand reachability checks for channel streams.

use crate::config::CheckerConfig;
use crate::domain::{ChannelId, ChannelStatus, PlaylistId};
use crate::models::{Channel, ChannelFilter, PlaylistStats};
use crate::services::catalog_service::{CatalogError, CatalogService};
use futures::stream::{self, StreamExt};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Result of checking every channel of one playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub playlist_id: Option<PlaylistId>,
    pub checked: usize,
    /// Channels whose url scheme cannot be probed over HTTP.
    pub skipped: usize,
    /// Status counts of the checked channels only.
    pub results: PlaylistStats,
}

/// Maps an HTTP answer to a channel status.
#[must_use]
pub fn classify(status: StatusCode) -> ChannelStatus {
    if status.is_success() || status.is_redirection() {
        ChannelStatus::Active
    } else {
        ChannelStatus::Broken
    }
}

/// Only http(s) urls are probed.
#[must_use]
pub fn is_probeable(raw: &str) -> bool {
    url::Url::parse(raw).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

pub struct ChannelChecker {
    catalog: Arc<dyn CatalogService>,
    client: Client,
    max_concurrent: usize,
}

impl ChannelChecker {
    pub fn new(catalog: Arc<dyn CatalogService>, config: &CheckerConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            catalog,
            client,
            max_concurrent: config.max_concurrent_checks.max(1),
        })
    }

    /// Probes `url`. Returns `None` for urls that are not probed.
    pub async fn probe(&self, url: &str) -> Option<ChannelStatus> {
        if !is_probeable(url) {
            return None;
        }

        let status = match self.request(Method::HEAD, url).await {
            Ok(StatusCode::METHOD_NOT_ALLOWED) => match self.request(Method::GET, url).await {
                Ok(code) => classify(code),
                Err(e) => {
                    debug!(url, error = %e, "Channel probe failed");
                    ChannelStatus::Inactive
                }
            },
            Ok(code) => classify(code),
            Err(e) => {
                debug!(url, error = %e, "Channel probe failed");
                ChannelStatus::Inactive
            }
        };

        Some(status)
    }

    async fn request(&self, method: Method, url: &str) -> Result<StatusCode, reqwest::Error> {
        // The body is never read; dropping the response closes the stream.
        let response = self.client.request(method, url).send().await?;
        Ok(response.status())
    }

    /// Probes one channel and records the result under `actor`.
    pub async fn check_channel(
        &self,
        id: &ChannelId,
        actor: &str,
    ) -> Result<Channel, CatalogError> {
        let channel = self.catalog.get_channel(id).await?;

        match self.probe(&channel.url).await {
            Some(status) => self.catalog.record_check(id, status, actor).await,
            None => Err(CatalogError::validation(format!(
                "channel {id} has a url that cannot be probed: {}",
                channel.url
            ))),
        }
    }

    /// Probes every channel of `playlist` with bounded concurrency.
    pub async fn check_playlist(
        &self,
        playlist: &PlaylistId,
        actor: &str,
    ) -> Result<CheckReport, CatalogError> {
        self.catalog.get_playlist(playlist).await?;
        let channels = self
            .catalog
            .list_channels(ChannelFilter::playlist(playlist.clone()))
            .await?;

        let (probeable, skipped): (Vec<Channel>, Vec<Channel>) = channels
            .into_iter()
            .partition(|channel| is_probeable(&channel.url));

        let outcomes: Vec<(ChannelId, ChannelStatus)> = stream::iter(probeable)
            .map(|channel| async move {
                let status = self.probe(&channel.url).await;
                (channel.id, status.unwrap_or(ChannelStatus::Inactive))
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut report = CheckReport {
            playlist_id: Some(playlist.clone()),
            checked: 0,
            skipped: skipped.len(),
            results: PlaylistStats::default(),
        };

        for (id, status) in outcomes {
            match self.catalog.record_check(&id, status, actor).await {
                Ok(_) => {
                    report.checked += 1;
                    report.results.add(status, 1);
                }
                // Deleted while the probe was in flight.
                Err(CatalogError::NotFound { .. }) => report.skipped += 1,
                Err(e) => return Err(e),
            }
        }

        info!(
            playlist_id = %playlist,
            checked = report.checked,
            skipped = report.skipped,
            active = report.results.active,
            broken = report.results.broken,
            "Playlist check finished"
        );

        Ok(report)
    }
}
