// Upstream provider - bridges the API client with the ListingSource trait
use std::time::Duration;

use async_trait::async_trait;
use govlist_api::UpstreamClient;
use tracing::{info, warn};

use crate::{config::UpstreamConfig, models::Item, source::ListingSource, Error, Result};

/// Wrapper around UpstreamClient that implements ListingSource
pub struct UpstreamSource {
    client: UpstreamClient,
}

impl UpstreamSource {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    /// Build from config. A missing URL is fatal here; a missing API key
    /// isn't, it fails each request instead so the server still comes up.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::ConfigError("upstream.url is not set".into()))?;

        if config.api_key.is_none() {
            warn!("No upstream API key configured; listing requests will fail until one is set");
        }

        let client = UpstreamClient::with_timeout(
            url,
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
        .with_page_size(config.page_size);

        Ok(Self::new(client))
    }
}

#[async_trait]
impl ListingSource for UpstreamSource {
    async fn fetch_all(&self) -> Result<Vec<Item>> {
        let page = self.client.fetch_all().await.map_err(|e| {
            warn!("Upstream fetch failed: {}", e);
            Error::from(e)
        })?;

        info!("Fetched {} records from upstream", page.data.len());
        Ok(page.data)
    }
}
