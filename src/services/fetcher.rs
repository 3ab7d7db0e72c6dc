// src/services/fetcher.rs

//! Page fetcher service.
//!
//! Downloads tracked pages and hands their HTML to the [`Extractor`].

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;

use crate::error::Result;
use crate::models::{Config, PageSnapshot, TrackedPage};
use crate::services::extract::Extractor;
use crate::utils::http;

/// Source of page snapshots.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch and extract one tracked page.
    ///
    /// Returns `None` on any network or parse failure; the failure is logged
    /// rather than raised.
    async fn fetch_page(&self, page: &TrackedPage) -> Option<PageSnapshot>;
}

/// Fetcher that downloads pages over HTTP.
pub struct HttpFetcher {
    client: Client,
    extractor: Extractor,
}

impl HttpFetcher {
    /// Create a fetcher with the configured HTTP client and extraction rules.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: http::create_client(&config.http)?,
            extractor: Extractor::new(&config.extraction)?,
        })
    }

    /// Fetch a page, surfacing every failure.
    pub async fn try_fetch_page(&self, page: &TrackedPage) -> Result<PageSnapshot> {
        let check_time = Utc::now();
        let html = http::fetch_text(&self.client, &page.url).await?;
        let snapshot = self.extractor.extract(page, &html)?;
        Ok(snapshot.with_check_time(check_time))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, page: &TrackedPage) -> Option<PageSnapshot> {
        log::debug!("Fetching {} ({})", page.label(), page.url);

        match self.try_fetch_page(page).await {
            Ok(snapshot) => {
                log::info!("Found {} items on {}", snapshot.len(), page.label());
                Some(snapshot)
            }
            Err(error) => {
                log::warn!("Failed to fetch {} ({}): {}", page.label(), page.url, error);
                None
            }
        }
    }
}
