// src/services/client.rs

//! Fetch client for region pages.
//!
//! One GET per call, bounded by the client timeout. Transport outcomes are
//! mapped onto [`ScrapeError`]; retries are left to the coordinator's
//! schedule.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::models::ScraperConfig;
use crate::utils::http::create_async_client;
use crate::utils::region_url;

/// Source of raw region markup.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page for a region path.
    async fn fetch(&self, region_path: &str) -> std::result::Result<String, ScrapeError>;
}

/// HTTP implementation of [`PageSource`].
#[derive(Debug, Clone)]
pub struct P2000Client {
    client: Client,
    base_url: Url,
}

impl P2000Client {
    /// Create a client from the scraper settings.
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
            base_url: Url::parse(&config.base_url)?,
        })
    }

    /// Page URL for a region path.
    pub fn url_for(&self, region_path: &str) -> std::result::Result<Url, ScrapeError> {
        region_url(&self.base_url, region_path)
            .map_err(|e| ScrapeError::connection(self.base_url.as_str(), e))
    }
}

#[async_trait]
impl PageSource for P2000Client {
    async fn fetch(&self, region_path: &str) -> std::result::Result<String, ScrapeError> {
        let url = self.url_for(region_path)?;
        log::debug!("Requesting P2000 data from: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            log::warn!("Received 404 for {}, likely invalid region path", url);
            return Err(ScrapeError::no_data(
                region_path,
                format!("invalid region path (404) at {url}"),
            ));
        }
        if !status.is_success() {
            return Err(ScrapeError::connection(
                url.as_str(),
                format!("unexpected HTTP status {}", status.as_u16()),
            ));
        }

        response.text().await.map_err(|e| transport_error(&url, e))
    }
}

fn transport_error(url: &Url, error: reqwest::Error) -> ScrapeError {
    if error.is_timeout() {
        log::error!("Timeout while requesting {}", url);
        ScrapeError::connection(url.as_str(), "timeout")
    } else {
        log::error!("Communication error while requesting {}: {}", url, error);
        ScrapeError::connection(url.as_str(), error)
    }
}
