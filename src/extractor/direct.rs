//! Plain HTTP access to the platform

use crate::extractor::traits::PageSource;
use crate::utils::cookies::SessionCookies;
use crate::utils::error::{FetchStage, Result, ScrapeError};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, REFERER};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Direct HTTP source with a browser user-agent.
///
/// Session cookies are offered per request URL, so they only reach the hosts,
/// paths and schemes they were issued for.
pub struct DirectSource {
    client: Client,
    referer: String,
}

impl DirectSource {
    /// Build the HTTP client
    pub fn new(user_agent: &str, referer: &str, cookies: Arc<SessionCookies>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_provider(cookies)
            .build()?;

        Ok(Self {
            client,
            referer: referer.to_string(),
        })
    }

    /// The underlying client, shared with the download engine
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn get(&self, url: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header(REFERER, &self.referer)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
    }

    /// GET a JSON API endpoint (feed pages, watermark-free lookups).
    ///
    /// A 404 is reported as `NotFound`, other error statuses as `Fetch`.
    pub async fn get_json(&self, url: &str) -> Result<Value> {
        debug!("GET json {}", url);
        let response = self.get(url).send().await.map_err(|e| ScrapeError::Fetch {
            url: url.to_string(),
            stage: FetchStage::Direct,
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ScrapeError::NotFound(format!("{url}: HTTP {status}")));
        }
        if !status.is_success() {
            return Err(ScrapeError::Fetch {
                url: url.to_string(),
                stage: FetchStage::Direct,
                reason: format!("HTTP error: {status}"),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(ScrapeError::Parse(format!("empty response from {url}")));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Follow redirects of a share link and return where it lands
    pub async fn resolve_redirects(&self, url: &str) -> Result<String> {
        let response = self.get(url).send().await?;
        let landed = response.url().to_string();
        debug!("Resolved {} -> {}", url, landed);
        Ok(landed)
    }
}

#[async_trait]
impl PageSource for DirectSource {
    fn id(&self) -> &'static str {
        "direct-http"
    }

    async fn fetch_page(&self, url: &str) -> anyhow::Result<String> {
        let response = self
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {}", response.status()));
        }

        response.text().await.context("failed to read page body")
    }
}
