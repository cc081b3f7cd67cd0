//! Scraper configuration

use crate::extractor::endpoints::DEFAULT_SHORT_LINK_HOSTS;
use crate::utils::error::{Result, ScrapeError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.tiktok.com";
pub const DEFAULT_API_BASE_URL: &str = "https://api16-normal-c-useast1a.tiktokv.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Scraper settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Web origin serving video, user and tag pages plus the feed APIs
    pub base_url: String,

    /// Origin of the mobile feed API used for watermark-free URLs
    pub api_base_url: String,

    /// User-Agent sent with every direct request
    pub user_agent: String,

    /// Hosts of share links that redirect to a video page
    pub short_link_hosts: Vec<String>,

    /// Netscape-format cookie export loaded once at construction
    pub cookie_file: Option<PathBuf>,

    /// Items requested per feed page
    pub page_size: usize,

    /// Fall back to a headless browser when the direct page lacks the payload
    pub browser_fallback: bool,

    /// Default destination for bulk downloads
    pub download_dir: PathBuf,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            short_link_hosts: DEFAULT_SHORT_LINK_HOSTS.iter().map(|h| h.to_string()).collect(),
            cookie_file: None,
            page_size: 30,
            browser_fallback: true,
            download_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from("./downloads")),
        }
    }
}

impl ScraperConfig {
    /// Enforce sane minimums and check that both origins are absolute URLs
    pub fn validated(mut self) -> Result<Self> {
        if self.page_size == 0 {
            self.page_size = 1;
        }
        for origin in [&mut self.base_url, &mut self.api_base_url] {
            Url::parse(origin).map_err(|e| ScrapeError::InvalidUrl(format!("{origin}: {e}")))?;
            // Paths are appended with a leading slash
            while origin.ends_with('/') {
                origin.pop();
            }
        }
        if self.user_agent.trim().is_empty() {
            self.user_agent = DEFAULT_USER_AGENT.to_string();
        }
        Ok(self)
    }
}
