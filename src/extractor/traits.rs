use anyhow::Result;
use async_trait::async_trait;

/// A way of obtaining the HTML of a platform page
///
/// This trait isolates the scraper from how a page is fetched (plain HTTP,
/// headless browser, canned fixtures in tests).
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Returns a unique identifier for this source (e.g., "direct-http", "headless-chromium")
    fn id(&self) -> &'static str;

    /// Fetches the page body as text
    ///
    /// A body without the embedded payload is still `Ok`; the caller decides
    /// whether it is usable.
    async fn fetch_page(&self, url: &str) -> Result<String>;
}
