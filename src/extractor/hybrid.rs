use crate::extractor::payload::contains_payload;
use crate::extractor::traits::PageSource;
use crate::utils::error::{FetchStage, Result, ScrapeError};
use std::sync::Arc;
use tracing::{debug, error, info};

/// The fetch strategy selector
///
/// Pages are fetched with the primary (direct) source first. Only when its body
/// lacks the embedded payload, or the request itself failed, is the page rendered
/// once through the fallback source. There are no further retries.
pub struct HybridFetcher {
    primary: Arc<dyn PageSource>,
    fallback: Option<Arc<dyn PageSource>>,
}

impl HybridFetcher {
    /// Create a new HybridFetcher with the given primary source and optional fallback
    pub fn new(primary: Arc<dyn PageSource>, fallback: Option<Arc<dyn PageSource>>) -> Self {
        Self { primary, fallback }
    }

    /// Fetch a page that must carry the embedded payload
    pub async fn fetch(&self, url: &str, use_fallback: bool) -> Result<String> {
        let mut stage = FetchStage::Direct;
        let mut source = &self.primary;

        loop {
            debug!("Fetching {} via {} ({} stage)", url, source.id(), stage);
            let reason = match attempt(source.as_ref(), url).await {
                Ok(html) => return Ok(html),
                Err(reason) => reason,
            };

            match (stage, self.fallback.as_ref()) {
                (FetchStage::Direct, Some(fallback)) if use_fallback => {
                    info!(
                        "Primary source {} failed: {}. Retrying with fallback {}...",
                        source.id(),
                        reason,
                        fallback.id()
                    );
                    stage = FetchStage::Rendered;
                    source = fallback;
                }
                _ => {
                    error!("Giving up on {} after {} stage: {}", url, stage, reason);
                    return Err(ScrapeError::Fetch {
                        url: url.to_string(),
                        stage,
                        reason,
                    });
                }
            }
        }
    }
}

/// One strategy attempt; the body only counts when the payload marker is present
async fn attempt(source: &dyn PageSource, url: &str) -> std::result::Result<String, String> {
    match source.fetch_page(url).await {
        Ok(html) if contains_payload(&html) => Ok(html),
        Ok(html) => Err(format!(
            "{} returned {} bytes without the embedded payload",
            source.id(),
            html.len()
        )),
        Err(e) => Err(format!("{:#}", e)),
    }
}
