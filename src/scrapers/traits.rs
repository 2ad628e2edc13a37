use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ScraperError;
use crate::models::{BusinessSummary, EnrichedBusiness};

/// Fetches a page body. Implemented over HTTP by [`super::HttpFetcher`];
/// anything else (fixtures, caches) can stand in.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` and return its body, or [`ScraperError::Cancelled`] once
    /// `cancel` fires.
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<String, ScraperError>;
}

/// Turns a listed business into an enriched one.
///
/// An `Err` means the call itself failed; implementations that degrade to
/// defaults should return `Ok` with whatever they managed to collect.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(
        &self,
        business: &BusinessSummary,
        cancel: &CancellationToken,
    ) -> Result<EnrichedBusiness, ScraperError>;
}
