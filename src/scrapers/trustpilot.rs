use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ScraperError;
use crate::models::{BatchOutcome, BusinessSummary, EnrichedBusiness, ListingResult};
use crate::scrapers::batch::enrich_batch;
use crate::scrapers::fetch::HttpFetcher;
use crate::scrapers::listing::fetch_listing;
use crate::scrapers::profile::enrich_business;
use crate::scrapers::traits::{Enricher, PageFetcher};
use crate::scrapers::types::{ListingSource, ScraperConfig};

/// Listing and enrichment against the reviews site.
pub struct TrustpilotScraper<F = HttpFetcher> {
    fetcher: F,
    config: ScraperConfig,
}

impl TrustpilotScraper<HttpFetcher> {
    /// Scraper over HTTP with the given settings.
    pub fn new(config: ScraperConfig) -> Result<Self, ScraperError> {
        let fetcher = HttpFetcher::new(config.timeout_secs)?;
        Ok(Self::with_fetcher(fetcher, config))
    }
}

impl<F: PageFetcher> TrustpilotScraper<F> {
    pub fn with_fetcher(fetcher: F, config: ScraperConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// One page of a category or search listing.
    pub async fn fetch_listing(
        &self,
        source: &ListingSource,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<ListingResult, ScraperError> {
        fetch_listing(&self.fetcher, &self.config, source, page, cancel).await
    }

    /// Enrich a single business. Never fails; see [`enrich_business`].
    pub async fn enrich_one(
        &self,
        business: &BusinessSummary,
        cancel: &CancellationToken,
    ) -> EnrichedBusiness {
        enrich_business(&self.fetcher, &self.config, business, cancel).await
    }

    /// Enrich up to `config.max_batch` businesses sequentially.
    pub async fn enrich_batch(
        &self,
        businesses: &[BusinessSummary],
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome, ScraperError> {
        enrich_batch(
            self,
            businesses,
            self.config.max_batch,
            self.config.batch_delay,
            cancel,
        )
        .await
    }
}

#[async_trait]
impl<F: PageFetcher> Enricher for TrustpilotScraper<F> {
    async fn enrich(
        &self,
        business: &BusinessSummary,
        cancel: &CancellationToken,
    ) -> Result<EnrichedBusiness, ScraperError> {
        Ok(self.enrich_one(business, cancel).await)
    }
}
