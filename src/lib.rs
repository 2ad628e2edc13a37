//! Find businesses on a reviews site and enrich them with contact and social
//! details for outreach.
//!
//! [`TrustpilotScraper`] is the entry point: fetch listing pages, then enrich
//! the businesses you care about one small batch at a time.

pub mod error;
pub mod export;
pub mod models;
pub mod normalize;
pub mod rate_limit;
pub mod scrapers;

pub use error::ScraperError;
pub use models::{
    BatchError, BatchOutcome, BusinessRecord, BusinessSummary, EnrichedBusiness, ListingResult,
    MorePages, Platform, Review, SocialLinks,
};
pub use scrapers::{Enricher, HttpFetcher, ListingSource, PageFetcher, ScraperConfig, TrustpilotScraper};
