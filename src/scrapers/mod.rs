pub mod batch;
pub mod fetch;
pub mod jsonld;
pub mod listing;
pub mod profile;
pub mod social;
pub mod traits;
pub mod trustpilot;
pub mod types;

pub use fetch::HttpFetcher;
pub use traits::{Enricher, PageFetcher};
pub use trustpilot::TrustpilotScraper;
pub use types::{ListingSource, ScraperConfig};
