use serde::{Deserialize, Serialize};

use crate::rate_limit::DelayRange;

pub const DEFAULT_BASE_URL: &str = "https://www.trustpilot.com";

/// Settings shared by the listing scraper and the profile enricher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Origin of the reviews site, without a trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// How many profile pages past the first to walk while counting recent reviews
    pub max_extra_pages: u32,
    /// Delay before each extra profile page
    pub page_delay: DelayRange,
    /// Delay before each business in a batch
    pub batch_delay: DelayRange,
    /// Card count at which a category page is assumed to continue
    pub category_page_size: usize,
    /// Card count at which a search page is assumed to continue
    pub search_page_size: usize,
    /// Largest batch `enrich_batch` accepts
    pub max_batch: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            max_extra_pages: 5,
            page_delay: DelayRange::new(300, 600),
            batch_delay: DelayRange::new(200, 500),
            category_page_size: 20,
            search_page_size: 10,
            max_batch: 5,
        }
    }
}

impl ScraperConfig {
    /// Point the scraper somewhere else, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Drop all politeness delays.
    pub fn without_delays(mut self) -> Self {
        self.page_delay = DelayRange::none();
        self.batch_delay = DelayRange::none();
        self
    }

    /// Canonical profile page for a business.
    pub fn profile_url(&self, domain: &str) -> String {
        format!("{}/review/{}", self.base_url, domain)
    }
}

/// Which kind of listing page to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingSource {
    Category { slug: String },
    Search { query: String },
}

impl ListingSource {
    pub fn category(slug: impl Into<String>) -> Self {
        ListingSource::Category { slug: slug.into() }
    }

    pub fn search(query: impl Into<String>) -> Self {
        ListingSource::Search {
            query: query.into(),
        }
    }

    /// `"<slug>"` for categories, `"search:<query>"` for searches.
    pub fn label(&self) -> String {
        match self {
            ListingSource::Category { slug } => slug.clone(),
            ListingSource::Search { query } => format!("search:{query}"),
        }
    }

    /// Card count at which this kind of page is assumed to have a successor.
    pub fn page_size(&self, config: &ScraperConfig) -> usize {
        match self {
            ListingSource::Category { .. } => config.category_page_size,
            ListingSource::Search { .. } => config.search_page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_base_url_trims_trailing_slash() {
        let config = ScraperConfig::default().with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.profile_url("acme.com"), "http://127.0.0.1:9000/review/acme.com");
    }

    #[test]
    fn labels_and_thresholds_follow_source_kind() {
        let config = ScraperConfig::default();
        let category = ListingSource::category("electronics_technology");
        let search = ListingSource::search("acme");
        assert_eq!(category.label(), "electronics_technology");
        assert_eq!(search.label(), "search:acme");
        assert_eq!(category.page_size(&config), 20);
        assert_eq!(search.page_size(&config), 10);
    }
}
