use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One business as it appears on a listing page.
///
/// `domain` is the join key between this record and its enriched form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSummary {
    pub name: String,
    pub domain: String,
    pub profile_url: String,
    pub star_rating: f64,
    pub trust_score: f64,
    pub total_reviews: u64,
    #[serde(default)]
    pub location: String,
}

/// Platforms scanned for on a profile page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Facebook,
    Twitter,
    Instagram,
    LinkedIn,
    YouTube,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Facebook,
        Platform::Twitter,
        Platform::Instagram,
        Platform::LinkedIn,
        Platform::YouTube,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Twitter => "twitter",
            Platform::Instagram => "instagram",
            Platform::LinkedIn => "linkedin",
            Platform::YouTube => "youtube",
        }
    }
}

/// Social profile URLs. A missing link is an empty string, never absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SocialLinks {
    pub facebook: String,
    pub twitter: String,
    pub instagram: String,
    pub linkedin: String,
    pub youtube: String,
}

impl SocialLinks {
    pub fn get(&self, platform: Platform) -> &str {
        match platform {
            Platform::Facebook => &self.facebook,
            Platform::Twitter => &self.twitter,
            Platform::Instagram => &self.instagram,
            Platform::LinkedIn => &self.linkedin,
            Platform::YouTube => &self.youtube,
        }
    }

    /// Copy with one platform's link replaced.
    pub fn with(mut self, platform: Platform, url: impl Into<String>) -> Self {
        let slot = match platform {
            Platform::Facebook => &mut self.facebook,
            Platform::Twitter => &mut self.twitter,
            Platform::Instagram => &mut self.instagram,
            Platform::LinkedIn => &mut self.linkedin,
            Platform::YouTube => &mut self.youtube,
        };
        *slot = url.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        Platform::ALL.iter().all(|p| self.get(*p).is_empty())
    }
}

/// A business after its profile page has been visited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedBusiness {
    #[serde(flatten)]
    pub summary: BusinessSummary,
    pub website_url: String,
    pub email: String,
    pub reviews_last_month: u64,
    pub social_links: SocialLinks,
    pub enriched: bool,
}

impl EnrichedBusiness {
    pub fn new(
        summary: BusinessSummary,
        website_url: String,
        email: String,
        reviews_last_month: u64,
        social_links: SocialLinks,
    ) -> Self {
        Self {
            summary,
            website_url,
            email,
            reviews_last_month,
            social_links,
            enriched: true,
        }
    }

    pub fn domain(&self) -> &str {
        &self.summary.domain
    }
}

/// Either form of a business, as handed to the export layer.
///
/// Enriched-only fields only exist on the `Enriched` variant, so nothing can
/// read `reviews_last_month` off a record that was never enriched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BusinessRecord {
    Enriched(EnrichedBusiness),
    Listed(BusinessSummary),
}

impl BusinessRecord {
    pub fn summary(&self) -> &BusinessSummary {
        match self {
            BusinessRecord::Enriched(e) => &e.summary,
            BusinessRecord::Listed(s) => s,
        }
    }
}

/// Whether a listing probably continues on the next page.
///
/// The listing pages don't expose real pagination metadata, so this is a guess
/// based on how many cards came back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MorePages {
    Likely,
    Unlikely,
}

impl MorePages {
    pub fn is_likely(self) -> bool {
        matches!(self, MorePages::Likely)
    }
}

/// One fetched page of a category or search listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingResult {
    pub items: Vec<BusinessSummary>,
    /// Best effort; 0 when the page doesn't say.
    pub total_result_count: u64,
    pub page_number: u32,
    pub has_more_pages: MorePages,
    pub source_label: String,
}

impl ListingResult {
    /// Drop items rated below `min_rating`. A non-positive minimum keeps everything.
    pub fn retain_min_rating(&mut self, min_rating: f64) {
        if min_rating > 0.0 {
            self.items.retain(|b| b.star_rating >= min_rating);
        }
    }
}

/// A review pulled from a profile page's structured data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Review {
    pub published: DateTime<Utc>,
    pub rating: f64,
}

/// A batch item whose enrichment call failed outright.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchError {
    pub domain: String,
    pub error: String,
}

/// Result of enriching a batch. `results` lines up with the input order;
/// a `None` slot has a matching entry in `errors`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub results: Vec<Option<EnrichedBusiness>>,
    pub errors: Vec<BatchError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(domain: &str, rating: f64) -> BusinessSummary {
        BusinessSummary {
            name: domain.to_string(),
            domain: domain.to_string(),
            profile_url: format!("https://www.trustpilot.com/review/{domain}"),
            star_rating: rating,
            trust_score: rating,
            total_reviews: 10,
            location: String::new(),
        }
    }

    #[test]
    fn platform_names_match_serialized_keys() {
        for platform in Platform::ALL {
            let links = SocialLinks::default().with(platform, "https://example.com/acme");
            let value = serde_json::to_value(&links).unwrap();
            assert_eq!(value[platform.name()], "https://example.com/acme");
            assert_eq!(links.get(platform), "https://example.com/acme");
        }
    }

    #[test]
    fn more_pages_is_likely() {
        assert!(MorePages::Likely.is_likely());
        assert!(!MorePages::Unlikely.is_likely());
    }

    #[test]
    fn retain_min_rating_filters_low_ratings() {
        let mut listing = ListingResult {
            items: vec![summary("a.com", 4.5), summary("b.com", 2.0), summary("c.com", 4.0)],
            total_result_count: 0,
            page_number: 1,
            has_more_pages: MorePages::Unlikely,
            source_label: "bank".to_string(),
        };
        listing.retain_min_rating(4.0);
        let domains: Vec<_> = listing.items.iter().map(|b| b.domain.as_str()).collect();
        assert_eq!(domains, vec!["a.com", "c.com"]);
    }

    #[test]
    fn retain_min_rating_zero_keeps_everything() {
        let mut listing = ListingResult {
            items: vec![summary("a.com", 0.0)],
            total_result_count: 0,
            page_number: 1,
            has_more_pages: MorePages::Unlikely,
            source_label: "bank".to_string(),
        };
        listing.retain_min_rating(0.0);
        assert_eq!(listing.items.len(), 1);
    }

    #[test]
    fn enriched_record_serializes_flat() {
        let enriched = EnrichedBusiness::new(
            summary("a.com", 4.5),
            "https://a.com".to_string(),
            String::new(),
            3,
            SocialLinks::default(),
        );
        let value = serde_json::to_value(&enriched).unwrap();
        assert_eq!(value["domain"], "a.com");
        assert_eq!(value["reviewsLastMonth"], 3);
        assert_eq!(value["enriched"], true);
        assert_eq!(value["socialLinks"]["youtube"], "");
    }

    #[test]
    fn business_record_prefers_enriched_shape() {
        let enriched = EnrichedBusiness::new(
            summary("a.com", 4.5),
            "https://a.com".to_string(),
            String::new(),
            0,
            SocialLinks::default(),
        );
        let json = serde_json::to_string(&enriched).unwrap();
        let record: BusinessRecord = serde_json::from_str(&json).unwrap();
        assert!(matches!(record, BusinessRecord::Enriched(_)));

        let json = serde_json::to_string(&summary("b.com", 1.0)).unwrap();
        let record: BusinessRecord = serde_json::from_str(&json).unwrap();
        assert!(matches!(record, BusinessRecord::Listed(_)));
        assert_eq!(record.summary().domain, "b.com");
    }
}
