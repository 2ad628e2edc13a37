use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::ScraperError;
use crate::models::{BusinessSummary, ListingResult, MorePages};
use crate::normalize::{parse_review_count, parse_star_rating};
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::{ListingSource, ScraperConfig};

// Card markup. Category and search pages share it.
const CARD: &str = r#"a[name="business-unit-card"]"#;
const CARD_NAME: &str = r#"[class*="heading-s"]:not([class*="body-xs"])"#;
const CARD_DISPLAYED_URL: &str = r#"[class*="websiteUrlDisplayed"]"#;
const CARD_STAR_IMAGE: &str = r#"img[class*="starRating"]"#;
const CARD_TRUST_SCORE: &str = r#"[class*="trustScore"]"#;
const CARD_REVIEW_COUNT: &str = r#"[data-business-unit-review-count="true"]"#;
const CARD_LOCATION: &str = r#"[class*="businessLocation"] p"#;
const RESULT_HEADING: &str = "h2";

const PROFILE_PATH: &str = "/review/";

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static CARD_SEL: LazyLock<Selector> = LazyLock::new(|| selector(CARD));
static NAME_SEL: LazyLock<Selector> = LazyLock::new(|| selector(CARD_NAME));
static DISPLAYED_URL_SEL: LazyLock<Selector> = LazyLock::new(|| selector(CARD_DISPLAYED_URL));
static STAR_IMAGE_SEL: LazyLock<Selector> = LazyLock::new(|| selector(CARD_STAR_IMAGE));
static TRUST_SCORE_SEL: LazyLock<Selector> = LazyLock::new(|| selector(CARD_TRUST_SCORE));
static REVIEW_COUNT_SEL: LazyLock<Selector> = LazyLock::new(|| selector(CARD_REVIEW_COUNT));
static LOCATION_SEL: LazyLock<Selector> = LazyLock::new(|| selector(CARD_LOCATION));
static HEADING_SEL: LazyLock<Selector> = LazyLock::new(|| selector(RESULT_HEADING));

static STAR_ALT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)TrustScore\s+(\d+(?:\.\d+)?)\s+out\s+of\s+5").expect("valid regex")
});
static TOTAL_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([\d,]+)\)").expect("valid regex"));

/// Fetch one page of a category or search listing.
pub async fn fetch_listing(
    fetcher: &dyn PageFetcher,
    config: &ScraperConfig,
    source: &ListingSource,
    page: u32,
    cancel: &CancellationToken,
) -> Result<ListingResult, ScraperError> {
    let url = listing_url(config, source, page)?;
    info!("Fetching listing page {} for {}", page, source.label());

    let html = fetcher.fetch(&url, cancel).await?;
    if html.trim().is_empty() {
        return Err(ScraperError::Parse {
            context: format!("listing page {url}"),
            reason: "empty response body".to_string(),
        });
    }

    let result = parse_listing(&html, source, page, config);
    info!(
        "✅ Parsed {} businesses from {} (page {})",
        result.items.len(),
        result.source_label,
        page
    );
    Ok(result)
}

/// Build the listing URL for `source` at `page` (1-based).
pub fn listing_url(
    config: &ScraperConfig,
    source: &ListingSource,
    page: u32,
) -> Result<String, ScraperError> {
    let path = match source {
        ListingSource::Category { slug } => format!("{}/categories/{}", config.base_url, slug),
        ListingSource::Search { .. } => format!("{}/search", config.base_url),
    };

    let mut url = Url::parse(&path).map_err(|e| ScraperError::InvalidUrl {
        url: path.clone(),
        reason: e.to_string(),
    })?;

    {
        let mut query = url.query_pairs_mut();
        if let ListingSource::Search { query: text } = source {
            query.append_pair("query", text);
        }
        query.append_pair("page", &page.max(1).to_string());
    }

    Ok(url.to_string())
}

/// Parse listing HTML into a [`ListingResult`].
///
/// Cards missing a name or a domain are skipped. `has_more_pages` is only an
/// estimate from the card count, and `total_result_count` is only read from
/// category pages.
pub fn parse_listing(
    html: &str,
    source: &ListingSource,
    page: u32,
    config: &ScraperConfig,
) -> ListingResult {
    let document = Html::parse_document(html);
    let items = parse_business_cards(&document, &config.base_url);

    let total_result_count = match source {
        ListingSource::Category { .. } => parse_total_result_count(&document),
        ListingSource::Search { .. } => 0,
    };

    let has_more_pages = if items.len() >= source.page_size(config) {
        MorePages::Likely
    } else {
        MorePages::Unlikely
    };

    ListingResult {
        items,
        total_result_count,
        page_number: page,
        has_more_pages,
        source_label: source.label(),
    }
}

/// Every well-formed business card in document order.
pub fn parse_business_cards(document: &Html, base_url: &str) -> Vec<BusinessSummary> {
    let cards: Vec<_> = document.select(&CARD_SEL).collect();
    debug!("Found {} business cards in HTML", cards.len());

    cards
        .into_iter()
        .enumerate()
        .filter_map(|(idx, card)| {
            let parsed = parse_card(card, base_url);
            if parsed.is_none() {
                debug!("Skipped card {}: missing name or domain", idx);
            }
            parsed
        })
        .collect()
}

fn parse_card(card: ElementRef<'_>, base_url: &str) -> Option<BusinessSummary> {
    let name = first_text(card, &NAME_SEL);

    let link_domain = card
        .value()
        .attr("href")
        .map(domain_from_profile_link)
        .unwrap_or_default();
    let domain = if link_domain.is_empty() {
        first_text(card, &DISPLAYED_URL_SEL)
    } else {
        link_domain
    };

    if name.is_empty() || domain.is_empty() {
        return None;
    }

    let star_rating = card
        .select(&STAR_IMAGE_SEL)
        .next()
        .and_then(|img| img.value().attr("alt"))
        .and_then(|alt| STAR_ALT_RE.captures(alt))
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0.0);

    let trust_score = parse_star_rating(&first_text(card, &TRUST_SCORE_SEL));
    let total_reviews = parse_review_count(&first_text(card, &REVIEW_COUNT_SEL));
    let location = first_text(card, &LOCATION_SEL);

    Some(BusinessSummary {
        profile_url: format!("{base_url}{PROFILE_PATH}{domain}"),
        name,
        domain,
        star_rating,
        trust_score,
        total_reviews,
        location,
    })
}

/// `/review/acme.com?utm=x` (relative or absolute) gives `acme.com`.
fn domain_from_profile_link(href: &str) -> String {
    let Some(pos) = href.find(PROFILE_PATH) else {
        return String::new();
    };
    href[pos + PROFILE_PATH.len()..]
        .split(['?', '#', '/'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn parse_total_result_count(document: &Html) -> u64 {
    document
        .select(&HEADING_SEL)
        .map(element_text)
        .filter(|text| text.contains("Companies"))
        .find_map(|text| {
            TOTAL_COUNT_RE
                .captures(&text)
                .and_then(|caps| caps[1].replace(',', "").parse().ok())
        })
        .unwrap_or(0)
}

fn first_text(scope: ElementRef<'_>, sel: &Selector) -> String {
    scope.select(sel).next().map(element_text).unwrap_or_default()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(href: &str, name: &str, displayed: &str, alt: &str, score: &str, reviews: &str, location: &str) -> String {
        format!(
            r#"<a name="business-unit-card" href="{href}">
                <div class="styles_heading-s__abc">{name}</div>
                <span class="styles_heading-s__x styles_body-xs__y">Visit site</span>
                <span class="styles_websiteUrlDisplayed__q">{displayed}</span>
                <img class="styles_starRating__z" alt="{alt}">
                <span class="styles_trustScore__k">{score}</span>
                <p data-business-unit-review-count="true">{reviews}</p>
                <div class="styles_businessLocation__m"><p>{location}</p></div>
            </a>"#
        )
    }

    fn page(cards: &[String], heading: &str) -> String {
        format!(
            "<html><body><h2>{heading}</h2><div>{}</div></body></html>",
            cards.join("\n")
        )
    }

    #[test]
    fn parses_card_fields() {
        let html = page(
            &[card(
                "/review/acme.com",
                "Acme Inc",
                "acme.com",
                "TrustScore 4.5 out of 5",
                "TrustScore 4.6",
                "1.2K reviews",
                "Austin, United States",
            )],
            "Companies (1,234)",
        );
        let config = ScraperConfig::default();
        let result = parse_listing(&html, &ListingSource::category("bank"), 1, &config);

        assert_eq!(result.items.len(), 1);
        let acme = &result.items[0];
        assert_eq!(acme.name, "Acme Inc");
        assert_eq!(acme.domain, "acme.com");
        assert_eq!(acme.profile_url, "https://www.trustpilot.com/review/acme.com");
        assert!((acme.star_rating - 4.5).abs() < f64::EPSILON);
        assert!((acme.trust_score - 4.6).abs() < f64::EPSILON);
        assert_eq!(acme.total_reviews, 1200);
        assert_eq!(acme.location, "Austin, United States");
        assert_eq!(result.total_result_count, 1234);
        assert_eq!(result.source_label, "bank");
        assert_eq!(result.has_more_pages, MorePages::Unlikely);
    }

    #[test]
    fn skips_malformed_cards_and_keeps_order() {
        let cards = vec![
            card("/review/one.com", "One", "", "TrustScore 4 out of 5", "4", "10", ""),
            card("/review/two.com", "", "", "", "", "", ""),
            card("/review/three.com", "Three", "", "", "", "3 reviews", ""),
            card("/elsewhere", "Four", "", "", "", "", ""),
            card("/review/five.com", "Five", "", "", "", "", ""),
        ];
        let html = page(&cards, "Results");
        let config = ScraperConfig::default();
        let result = parse_listing(&html, &ListingSource::category("bank"), 1, &config);

        let domains: Vec<_> = result.items.iter().map(|b| b.domain.as_str()).collect();
        assert_eq!(domains, vec!["one.com", "three.com", "five.com"]);
        assert_eq!(result.total_result_count, 0);
    }

    #[test]
    fn missing_optional_fields_default_to_zero() {
        let html = page(&[card("/review/bare.com", "Bare", "", "", "", "", "")], "");
        let config = ScraperConfig::default();
        let result = parse_listing(&html, &ListingSource::search("bare"), 1, &config);
        let bare = &result.items[0];
        assert_eq!(bare.star_rating, 0.0);
        assert_eq!(bare.trust_score, 0.0);
        assert_eq!(bare.total_reviews, 0);
        assert_eq!(bare.location, "");
    }

    #[test]
    fn displayed_url_fills_in_when_link_has_no_domain() {
        let html = page(&[card("/review/", "Shown", "shown.io", "", "", "", "")], "");
        let config = ScraperConfig::default();
        let result = parse_listing(&html, &ListingSource::category("x"), 1, &config);
        assert_eq!(result.items[0].domain, "shown.io");
    }

    #[test]
    fn domain_link_parsing_strips_query_and_origin() {
        assert_eq!(domain_from_profile_link("/review/acme.com?utm_source=x"), "acme.com");
        assert_eq!(
            domain_from_profile_link("https://www.trustpilot.com/review/www.acme.co.uk#top"),
            "www.acme.co.uk"
        );
        assert_eq!(domain_from_profile_link("/categories/bank"), "");
    }

    #[test]
    fn more_pages_threshold_depends_on_source() {
        let cards: Vec<_> = (0..10)
            .map(|i| card(&format!("/review/site{i}.com"), &format!("Site {i}"), "", "", "", "", ""))
            .collect();
        let html = page(&cards, "Companies (500)");
        let config = ScraperConfig::default();

        let search = parse_listing(&html, &ListingSource::search("site"), 2, &config);
        assert_eq!(search.has_more_pages, MorePages::Likely);
        assert_eq!(search.total_result_count, 0);
        assert_eq!(search.page_number, 2);
        assert_eq!(search.source_label, "search:site");

        let category = parse_listing(&html, &ListingSource::category("bank"), 2, &config);
        assert_eq!(category.has_more_pages, MorePages::Unlikely);
        assert_eq!(category.total_result_count, 500);
    }

    #[test]
    fn listing_urls_encode_query_and_page() {
        let config = ScraperConfig::default();
        assert_eq!(
            listing_url(&config, &ListingSource::category("bank"), 3).unwrap(),
            "https://www.trustpilot.com/categories/bank?page=3"
        );
        assert_eq!(
            listing_url(&config, &ListingSource::search("acme & sons"), 1).unwrap(),
            "https://www.trustpilot.com/search?query=acme+%26+sons&page=1"
        );
    }
}
