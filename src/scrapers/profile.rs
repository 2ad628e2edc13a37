use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use reqwest::Url;
use scraper::{Html, Selector};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::{BusinessSummary, EnrichedBusiness, Review, SocialLinks};
use crate::normalize::is_within_last_month_at;
use crate::rate_limit::pause;
use crate::scrapers::jsonld::{extract_reviews, extract_structured_data};
use crate::scrapers::social::extract_social_links;
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::ScraperConfig;

/// Outbound "visit website" links carry this tracking parameter.
const VISIT_WEBSITE_LINK: &str = r#"a[href*="utm_medium=company_profile"]"#;
const MAILTO_LINK: &str = r#"a[href^="mailto:"]"#;

static VISIT_WEBSITE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(VISIT_WEBSITE_LINK).expect("valid selector"));
static MAILTO_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(MAILTO_LINK).expect("valid selector"));

/// What the first profile page yields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePage {
    pub website: Option<String>,
    pub email: Option<String>,
    pub social_links: SocialLinks,
    pub reviews: Vec<Review>,
}

/// Parse a profile page. Structured data is preferred; the visit-website link
/// and the first `mailto:` link are fallbacks.
pub fn parse_profile_page(html: &str) -> ProfilePage {
    let document = Html::parse_document(html);
    let structured = extract_structured_data(&document);
    let business = structured.business.as_ref();

    let website = business
        .and_then(|b| b.website())
        .map(str::to_string)
        .or_else(|| visit_website_origin(&document));

    let email = business
        .and_then(|b| b.email())
        .map(str::to_string)
        .or_else(|| first_mailto(&document));

    ProfilePage {
        website,
        email,
        social_links: extract_social_links(&document),
        reviews: structured.reviews,
    }
}

/// Scheme and host of the outbound visit-website link, if there is one.
fn visit_website_origin(document: &Html) -> Option<String> {
    let href = document
        .select(&VISIT_WEBSITE_SEL)
        .next()?
        .value()
        .attr("href")?;
    let origin = Url::parse(href).ok()?.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

fn first_mailto(document: &Html) -> Option<String> {
    let href = document.select(&MAILTO_SEL).next()?.value().attr("href")?;
    let address = href
        .trim_start_matches("mailto:")
        .split('?')
        .next()
        .unwrap_or_default()
        .trim();
    (!address.is_empty()).then(|| address.to_string())
}

/// Reviews on a later profile page; only structured data is read.
fn reviews_on_page(html: &str) -> Vec<Review> {
    extract_reviews(&Html::parse_document(html))
}

fn count_recent(reviews: &[Review], now: DateTime<Utc>) -> u64 {
    reviews
        .iter()
        .filter(|r| is_within_last_month_at(r.published, now))
        .count() as u64
}

/// Enrich one business from its profile page(s).
///
/// Never fails: anything that goes wrong leaves the remaining fields at their
/// defaults (`https://<domain>`, empty email, empty social links, 0 recent
/// reviews). Cancellation is treated the same way.
pub async fn enrich_business(
    fetcher: &dyn PageFetcher,
    config: &ScraperConfig,
    business: &BusinessSummary,
    cancel: &CancellationToken,
) -> EnrichedBusiness {
    let domain = business.domain.as_str();
    let fallback_website = format!("https://{domain}");
    let profile_url = config.profile_url(domain);
    let now = Utc::now();

    info!("Enriching {}", domain);

    let page = match fetcher.fetch(&profile_url, cancel).await {
        Ok(html) => parse_profile_page(&html),
        Err(e) => {
            warn!("Error enriching {}: {}", domain, e);
            return EnrichedBusiness::new(
                business.clone(),
                fallback_website,
                String::new(),
                0,
                SocialLinks::default(),
            );
        }
    };

    let total_on_first = page.reviews.len() as u64;
    let mut reviews_last_month = count_recent(&page.reviews, now);

    // Reviews are newest first. A fully recent first page means the 30-day
    // window may continue onto later pages.
    if total_on_first > 0 && reviews_last_month == total_on_first {
        reviews_last_month +=
            count_recent_on_later_pages(fetcher, config, &profile_url, now, cancel).await;
    }

    debug!(
        "{}: website={:?} email={:?} reviews_last_month={}",
        domain, page.website, page.email, reviews_last_month
    );

    EnrichedBusiness::new(
        business.clone(),
        page.website.unwrap_or(fallback_website),
        page.email.unwrap_or_default(),
        reviews_last_month,
        page.social_links,
    )
}

/// Walk pages 2, 3, ... until a page is empty, a page contains an old review,
/// the page cap is reached, or a fetch fails. Returns the recent reviews seen.
async fn count_recent_on_later_pages(
    fetcher: &dyn PageFetcher,
    config: &ScraperConfig,
    profile_url: &str,
    now: DateTime<Utc>,
    cancel: &CancellationToken,
) -> u64 {
    let mut recent_total = 0;

    for page in 2..=config.max_extra_pages.saturating_add(1) {
        if let Err(e) = pause(config.page_delay, cancel).await {
            debug!("Stopping pagination of {}: {}", profile_url, e);
            break;
        }

        let url = format!("{profile_url}?page={page}");
        let reviews = match fetcher.fetch(&url, cancel).await {
            Ok(html) => reviews_on_page(&html),
            Err(e) => {
                debug!("Stopping pagination of {}: {}", profile_url, e);
                break;
            }
        };

        if reviews.is_empty() {
            break;
        }

        let recent = count_recent(&reviews, now);
        recent_total += recent;
        debug!("{} page {}: {}/{} recent reviews", profile_url, page, recent, reviews.len());

        if recent < reviews.len() as u64 {
            break;
        }
    }

    recent_total
}
