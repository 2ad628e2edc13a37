//! schema.org JSON-LD blocks embedded in profile pages.
//!
//! Each graph node is decoded on its own into [`GraphNode`]; nodes that are
//! malformed or of an uninteresting type are skipped.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::Review;
use crate::normalize::parse_absolute_date;

const STRUCTURED_DATA: &str = r#"script[type="application/ld+json"]"#;

static STRUCTURED_DATA_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(STRUCTURED_DATA).expect("valid selector"));

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "@type")]
pub enum GraphNode {
    LocalBusiness(LocalBusinessRecord),
    Review(ReviewRecord),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocalBusinessRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub same_as: Option<OneOrMany>,
    #[serde(default)]
    pub email: Option<String>,
}

impl LocalBusinessRecord {
    /// First non-empty `sameAs` entry.
    pub fn website(&self) -> Option<&str> {
        match self.same_as.as_ref()? {
            OneOrMany::One(url) => Some(url.as_str()),
            OneOrMany::Many(urls) => urls.first().map(String::as_str),
        }
        .map(str::trim)
        .filter(|url| !url.is_empty())
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    #[serde(default)]
    pub date_published: Option<String>,
    #[serde(default)]
    pub review_rating: Option<RatingRecord>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatingRecord {
    /// `"5"` and `5` both show up.
    #[serde(default)]
    pub rating_value: Option<Value>,
}

impl ReviewRecord {
    /// `None` when the review carries no usable publish date.
    pub fn to_review(&self) -> Option<Review> {
        let published = parse_absolute_date(self.date_published.as_deref()?)?;
        let rating = self
            .review_rating
            .as_ref()
            .and_then(|r| r.rating_value.as_ref())
            .and_then(|v| v.as_f64().or_else(|| v.as_str()?.trim().parse().ok()))
            .unwrap_or(0.0);
        Some(Review { published, rating })
    }
}

/// Everything a profile page's structured data told us.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredData {
    pub business: Option<LocalBusinessRecord>,
    pub reviews: Vec<Review>,
}

/// Decode every structured-data block on the page.
///
/// If several `LocalBusiness` nodes appear the last one wins.
pub fn extract_structured_data(document: &Html) -> StructuredData {
    let mut data = StructuredData::default();

    for script in document.select(&STRUCTURED_DATA_SEL) {
        let raw: String = script.text().collect();
        for node in decode_block(&raw) {
            match node {
                GraphNode::LocalBusiness(business) => data.business = Some(business),
                GraphNode::Review(record) => match record.to_review() {
                    Some(review) => data.reviews.push(review),
                    None => debug!("Skipping review without a usable datePublished"),
                },
                GraphNode::Other => {}
            }
        }
    }

    data
}

/// Only the reviews; used for pages past the first.
pub fn extract_reviews(document: &Html) -> Vec<Review> {
    extract_structured_data(document).reviews
}

/// Decode one block. Accepts a single object, an array, or an `@graph` container.
pub fn decode_block(raw: &str) -> Vec<GraphNode> {
    let value: Value = match serde_json::from_str(raw.trim()) {
        Ok(v) => v,
        Err(e) => {
            debug!("Skipping malformed structured-data block: {}", e);
            return Vec::new();
        }
    };

    let mut candidates = Vec::new();
    flatten_graph(value, &mut candidates);

    candidates
        .into_iter()
        .filter_map(|item| serde_json::from_value::<GraphNode>(item).ok())
        .collect()
}

fn flatten_graph(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_graph(item, out);
            }
        }
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten_graph(graph, out);
            }
            if map.contains_key("@type") {
                out.push(Value::Object(map));
            }
        }
        _ => {}
    }
}
