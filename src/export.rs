use anyhow::{Context, Result};
use csv::Writer;
use tracing::{debug, info};

use crate::models::BusinessRecord;

pub const CSV_HEADERS: [&str; 15] = [
    "Company Name",
    "Domain",
    "Star Rating",
    "Trust Score",
    "Total Reviews",
    "Reviews Last 30 Days",
    "Website URL",
    "Email",
    "Location",
    "Profile URL",
    "Facebook",
    "Twitter",
    "Instagram",
    "LinkedIn",
    "YouTube",
];

/// One CSV row per business. Enriched-only columns stay blank for rows that
/// were never enriched. Fields containing a comma, quote or newline are quoted
/// with embedded quotes doubled.
pub fn to_csv(records: &[BusinessRecord]) -> Result<String> {
    debug!("Exporting {} businesses to CSV", records.len());

    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADERS)?;

    for record in records {
        wtr.write_record(csv_row(record))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
    let csv = String::from_utf8(bytes).context("CSV output was not UTF-8")?;

    info!("Exported {} businesses to CSV", records.len());
    Ok(csv)
}

fn csv_row(record: &BusinessRecord) -> Vec<String> {
    let summary = record.summary();
    let (recent, website, email, social) = match record {
        BusinessRecord::Enriched(e) => (
            e.reviews_last_month.to_string(),
            e.website_url.clone(),
            e.email.clone(),
            e.social_links.clone(),
        ),
        BusinessRecord::Listed(_) => Default::default(),
    };

    vec![
        summary.name.clone(),
        summary.domain.clone(),
        summary.star_rating.to_string(),
        summary.trust_score.to_string(),
        summary.total_reviews.to_string(),
        recent,
        website,
        email,
        summary.location.clone(),
        summary.profile_url.clone(),
        social.facebook,
        social.twitter,
        social.instagram,
        social.linkedin,
        social.youtube,
    ]
}

/// Pretty-printed JSON array of the records.
pub fn to_json(records: &[BusinessRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).context("Failed to serialize businesses to JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BusinessSummary, EnrichedBusiness, Platform, SocialLinks};

    fn summary(location: &str) -> BusinessSummary {
        BusinessSummary {
            name: "Acme".to_string(),
            domain: "acme.com".to_string(),
            profile_url: "https://www.trustpilot.com/review/acme.com".to_string(),
            star_rating: 4.5,
            trust_score: 4.6,
            total_reviews: 1200,
            location: location.to_string(),
        }
    }

    #[test]
    fn quotes_and_doubles_embedded_quotes() {
        let records = vec![BusinessRecord::Listed(summary(r#"Acme, "Prime" Inc."#))];
        let csv = to_csv(&records).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains(r#","Acme, ""Prime"" Inc.","#), "row was {row}");
    }

    #[test]
    fn listed_rows_leave_enriched_columns_blank() {
        let records = vec![BusinessRecord::Listed(summary("Austin"))];
        let csv = to_csv(&records).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), CSV_HEADERS.join(","));
        assert_eq!(
            lines.next().unwrap(),
            "Acme,acme.com,4.5,4.6,1200,,,,Austin,https://www.trustpilot.com/review/acme.com,,,,,"
        );
    }

    #[test]
    fn enriched_rows_fill_every_column() {
        let social = SocialLinks::default()
            .with(Platform::Facebook, "https://facebook.com/acme")
            .with(Platform::YouTube, "https://youtube.com/@acme");
        let enriched = EnrichedBusiness::new(
            summary("Austin"),
            "https://acme.com".to_string(),
            "hi@acme.com".to_string(),
            17,
            social,
        );
        let csv = to_csv(&[BusinessRecord::Enriched(enriched)]).unwrap();
        assert_eq!(
            csv.lines().nth(1).unwrap(),
            "Acme,acme.com,4.5,4.6,1200,17,https://acme.com,hi@acme.com,Austin,\
             https://www.trustpilot.com/review/acme.com,https://facebook.com/acme,,,,https://youtube.com/@acme"
        );
    }

    #[test]
    fn json_export_is_an_array() {
        let json = to_json(&[BusinessRecord::Listed(summary(""))]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["domain"], "acme.com");
    }
}
