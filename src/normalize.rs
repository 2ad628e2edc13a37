//! Conversions from scraped text into typed values.
//!
//! Every function here is total: malformed input yields a neutral value
//! (`0`, or "now" for dates) rather than an error.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?|\.\d+").expect("valid regex"));

static REVIEWS_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)reviews?").expect("valid regex"));

static ABBREVIATED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+(?:\.\d+)?|\.\d+)([KM])$").expect("valid regex"));

static AGO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d+|an?)\s+(second|minute|hour|day|week|month|year)s?\s+ago\b")
        .expect("valid regex")
});

const ABSOLUTE_DATE_FORMATS: [&str; 6] = [
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%Y-%m-%d",
    "%m/%d/%Y",
];

/// Window used by [`is_within_last_month`]: thirty 24-hour days, not a calendar month.
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Parse counts like `"47 reviews"`, `"1,234"`, `"1.2K reviews"` or `"3M"`.
///
/// `K`/`M` suffixes scale the mantissa and round to the nearest integer.
/// Returns 0 when nothing usable is found.
pub fn parse_review_count(text: &str) -> u64 {
    let stripped: String = text
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    let cleaned = REVIEWS_WORD_RE.replace(&stripped, "");
    let cleaned = cleaned.trim();

    if let Some(caps) = ABBREVIATED_RE.captures(cleaned) {
        let mantissa: f64 = caps[1].parse().unwrap_or(0.0);
        let scale = if caps[2].eq_ignore_ascii_case("k") {
            1_000.0
        } else {
            1_000_000.0
        };
        return (mantissa * scale).round() as u64;
    }

    let digits: String = cleaned.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// First decimal or integer in `text`, e.g. `"4.9 out of 5"` gives 4.9.
pub fn parse_star_rating(text: &str) -> f64 {
    NUMBER_RE
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

/// Same as [`parse_relative_date_at`] with the current time.
pub fn parse_relative_date(text: &str) -> DateTime<Utc> {
    parse_relative_date_at(text, Utc::now())
}

/// Resolve `"3 days ago"`, `"an hour ago"`, `"yesterday"` or an absolute date
/// against `now`. Unrecognized text resolves to `now`.
///
/// Months and years are subtracted on the calendar via `chrono::Months`, which
/// clamps to the last valid day (March 31 minus one month is February 28/29).
pub fn parse_relative_date_at(text: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let lower = text.trim().to_lowercase();

    if lower == "yesterday" {
        return now - Duration::days(1);
    }

    if let Some(caps) = AGO_RE.captures(&lower) {
        let amount: u32 = match &caps[1] {
            "a" | "an" => 1,
            n => n.parse().unwrap_or(0),
        };
        return subtract_units(now, amount, &caps[2]);
    }

    parse_absolute_date(text).unwrap_or(now)
}

fn subtract_units(now: DateTime<Utc>, amount: u32, unit: &str) -> DateTime<Utc> {
    let amount_i = i64::from(amount);
    let delta = match unit {
        "second" => Duration::try_seconds(amount_i),
        "minute" => Duration::try_minutes(amount_i),
        "hour" => Duration::try_hours(amount_i),
        "day" => Duration::try_days(amount_i),
        "week" => Duration::try_weeks(amount_i),
        "month" => return now.checked_sub_months(Months::new(amount)).unwrap_or(now),
        "year" => {
            return now
                .checked_sub_months(Months::new(amount.saturating_mul(12)))
                .unwrap_or(now)
        }
        _ => None,
    };
    // Out of chrono's range resolves to now rather than panicking.
    delta
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(now)
}

/// Parse an absolute timestamp: RFC 3339 (as used in structured data), a bare
/// ISO date-time, or a handful of human date formats like `"January 28, 2026"`.
pub fn parse_absolute_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    ABSOLUTE_DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(text, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
    })
}

/// True when `timestamp` is no more than 30×24h before now (inclusive).
pub fn is_within_last_month(timestamp: DateTime<Utc>) -> bool {
    is_within_last_month_at(timestamp, Utc::now())
}

pub fn is_within_last_month_at(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    timestamp >= now - Duration::days(RECENT_WINDOW_DAYS)
}
