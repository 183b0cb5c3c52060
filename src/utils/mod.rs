//! Date/time parsing helpers shared by the scraper, the dedup key
//! normalization, and the dashboard.
//!
//! Upstream dates arrive in ambiguous day-first formats; stored dates are
//! canonical second-precision strings with the timezone stripped.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Canonical second-precision format used for stored article datetimes and
/// for dedup key normalization.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// Unambiguous or month-first formats, tried first when normalizing.
const DEFAULT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];
const DEFAULT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

// Day-first formats, as printed on the news site ("Tue, 17/06/2025 - 08:15").
const DAY_FIRST_DATETIME_FORMATS: &[&str] = &[
    "%a, %d/%m/%Y - %H:%M",
    "%d/%m/%Y - %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d.%m.%Y %H:%M",
];
const DAY_FIRST_DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d.%m.%Y"];

fn try_formats(raw: &str, datetime_formats: &[&str], date_formats: &[&str]) -> Option<NaiveDateTime> {
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date.and_hms_opt(0, 0, 0)?);
        }
    }
    None
}

/// Parse a datetime trying locale-default formats first, then day-first
/// ones. Timezone-aware inputs are converted to UTC and stripped.
/// Unparsable input coerces to `None`.
pub fn parse_datetime_flexible(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    try_formats(raw, DEFAULT_DATETIME_FORMATS, DEFAULT_DATE_FORMATS)
        .or_else(|| try_formats(raw, DAY_FIRST_DATETIME_FORMATS, DAY_FIRST_DATE_FORMATS))
}

/// Parse a datetime preferring day-first interpretations, the way the news
/// site prints publish dates.
pub fn parse_datetime_day_first(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    try_formats(raw, DAY_FIRST_DATETIME_FORMATS, DAY_FIRST_DATE_FORMATS)
        .or_else(|| try_formats(raw, DEFAULT_DATETIME_FORMATS, DEFAULT_DATE_FORMATS))
}

/// Reformat a raw datetime string to the canonical second-precision form.
/// Returns `None` when the input cannot be parsed at all.
pub fn normalize_datetime(raw: &str) -> Option<String> {
    parse_datetime_flexible(raw).map(|dt| dt.format(CANONICAL_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_flexible_parses_iso() {
        assert_eq!(
            parse_datetime_flexible("2024-01-01T10:00:00"),
            Some(dt(2024, 1, 1, 10, 0, 0))
        );
    }

    #[test]
    fn test_flexible_prefers_month_first_for_ambiguous_slashes() {
        // 03/04 is March 4th under the default interpretation
        assert_eq!(
            parse_datetime_flexible("03/04/2024 12:30"),
            Some(dt(2024, 3, 4, 12, 30, 0))
        );
    }

    #[test]
    fn test_flexible_falls_back_to_day_first() {
        // month 17 does not exist, so only the day-first reading fits
        assert_eq!(
            parse_datetime_flexible("17/06/2025 08:15"),
            Some(dt(2025, 6, 17, 8, 15, 0))
        );
    }

    #[test]
    fn test_day_first_prefers_day_first() {
        assert_eq!(
            parse_datetime_day_first("03/04/2024 12:30"),
            Some(dt(2024, 4, 3, 12, 30, 0))
        );
    }

    #[test]
    fn test_news_site_short_date_format() {
        assert_eq!(
            parse_datetime_day_first("Tue, 17/06/2025 - 08:15"),
            Some(dt(2025, 6, 17, 8, 15, 0))
        );
    }

    #[test]
    fn test_timezone_is_stripped() {
        assert_eq!(
            parse_datetime_flexible("2024-01-01T12:00:00+02:00"),
            Some(dt(2024, 1, 1, 10, 0, 0))
        );
    }

    #[test]
    fn test_unparsable_coerces_to_none() {
        assert_eq!(parse_datetime_flexible("not a date"), None);
        assert_eq!(parse_datetime_flexible(""), None);
        assert_eq!(normalize_datetime("garbage"), None);
    }

    #[test]
    fn test_normalize_produces_canonical_string() {
        assert_eq!(
            normalize_datetime("17/06/2025 08:15").as_deref(),
            Some("2025-06-17T08:15:00")
        );
        assert_eq!(
            normalize_datetime("2024-01-01T10:00:00").as_deref(),
            Some("2024-01-01T10:00:00")
        );
    }

    #[test]
    fn test_date_only_gets_midnight() {
        assert_eq!(
            parse_datetime_flexible("2024-05-20"),
            Some(dt(2024, 5, 20, 0, 0, 0))
        );
    }
}
