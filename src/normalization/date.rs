// src/normalization/date.rs
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

const MIN_YEAR: i32 = 1850;
const MAX_YEAR: i32 = 2100;

const DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
];

/// Parses the date layouts sources are known to use. Date-times keep the
/// calendar date they were written with; no time-zone conversion happens.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = if trimmed.len() == 8 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        compact_date(trimmed)
    } else {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
            .or_else(|| {
                DATETIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                    .map(|dt| dt.date())
            })
            .or_else(|| {
                DateTime::parse_from_rfc3339(trimmed)
                    .ok()
                    .map(|dt| dt.date_naive())
            })
    };

    parsed.filter(|d| (MIN_YEAR..=MAX_YEAR).contains(&d.year()))
}

fn compact_date(digits: &str) -> Option<NaiveDate> {
    let year = digits[..4].parse().ok()?;
    let month = digits[4..6].parse().ok()?;
    let day = digits[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `YYYY-MM-DD`, or empty when the input is not a recognizable date.
pub fn normalize_date(raw: &str) -> String {
    parse_date(raw)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_date_layouts() {
        assert_eq!(normalize_date("1980-01-15"), "1980-01-15");
        assert_eq!(normalize_date("01/15/1980"), "1980-01-15");
        assert_eq!(normalize_date("01-15-1980"), "1980-01-15");
        assert_eq!(normalize_date("1980/01/15"), "1980-01-15");
        assert_eq!(normalize_date("19800115"), "1980-01-15");
        assert_eq!(normalize_date("January 15, 1980"), "1980-01-15");
        assert_eq!(normalize_date("15 Jan 1980"), "1980-01-15");
        assert_eq!(normalize_date("1980-01-15T00:00:00"), "1980-01-15");
        assert_eq!(normalize_date("1980-01-15 08:30:00"), "1980-01-15");
        assert_eq!(normalize_date("1980-01-15T23:30:00-05:00"), "1980-01-15");
    }

    #[test]
    fn test_normalize_date_degrades_to_empty() {
        assert_eq!(normalize_date(""), "");
        assert_eq!(normalize_date("not a date"), "");
        assert_eq!(normalize_date("1980-02-30"), "");
        assert_eq!(normalize_date("0001-01-01"), "");
        assert_eq!(normalize_date("19801345"), "");
    }
}
