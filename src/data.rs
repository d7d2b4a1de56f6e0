//! Cell-level parsing shared by every table loader.

use std::str::FromStr;

use anyhow::{Result, anyhow};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

/// Returns `true` when `raw` should be treated as a missing value.
pub fn is_null(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lowered = trimmed.to_ascii_lowercase();
    let stripped = lowered.trim_start_matches('#');
    matches!(
        stripped,
        "na" | "n/a" | "n.a." | "nan" | "null" | "none"
    ) || stripped.chars().all(|c| c == '-')
}

pub fn parse_id(raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(value);
    }
    // ids exported from float columns come back as `123.0`
    match trimmed.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value.is_finite() => Ok(value as i64),
        _ => Err(anyhow!("Failed to parse '{raw}' as id")),
    }
}

/// Appearance counters are signed in the source data; negative values show up
/// in the raw export and simply never qualify as "appeared".
pub fn parse_count(raw: &str) -> Result<Option<i64>> {
    if is_null(raw) {
        return Ok(None);
    }
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(Some(value));
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value.is_finite() => Ok(Some(value as i64)),
        _ => Err(anyhow!("Failed to parse '{raw}' as count")),
    }
}

pub fn parse_decimal(raw: &str) -> Result<Option<Decimal>> {
    if is_null(raw) {
        return Ok(None);
    }
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map(Some)
        .map_err(|_| anyhow!("Failed to parse '{raw}' as decimal"))
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Parses a menu date as a real calendar date, accepting a trailing time.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    parse_naive_date(trimmed)
        .or_else(|_| parse_naive_datetime(trimmed).map(|dt| dt.date()))
        .ok()
}

pub fn parse_year(value: &str) -> Option<i32> {
    parse_calendar_date(value).map(|date| date.year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn placeholders_count_as_null() {
        for token in ["", "  ", "NA", "n/a", "NaN", "null", "None", "#N/A", "--"] {
            assert!(is_null(token), "{token:?} should be null");
        }
        assert!(!is_null("0"));
        assert!(!is_null("0.40"));
    }

    #[test]
    fn ids_and_counts_accept_float_literals() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id("42.0").unwrap(), 42);
        assert!(parse_id("4.2").is_err());
        assert_eq!(parse_count("8484.0").unwrap(), Some(8484));
        assert_eq!(parse_count("").unwrap(), None);
        assert_eq!(parse_count("-3").unwrap(), Some(-3));
        assert!(parse_count("many").is_err());
    }

    #[test]
    fn decimals_keep_precision() {
        assert_eq!(parse_decimal("0.35").unwrap(), Some(Decimal::new(35, 2)));
        assert_eq!(parse_decimal("NaN").unwrap(), None);
        assert!(parse_decimal("$1").is_err());
    }

    #[test]
    fn years_come_from_valid_calendar_dates_only() {
        assert_eq!(parse_year("1875-03-01"), Some(1875));
        assert_eq!(parse_year("1901-04-15 00:00:00"), Some(1901));
        assert_eq!(parse_year("1900-02-30"), None);
        assert_eq!(parse_year("unknown"), None);
    }
}
