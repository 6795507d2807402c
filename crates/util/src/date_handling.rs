//! # Date Handling Utilities
//!
//! This module parses the loosely formatted timestamps found in API payloads
//! and workflow documents. The accepted layouts are tried in a fixed order and
//! the first successful parse wins.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// A single accepted timestamp layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateLayout {
    /// RFC3339 with or without fractional seconds.
    Rfc3339,
    /// A naive date and time parsed with a `chrono` format string.
    NaiveDateTime(&'static str),
    /// A naive calendar date parsed with a `chrono` format string.
    NaiveDate(&'static str),
}

/// Layouts in precedence order. Layouts without an offset are interpreted as UTC.
const DATE_LAYOUTS: &[DateLayout] = &[
    DateLayout::Rfc3339,
    DateLayout::NaiveDateTime("%Y-%m-%dT%H:%M:%S"),
    DateLayout::NaiveDate("%Y-%m-%d"),
    DateLayout::NaiveDateTime("%Y%m%d%H%M%S"),
    DateLayout::NaiveDate("%Y%m%d"),
];

/// Parses a timestamp using the first layout that accepts the input.
///
/// Supported layouts:
/// - RFC3339, with or without fractional seconds (`2024-03-01T10:15:00.123Z`)
/// - `YYYY-MM-DDTHH:MM:SS`
/// - `YYYY-MM-DD`
/// - `YYYYMMDDHHMMSS`
/// - `YYYYMMDD`
///
/// # Example
/// ```rust
/// use opsblade_util::date_handling::parse_possible_date;
///
/// assert!(parse_possible_date("2024-03-01T10:15:00Z").is_some());
/// assert!(parse_possible_date("20240301").is_some());
/// assert!(parse_possible_date("yesterday").is_none());
/// ```
pub fn parse_possible_date(text: &str) -> Option<DateTime<Utc>> {
    DATE_LAYOUTS.iter().find_map(|layout| parse_with_layout(text, *layout))
}

fn parse_with_layout(text: &str, layout: DateLayout) -> Option<DateTime<Utc>> {
    match layout {
        DateLayout::Rfc3339 => DateTime::parse_from_rfc3339(text).ok().map(|parsed| parsed.with_timezone(&Utc)),
        DateLayout::NaiveDateTime(format) => NaiveDateTime::parse_from_str(text, format).ok().map(|naive| naive.and_utc()),
        DateLayout::NaiveDate(format) => NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc()),
    }
}
