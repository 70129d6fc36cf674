//! Chronological ordering for report date strings.
//!
//! Reports group by the date string exactly as supplied, so a single report
//! can mix ISO dates (`2024-09-07`) with the day-first formats found in
//! scraped comment exports (`07/09/2024`, `07-09-2024`). Consumers that plot
//! a trend need those strings back in calendar order.
//!
//! # Ordering
//!
//! 1. Parseable dates, ascending by calendar date
//! 2. Unparseable strings, ascending lexicographically
//!
//! Ties between equal calendar dates keep their original relative order.

use chrono::NaiveDate;

const FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// Parse a report date in any of the accepted formats.
///
/// Leading/trailing whitespace is ignored, as is a time suffix after the
/// date (`2024-09-07 13:45`, `2024-09-07T13:45:00`).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let head = s
        .split(|c: char| c == 'T' || c.is_whitespace())
        .next()
        .unwrap_or(s);
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(head, fmt).ok())
}

/// Sort key placing parseable dates first, in calendar order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DateKey {
    Calendar(NaiveDate),
    Raw(String),
}

pub fn date_key(s: &str) -> DateKey {
    match parse_date(s) {
        Some(d) => DateKey::Calendar(d),
        None => DateKey::Raw(s.to_string()),
    }
}

/// Stable chronological sort of rows by their date string.
pub fn sort_by_date<T>(rows: &mut [T], date_of: impl Fn(&T) -> &str) {
    rows.sort_by_cached_key(|row| date_key(date_of(row)));
}
