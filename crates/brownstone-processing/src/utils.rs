//! Shared parsing helpers for the sales pipeline.
//!
//! Everything here is a fallible cast: a value that cannot be read yields
//! `None`, never an error. Rows are only rejected later, by the cleaner's
//! required-field check.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use polars::prelude::*;
use std::collections::HashSet;

// =============================================================================
// String parsing
// =============================================================================

/// Characters commonly found in formatted sale prices that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 3] = [',', '$', ' '];

/// Markers that stand in for a missing value in the source extract.
pub static MISSING_MARKERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "n/a", "na", "null", "none", "missing", "unknown", "-", "--", "#n/a",
    ]
    .into_iter()
    .collect()
});

/// Check whether a string stands in for a missing value.
pub fn is_missing_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.is_empty() || MISSING_MARKERS.contains(lower.as_str())
}

/// Strip currency formatting so the remainder can be parsed as a number.
///
/// # Example
///
/// ```rust,ignore
/// assert_eq!(clean_numeric_string("$1,250,000"), "1250000");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Fallible cast of a loosely-typed field to `f64`.
///
/// Missing-value markers and unparseable strings both yield `None`.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if is_missing_marker(trimmed) {
        return None;
    }
    clean_numeric_string(trimmed).parse::<f64>().ok()
}

/// Fallible cast of a loosely-typed field to `i64`.
///
/// Parses as float first so values like "2.0" survive the cast.
pub fn parse_integer_string(s: &str) -> Option<i64> {
    parse_numeric_string(s).map(|v| v as i64)
}

// =============================================================================
// Label normalization
// =============================================================================

/// Normalize a segment label: trim surrounding whitespace, map to upper case.
///
/// An empty string after trimming is a valid (if uninformative) label and is
/// returned as-is rather than treated as missing.
pub fn normalize_label(s: &str) -> String {
    s.trim().to_uppercase()
}

// =============================================================================
// Date parsing
// =============================================================================

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 1] = ["%Y-%m-%d %H:%M:%S"];

/// Parse a sale date against the accepted format list.
///
/// Invalid or unparseable dates yield `None`; the record is kept either way
/// since the sale date is not a required field.
pub fn parse_sale_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if is_missing_marker(trimmed) {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Days since the Unix epoch, the physical representation of a Date column.
pub fn date_to_epoch_days(date: NaiveDate) -> i32 {
    (date - NaiveDate::default()).num_days() as i32
}

/// Inverse of [`date_to_epoch_days`].
pub fn epoch_days_to_date(days: i32) -> NaiveDate {
    NaiveDate::default() + chrono::Duration::days(days as i64)
}

// =============================================================================
// Data type utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// Tests
// =============================================================================
