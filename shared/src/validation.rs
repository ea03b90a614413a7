//! Lenient field coercion for snapshot rows and report parameters
//!
//! Source tables are loosely typed: dates arrive as text in several layouts,
//! numeric columns sometimes hold blanks or garbage, and category ids may be
//! stored as integers in one table and floats in another. Nothing here ever
//! fails; a malformed value becomes "missing" and the engine treats it as such.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

// ============================================================================
// Text
// ============================================================================

/// Trim a text value, mapping blanks to `None`
pub fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Trim a text value, mapping missing values to an empty string
pub fn text_or_empty(value: Option<&str>) -> String {
    clean_text(value).unwrap_or_default()
}

// ============================================================================
// Dates
// ============================================================================

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a date or timestamp, keeping only the calendar date
pub fn parse_lenient_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }
    // RFC 3339 timestamps with an offset, e.g. "2024-03-01T10:00:00+01:00"
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

pub fn parse_optional_date(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(parse_lenient_date)
}

// ============================================================================
// Numbers
// ============================================================================

/// Parse a decimal quantity or price; scientific notation is accepted
pub fn parse_lenient_decimal(value: &str) -> Option<Decimal> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

pub fn parse_optional_decimal(value: Option<&str>) -> Option<Decimal> {
    value.and_then(parse_lenient_decimal)
}

/// Parse an integer code; integral decimals such as "1.0" are accepted
pub fn parse_lenient_int(value: &str) -> Option<i32> {
    let value = value.trim();
    if let Ok(v) = value.parse::<i32>() {
        return Some(v);
    }
    let decimal = parse_lenient_decimal(value)?;
    if decimal.fract().is_zero() {
        decimal.to_i32()
    } else {
        None
    }
}

pub fn parse_optional_int(value: Option<&str>) -> Option<i32> {
    value.and_then(parse_lenient_int)
}

// ============================================================================
// Identifiers
// ============================================================================

/// Canonical string form of a category id.
///
/// Numeric ids lose trailing zeros and the decimal point ("12.0" -> "12") so
/// that item and category tables join regardless of how each stored the id.
pub fn normalize_category_id(value: &str) -> String {
    let value = value.trim();
    match parse_lenient_decimal(value) {
        Some(number) => number.normalize().to_string(),
        None => value.to_string(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientId {
    Text(String),
    Integer(i64),
    Float(f64),
}

/// Deserialize an optional id given either as a JSON string or number
pub fn deserialize_lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = Option::<LenientId>::deserialize(deserializer)?;
    Ok(id.and_then(|id| match id {
        LenientId::Text(text) => clean_text(Some(&text)),
        LenientId::Integer(number) => Some(number.to_string()),
        LenientId::Float(number) => Some(number.to_string()),
    }))
}
