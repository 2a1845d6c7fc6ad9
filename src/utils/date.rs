// src/utils/date.rs

//! Calendar date utilities.
//!
//! Dates are always proleptic Gregorian `YYYY-MM-DD` strings on the wire
//! and `NaiveDate` in memory. Nothing here reads the clock except `today`.

use chrono::{Days, Local, NaiveDate};

use crate::error::{AppError, Result};
use crate::models::Entry;

/// Parse a canonical `YYYY-MM-DD` date.
///
/// # Examples
/// ```
/// use wordfeed::utils::date::parse_date;
///
/// assert!(parse_date("2024-02-29").is_ok());
/// assert!(parse_date("2023-02-29").is_err());
/// assert!(parse_date("2024-2-1").is_err());
/// ```
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    if !is_canonical_shape(s) {
        return Err(AppError::InvalidDate(s.to_string()));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| AppError::InvalidDate(s.to_string()))
}

/// `DDDD-DD-DD` with ASCII digits; chrono alone accepts unpadded fields.
fn is_canonical_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Format a date in canonical `YYYY-MM-DD` form.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Today's local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Offset a date by `n` calendar days (negative moves backwards).
///
/// Saturates at the representable range instead of panicking.
pub fn add_days(date: NaiveDate, n: i64) -> NaiveDate {
    let shifted = if n >= 0 {
        date.checked_add_days(Days::new(n as u64))
    } else {
        date.checked_sub_days(Days::new(n.unsigned_abs()))
    };
    shifted.unwrap_or(if n >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}

/// First date that can receive a new word: the day after the latest entry,
/// or `today` for an empty store.
pub fn next_unused_date(entries: &[Entry], today: NaiveDate) -> NaiveDate {
    entries
        .iter()
        .map(|e| e.date)
        .max()
        .map(|last| add_days(last, 1))
        .unwrap_or(today)
}

/// Serde adapter that enforces the canonical date form.
pub mod canonical {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(de::Error::custom)
    }
}
