//! Shared parsing utilities for parking dataset fields.
//!
//! Every parser here returns a `Result` or `Option`; callers decide whether
//! a failure skips the field, the record, or the statistic being computed.

use chrono::{NaiveDate, NaiveTime, Timelike as _};

/// Errors from parsing a single dataset field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The field was blank.
    #[error("field is empty")]
    Empty,

    /// The date portion did not match any supported format.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// The time portion did not match any supported format.
    #[error("invalid time: {0}")]
    InvalidTime(String),
}

/// A parsed infraction issue date with an optional hour of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueTimestamp {
    /// Calendar date the ticket was issued.
    pub date: NaiveDate,
    /// Hour of day (0-23), when the export includes a time component.
    pub hour: Option<u32>,
}

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];
const TIME_FORMATS: &[&str] = &["%I:%M:%S %p", "%I:%M %p", "%H:%M:%S", "%H:%M"];

/// Parses an issue date in `M/D/YYYY [time]` form.
///
/// The time component is optional and may be 12-hour (`"2:30:00 PM"`) or
/// 24-hour (`"14:30"`). ISO `YYYY-MM-DD` dates are also accepted.
///
/// # Errors
///
/// Returns [`ParseError`] if the field is blank or either component is
/// malformed.
pub fn parse_issue_timestamp(raw: &str) -> Result<IssueTimestamp, ParseError> {
    let raw = raw.trim();
    let mut parts = raw.splitn(2, char::is_whitespace);
    let date_part = parts.next().filter(|s| !s.is_empty()).ok_or(ParseError::Empty)?;

    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .ok_or_else(|| ParseError::InvalidDate(date_part.to_string()))?;

    let hour = match parts.next().map(str::trim).filter(|s| !s.is_empty()) {
        None => None,
        Some(time_part) => {
            let time_part = time_part.to_uppercase();
            let time = TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(&time_part, fmt).ok())
                .ok_or(ParseError::InvalidTime(time_part))?;
            Some(time.hour())
        }
    };

    Ok(IssueTimestamp { date, hour })
}

/// Returns `true` for cells that carry no value (`""`, `nan`, `None`,
/// `null`).
#[must_use]
pub fn is_blank(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("null")
}

/// Parses a monetary amount such as `"40"`, `"40.00"` or `"$1,250.00"`.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<f64> {
    if is_blank(raw) {
        return None;
    }
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a non-negative count that may be exported as a float (`"12.0"`).
#[must_use]
pub fn parse_count(raw: &str) -> Option<u32> {
    if is_blank(raw) {
        return None;
    }
    let trimmed = raw.trim();
    if let Ok(v) = trimmed.parse::<u32>() {
        return Some(v);
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() && v >= 0.0 && v <= f64::from(u32::MAX) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(v.trunc() as u32)
    } else {
        None
    }
}

/// Parses a yes/no flag column. Anything other than a recognised "yes" is
/// `false`.
#[must_use]
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_uppercase().as_str(),
        "Y" | "YES" | "TRUE" | "1"
    )
}
