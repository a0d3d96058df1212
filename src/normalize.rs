use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::error::{EtlError, Result};

/// Convert a locale-formatted amount into an exact decimal.
///
/// Blank input is not an error and yields `None`. When both `,` and `.` are
/// present the comma is a thousands separator; a lone comma is the decimal mark.
pub fn normalize_number(raw: Option<&str>) -> Result<Option<Decimal>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let unquoted: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '"' | '\''))
        .collect();
    if unquoted.is_empty() {
        return Ok(None);
    }

    let mut cleaned: String = unquoted
        .chars()
        .filter(|c| !matches!(c, '\u{a0}' | ' '))
        .collect();

    match (cleaned.rfind(','), cleaned.find('.')) {
        (Some(comma), Some(dot)) => {
            // A comma right of the decimal point cannot be a thousands separator.
            if comma > dot {
                return Err(EtlError::Format(format!(
                    "ambiguous separators in number '{}'",
                    raw.trim()
                )));
            }
            cleaned = cleaned.replace(',', "");
        }
        (Some(_), None) => cleaned = cleaned.replace(',', "."),
        _ => {}
    }

    Decimal::from_str_exact(&cleaned)
        .map(Some)
        .map_err(|e| EtlError::Format(format!("cannot convert '{cleaned}' to a decimal: {e}")))
}

/// Parse a statement date. Only the text before the first whitespace counts, so
/// a trailing time component is ignored.
pub fn parse_date(raw: Option<&str>) -> Result<NaiveDate> {
    let token = raw
        .and_then(|s| s.split_whitespace().next())
        .ok_or_else(|| EtlError::Format("empty date".to_string()))?;

    parse_date_token(token)
        .ok_or_else(|| EtlError::Format(format!("unrecognized date format: '{token}'")))
}

/// Strict `dd/mm/yyyy`, the wire format of staging value dates.
pub fn parse_dmy(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    match raw.rsplit_once('/') {
        Some((_, year)) if year.len() == 4 => NaiveDate::parse_from_str(raw, "%d/%m/%Y")
            .map_err(|e| EtlError::Format(format!("invalid value date '{raw}': {e}"))),
        _ => Err(EtlError::Format(format!(
            "value date '{raw}' is not dd/mm/yyyy"
        ))),
    }
}

// Tried in order dd/mm/yyyy, dd/mm/yy, yyyy-mm-dd. chrono's %Y accepts short
// years, so the year width picks the format.
fn parse_date_token(token: &str) -> Option<NaiveDate> {
    if let Some((_, year)) = token.rsplit_once('/') {
        return match year.len() {
            4 => NaiveDate::parse_from_str(token, "%d/%m/%Y").ok(),
            2 => NaiveDate::parse_from_str(token, "%d/%m/%y")
                .ok()
                .map(pivot_two_digit_year),
            _ => None,
        };
    }
    match token.split_once('-') {
        Some((year, _)) if year.len() == 4 => NaiveDate::parse_from_str(token, "%Y-%m-%d").ok(),
        _ => None,
    }
}

// Two-digit years 00-68 are 2000-2068 and 69-99 are 1969-1999. chrono puts
// 69 in 2069.
fn pivot_two_digit_year(date: NaiveDate) -> NaiveDate {
    if date.year() == 2069 {
        date.with_year(1969).unwrap_or(date)
    } else {
        date
    }
}
