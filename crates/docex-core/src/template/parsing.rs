//! Conversion of matched strings into typed values.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::patterns::{
    month_from_name, DATE_DAY_MONTH_NAME, DATE_DMY, DATE_MONTH_NAME_DAY, DATE_YMD,
};

/// Parse an amount written with the given decimal separator.
///
/// Everything that is not a digit, a minus sign or the decimal separator is
/// treated as a thousands separator and dropped ("1 234,56" with "," gives
/// 1234.56, "1,234.56" with "." gives 1234.56).
pub fn parse_number(s: &str, decimal_separator: &str) -> Option<Decimal> {
    let sep = decimal_separator.chars().next().unwrap_or('.');
    let trimmed = s.trim();
    let negative = trimmed.starts_with('-') || trimmed.ends_with('-');

    let mut normalized = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if c.is_ascii_digit() {
            normalized.push(c);
        } else if c == sep {
            normalized.push('.');
        }
    }

    if normalized.is_empty() || normalized == "." {
        return None;
    }
    // Only the last separator is decimal.
    if normalized.matches('.').count() > 1 {
        let last = normalized.rfind('.')?;
        let (int_part, frac_part) = normalized.split_at(last);
        normalized = format!("{}{}", int_part.replace('.', ""), frac_part);
    }

    let value = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -value } else { value })
}

/// Parse an integer, ignoring grouping characters.
pub fn parse_int(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    let value: i64 = digits.parse().ok()?;
    Some(if trimmed.starts_with('-') { -value } else { value })
}

/// Parse a date with the template's formats, then the built-in ones.
pub fn parse_date(s: &str, formats: &[String]) -> Option<NaiveDate> {
    let trimmed = s.trim();

    for format in formats {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    parse_date_builtin(trimmed)
}

fn parse_date_builtin(s: &str) -> Option<NaiveDate> {
    if let Some(caps) = DATE_YMD.captures(s) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = DATE_DMY.captures(s) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year = parse_year(&caps[3]);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = DATE_DAY_MONTH_NAME.captures(s) {
        if let Some(month) = month_from_name(&caps[2]) {
            let day: u32 = caps[1].parse().ok()?;
            let year: i32 = caps[3].parse().ok()?;
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date);
            }
        }
    }

    if let Some(caps) = DATE_MONTH_NAME_DAY.captures(s) {
        if let Some(month) = month_from_name(&caps[1]) {
            let day: u32 = caps[2].parse().ok()?;
            let year: i32 = caps[3].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, day);
        }
    }

    None
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: 00-50 is 20xx, 51-99 is 19xx
        if year <= 50 {
            2000 + year
        } else {
            1900 + year
        }
    } else {
        year
    }
}
