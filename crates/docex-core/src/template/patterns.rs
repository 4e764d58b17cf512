//! Built-in patterns used when a template gives no date formats.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // 15.01.2024, 15/01/24, 15-01-2024
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})\b"
    ).unwrap();

    // 2024-01-15, 2024/01/15
    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();

    // 15 January 2024, 15 Jan. 2024, 15 stycznia 2024
    pub static ref DATE_DAY_MONTH_NAME: Regex = Regex::new(
        r"(?i)\b(\d{1,2})\.?\s+([a-ząćęłńóśźż]{3,})\.?,?\s+(\d{4})\b"
    ).unwrap();

    // January 15, 2024
    pub static ref DATE_MONTH_NAME_DAY: Regex = Regex::new(
        r"(?i)\b([a-z]{3,})\.?\s+(\d{1,2})(?:st|nd|rd|th)?\s*,?\s+(\d{4})\b"
    ).unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Month number for an English or Polish month name (full or abbreviated).
pub fn month_from_name(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    let month = match name.as_str() {
        "january" | "jan" | "stycznia" | "styczeń" | "sty" => 1,
        "february" | "feb" | "lutego" | "luty" | "lut" => 2,
        "march" | "mar" | "marca" | "marzec" => 3,
        "april" | "apr" | "kwietnia" | "kwiecień" | "kwi" => 4,
        "may" | "maja" | "maj" => 5,
        "june" | "jun" | "czerwca" | "czerwiec" | "cze" => 6,
        "july" | "jul" | "lipca" | "lipiec" | "lip" => 7,
        "august" | "aug" | "sierpnia" | "sierpień" | "sie" => 8,
        "september" | "sep" | "sept" | "września" | "wrzesień" | "wrz" => 9,
        "october" | "oct" | "października" | "październik" | "paź" => 10,
        "november" | "nov" | "listopada" | "listopad" | "lis" => 11,
        "december" | "dec" | "grudnia" | "grudzień" | "gru" => 12,
        _ => return None,
    };
    Some(month)
}
