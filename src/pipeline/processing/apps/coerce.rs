//! Field-level coercion rules for the app table.
//!
//! Every function here maps raw text to a typed value and returns `None`
//! for anything it cannot interpret. None of them fail.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{SIZE_VARIES, UNRATED_LABEL};

/// First integer or decimal number in a string, e.g. "4.0.3 and up" -> "4.0"
static VERSION_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.?\d*").expect("version regex is valid"));

const RATING_MAX: f64 = 5.0;

/// Trimmed, lower-cased application name used for dedup and joins
pub fn normalize_app_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Finite float, or `None`
pub fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Non-negative integer count. Integral floats such as "159.0" are accepted.
pub fn parse_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<u64>() {
        return Some(v);
    }
    parse_float(raw)
        .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= u64::MAX as f64)
        .map(|v| v as u64)
}

/// "10,000+" -> 10000
pub fn clean_installs(raw: &str) -> Option<u64> {
    let stripped: String = raw.chars().filter(|c| *c != ',' && *c != '+').collect();
    parse_count(&stripped)
}

/// Size in megabytes: "19M" -> 19.0, "512k" -> 0.5, "Varies with device" -> None
pub fn parse_size_mb(raw: &str) -> Option<f64> {
    let size = raw.trim();
    if size == SIZE_VARIES {
        return None;
    }
    if size.contains('M') {
        return parse_float(&size.replace('M', ""));
    }
    if size.contains('k') {
        return parse_float(&size.replace('k', "")).map(|kb| round_to(kb / 1024.0, 3));
    }
    None
}

/// "$4.99" -> 4.99; negative prices are not prices
pub fn parse_price(raw: &str) -> Option<f64> {
    parse_float(&raw.replace('$', "")).filter(|p| *p >= 0.0)
}

/// Ratings above the scale are corrupt and dropped rather than clamped
pub fn sanitize_rating(rating: Option<f64>) -> Option<f64> {
    rating.filter(|r| *r <= RATING_MAX)
}

/// Minimum Android version from free text: "4.0.3 and up" -> 4.0
pub fn extract_android_version(raw: &str) -> Option<f64> {
    VERSION_NUMBER
        .find(raw)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Parse "Last Updated" with the first matching format
pub fn parse_last_updated(raw: &str, formats: &[String]) -> Option<NaiveDate> {
    let raw = raw.trim();
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Round half to even on the scaled value.
///
/// Rounding an already-rounded value returns it unchanged.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}

/// "4.3 stars", or "Unrated"
pub fn rating_display(rating: Option<f64>) -> String {
    match rating {
        Some(r) => format!("{:.1} stars", r),
        None => UNRATED_LABEL.to_string(),
    }
}

/// "Action;Adventure" -> "Action / Adventure", "Art&Design" -> "Art & Design"
pub fn normalize_genres(raw: &str) -> String {
    raw.replace(';', " / ")
        .replace('&', " & ")
        .trim()
        .to_string()
}
