//! Cell value parsers.
//!
//! Source spreadsheets write counts, flags and volumes in many shapes
//! ("1,200", "500+", "1.2k", "Yes", "✓", "2 TB"). Each parser returns `None`
//! when the text carries no usable value.

use regex::Regex;
use std::sync::LazyLock;

static RE_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^~?\s*(\d+(?:\.\d+)?)\s*(k|m)?\s*\+?$").expect("valid count regex")
});

static RE_VOLUME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^~?\s*(\d+(?:\.\d+)?)\s*(kb|mb|gb|tb|pb)?$").expect("valid volume regex")
});

static RE_NUMBER_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,$€£¥%]").expect("valid number noise regex"));

/// True when the cell reads as a number once currency symbols, thousands
/// separators, percent signs and whitespace are removed.
pub fn is_numeric_cell(cell: &str) -> bool {
    let stripped = RE_NUMBER_NOISE.replace_all(cell, "");
    stripped.parse::<f64>().map_or(false, f64::is_finite)
}

/// Whole count such as a user or integration count.
pub fn parse_count(cell: &str) -> Option<u64> {
    let compact = cell.trim().replace(',', "");
    let caps = RE_COUNT.captures(&compact)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let scale = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()).as_deref() {
        Some("k") => 1_000.0,
        Some("m") => 1_000_000.0,
        _ => 1.0,
    };
    let scaled = (value * scale).round();
    (scaled.is_finite() && scaled >= 0.0).then_some(scaled as u64)
}

pub fn parse_count_u32(cell: &str) -> Option<u32> {
    parse_count(cell).and_then(|v| u32::try_from(v).ok())
}

/// Yes/no style flag.
pub fn parse_flag(cell: &str) -> Option<bool> {
    match cell.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" | "x" | "✓" | "✔" | "required" | "enabled" => Some(true),
        "no" | "n" | "false" | "0" | "-" | "✗" | "none" | "not required" | "disabled" => Some(false),
        _ => None,
    }
}

/// Data volume in gigabytes. Bare numbers are read as gigabytes.
pub fn parse_data_volume_gb(cell: &str) -> Option<f64> {
    let compact = cell.trim().replace(',', "");
    let caps = RE_VOLUME.captures(&compact)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let factor = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()).as_deref() {
        Some("kb") => 1.0 / (1024.0 * 1024.0),
        Some("mb") => 1.0 / 1024.0,
        Some("tb") => 1024.0,
        Some("pb") => 1024.0 * 1024.0,
        _ => 1.0,
    };
    Some(value * factor)
}

/// Trimmed text, `None` when blank.
pub fn parse_text(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
