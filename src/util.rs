/// Utility helpers shared by collectors and commands.
///
/// IMPORTANT:
/// - No institution-specific logic should live here.
/// - This module must remain lightweight and deterministic.
///
use chrono::{NaiveDate, Utc};

/// Normalize a legislator name as published by a feed.
///
/// Examples:
/// - "  Maria   da Silva " -> "Maria da Silva"
/// - "JOSÉ\tSOUZA"         -> "JOSÉ SOUZA"
///
/// Only whitespace is touched; casing and accents are kept as published.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Current date (UTC).
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Round a BRL amount to cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
