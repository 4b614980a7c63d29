//! Small text and clock helpers.

/// Longest remote error body kept in a [`crate::sync::TransportError`]
pub const MAX_ERROR_BODY_CHARS: usize = 180;

/// Trimmed text, or `None` when nothing but whitespace was given.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Whether `value` names an `http` or `https` endpoint (scheme is case-insensitive).
pub fn is_http_url(value: &str) -> bool {
    value.split_once("://").is_some_and(|(scheme, rest)| {
        !rest.is_empty()
            && (scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https"))
    })
}

/// One-line excerpt of a remote response body for logs and errors.
///
/// Runs of whitespace (including newlines from HTML error pages) collapse to
/// a single space.
pub fn compact_text(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect()
}

pub fn unix_millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Today's calendar date in the local timezone.
///
/// Attendance is keyed by the school's wall-clock day, not the UTC day.
pub fn local_today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
