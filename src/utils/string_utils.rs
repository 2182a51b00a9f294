//! Text normalization for scraped labels and values.

/// Collapse runs of whitespace (including NBSP) into single spaces and trim.
///
/// Section headers on the site carry stray newlines and indentation, so label
/// dispatch always compares normalized text.
#[must_use]
pub fn normalize_whitespace(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate to at most `max_chars` characters on a char boundary.
///
/// Used to keep long review bodies out of log lines.
#[inline]
#[must_use]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
