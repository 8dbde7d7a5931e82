//! Small text utilities shared across the crate.

/// Truncate a string to at most `max_chars` characters, appending an
/// ellipsis when anything was cut.
///
/// Operates on `char` boundaries, so multibyte text is never split
/// mid-codepoint.
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars).collect();
        out.push('…');
        out
    }
}
