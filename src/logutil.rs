//! Keeps player-entered text (trade descriptions, region names) on one log line.

use std::fmt::Write;

/// Longest preview written to a log line, in characters.
pub const MAX_LOG_PREVIEW: usize = 160;

/// Escape a string for single-line logging.
///
/// Backslashes and `\n`, `\r`, `\t` become two-character escapes, other
/// control characters become `\xNN`. Text past [`MAX_LOG_PREVIEW`] characters
/// is cut and marked with `…`.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_LOG_PREVIEW) + 4);
    let mut chars = s.chars();
    for ch in chars.by_ref().take(MAX_LOG_PREVIEW) {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    if chars.next().is_some() {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_line_description_stays_on_one_line() {
        assert_eq!(
            escape_log("north hall\nsecond floor\t(left)"),
            "north hall\\nsecond floor\\t(left)"
        );
        assert_eq!(escape_log("bell\u{7}"), "bell\\x07");
    }

    #[test]
    fn long_text_is_truncated() {
        let long = "x".repeat(MAX_LOG_PREVIEW + 10);
        let escaped = escape_log(&long);
        assert_eq!(escaped.chars().count(), MAX_LOG_PREVIEW + 1);
        assert!(escaped.ends_with('…'));
        assert_eq!(escape_log(&"y".repeat(MAX_LOG_PREVIEW)).chars().count(), MAX_LOG_PREVIEW);
    }
}
