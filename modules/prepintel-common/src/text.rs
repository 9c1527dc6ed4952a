//! Text normalization shared by every extraction path.

/// Clean arbitrary extracted text into a single-spaced, printable-only string.
///
/// Control characters become spaces, whitespace runs (of any kind) collapse
/// into single ASCII spaces, and the result is trimmed. Idempotent.
pub fn clean_text(text: &str) -> String {
    let printable: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    printable.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` characters, respecting char boundaries.
pub fn clamp_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(clean_text("a\n\n\tb   c"), "a b c");
    }

    #[test]
    fn replaces_control_characters() {
        assert_eq!(clean_text("a\u{0}b\u{7}c"), "a b c");
        assert_eq!(clean_text("tab\tand\rreturn"), "tab and return");
    }

    #[test]
    fn trims_and_handles_empty() {
        assert_eq!(clean_text("   "), "");
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("  hello  "), "hello");
    }

    #[test]
    fn collapses_unicode_whitespace() {
        assert_eq!(clean_text("a\u{a0}b\u{2003}c"), "a b c");
    }

    #[test]
    fn clean_is_idempotent() {
        let inputs = ["a\n\n\tb   c", "  x\u{0}y  ", "already clean", ""];
        for input in inputs {
            let once = clean_text(input);
            assert_eq!(clean_text(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn clamp_respects_char_boundaries() {
        assert_eq!(clamp_chars("hello", 3), "hel");
        assert_eq!(clamp_chars("hello", 10), "hello");
        assert_eq!(clamp_chars("héllo", 2), "hé");
        assert_eq!(clamp_chars("", 5), "");
    }
}
