//! Value renderer: short, truncation-safe display strings

use super::introspect::Introspect;

/// Default maximum length of a rendered value, in characters
pub const DEFAULT_REPR_LENGTH: usize = 120;

const ELLIPSIS: &str = "...";

/// Render `value` for display. Never fails: when the host cannot produce a
/// representation, a placeholder naming the type is returned instead.
pub fn render<H: Introspect>(host: &H, value: &H::Value, max_length: usize) -> String {
    match host.repr(value) {
        Ok(text) => truncate(text, max_length),
        Err(err) => {
            tracing::debug!(%err, "falling back to placeholder");
            truncate(
                format!("<unrepresentable {}>", host.type_name(value)),
                max_length,
            )
        }
    }
}

/// Cut `text` to `max_length - 3` characters plus an ellipsis when it is
/// longer than `max_length` characters.
pub fn truncate(text: String, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text;
    }
    let keep = max_length.saturating_sub(ELLIPSIS.len());
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str(ELLIPSIS);
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_untouched() {
        assert_eq!(truncate("abc".to_string(), 3), "abc");
        assert_eq!(truncate(String::new(), 0), "");
    }

    #[test]
    fn test_long_text_is_cut_with_ellipsis() {
        let text = "x".repeat(200);
        let cut = truncate(text, 120);
        assert_eq!(cut.chars().count(), 120);
        assert!(cut.ends_with("..."));
        assert_eq!(&cut[..117], "x".repeat(117));
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let text = "é".repeat(10);
        assert_eq!(truncate(text.clone(), 10), text);
        assert_eq!(truncate(text, 5), "éé...");
    }
}
