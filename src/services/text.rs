//! Text helpers for entry fields
//!
//! - `strip_tags` reduces HTML to its text
//! - `truncate_words` keeps the first N words
//! - `slugify` builds URL-safe slugs from titles

use scraper::Html;

/// Maximum length of titles and slugs in the destination schema
pub const MAX_FIELD_LENGTH: usize = 255;

/// Remove all markup from an HTML fragment, keeping text and decoding entities.
///
/// Contents of `script` and `style` elements are dropped.
pub fn strip_tags(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return html.to_string();
    }

    let fragment = Html::parse_fragment(html);
    let mut text = String::new();

    for node in fragment.root_element().descendants() {
        if let Some(t) = node.value().as_text() {
            let in_raw = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .map(|e| matches!(e.name(), "script" | "style"))
                    .unwrap_or(false)
            });
            if !in_raw {
                text.push_str(t);
            }
        }
    }

    text
}

/// Keep the first `count` whitespace-separated words, joined by single spaces.
///
/// No ellipsis is appended.
pub fn truncate_words(text: &str, count: usize) -> String {
    text.split_whitespace()
        .take(count)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate to at most `max` characters
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Generate a URL-safe slug from a title.
///
/// Non-ASCII text is transliterated, everything is lowercased, runs of
/// anything other than ASCII letters, digits and underscores collapse to a
/// single hyphen, and the result is capped at `MAX_FIELD_LENGTH`.
pub fn slugify(title: &str) -> String {
    let ascii = deunicode::deunicode(title).to_lowercase();

    let mut result = String::with_capacity(ascii.len());
    let mut prev_hyphen = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            result.push(c);
            prev_hyphen = false;
        } else if c.is_whitespace() || c == '-' {
            if !prev_hyphen && !result.is_empty() {
                result.push('-');
                prev_hyphen = true;
            }
        }
        // Punctuation is dropped without splitting the word
    }

    let slug = truncate_chars(result.trim_end_matches('-'), MAX_FIELD_LENGTH);
    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(strip_tags("Fish &amp; chips"), "Fish & chips");
        assert_eq!(strip_tags("plain"), "plain");
        assert_eq!(strip_tags(""), "");
    }

    #[test]
    fn test_strip_tags_drops_scripts() {
        assert_eq!(strip_tags("<p>a</p><script>var x = 1;</script>"), "a");
    }

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("one  two\nthree four", 3), "one two three");
        assert_eq!(truncate_words("one two", 50), "one two");
        assert_eq!(truncate_words("", 5), "");
    }

    #[test]
    fn test_excerpt_of_sixty_words_keeps_fifty() {
        let words: Vec<String> = (1..=60).map(|i| format!("w{}", i)).collect();
        let html = format!("<p>{}</p>", words.join(" "));

        let excerpt = truncate_words(&strip_tags(&html), 50);

        assert_eq!(excerpt, words[..50].join(" "));
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Rust & WebAssembly!  "), "rust-webassembly");
        assert_eq!(slugify("Crème brûlée"), "creme-brulee");
        assert_eq!(slugify("It's done"), "its-done");
        assert_eq!(slugify("snake_case title"), "snake_case-title");
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_caps_length() {
        let title = "a".repeat(400);
        assert_eq!(slugify(&title).len(), MAX_FIELD_LENGTH);
    }

    proptest! {
        #[test]
        fn slug_is_url_safe(title in "\\PC{0,80}") {
            let slug = slugify(&title);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_'));
            prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
            prop_assert!(slug.chars().count() <= MAX_FIELD_LENGTH);
        }

        #[test]
        fn truncated_words_are_a_prefix(words in proptest::collection::vec("[a-z]{1,8}", 0..80), n in 0usize..60) {
            let text = words.join(" ");
            let truncated = truncate_words(&text, n);
            prop_assert!(text.starts_with(&truncated));
            prop_assert_eq!(truncated.split_whitespace().count(), n.min(words.len()));
        }
    }
}
