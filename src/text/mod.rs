//! Text helpers shared by the query builder and the page parsers
//!
//! This module provides ISBN validation, title/author tokenization, language
//! canonicalization and description sanitization. Everything here is pure.

mod isbn;
mod lang;
mod sanitize;
mod tokens;

// Re-export main functions
pub use isbn::check_isbn;
pub use lang::{canonicalize_lang, site_language_code};
pub use sanitize::{collapse_spaces, sanitize_comments_html};
pub use tokens::{author_tokens, title_tokens};

/// Returns only the ASCII digits of `text`
pub fn digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("ISBN: 978-0-385"), "9780385");
        assert_eq!(digits_only("no digits"), "");
    }
}
