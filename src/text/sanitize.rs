use std::collections::HashSet;

/// Tags allowed to survive in a book description
const COMMENT_TAGS: &[&str] = &[
    "a", "b", "blockquote", "br", "div", "em", "h1", "h2", "h3", "h4", "i", "li", "ol", "p",
    "span", "strong", "sub", "sup", "u", "ul",
];

/// Collapses runs of spaces into a single space
///
/// Only the space character is collapsed; newlines and tabs are left alone.
pub fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_space = false;
    for c in text.chars() {
        if c == ' ' {
            if !previous_space {
                out.push(c);
            }
            previous_space = true;
        } else {
            out.push(c);
            previous_space = false;
        }
    }
    out
}

/// Sanitizes description HTML down to simple formatting markup
///
/// Scripts, styles, event handlers and unknown tags are removed; the text
/// content of unknown tags is kept.
pub fn sanitize_comments_html(html: &str) -> String {
    let tags: HashSet<&str> = COMMENT_TAGS.iter().copied().collect();
    ammonia::Builder::default()
        .tags(tags)
        .link_rel(None)
        .clean(html)
        .to_string()
        .trim()
        .to_string()
}
