use regex::Regex;
use std::sync::OnceLock;

/// Words dropped from title tokens when joiners are stripped
const JOINERS: &[&str] = &["a", "and", "the", "&"];

/// Author name fragments that never identify anyone
const AUTHOR_NOISE: &[&str] = &["von", "van", "unknown"];

fn subtitle_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([\(\[\{].*?[\)\]\}]|[/:\\].*$)").expect("valid subtitle pattern")
    })
}

fn title_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // (2010), (Omnibus), [Paperback] and friends
            (
                r"(?i)[({\[](\d{4}|omnibus|anthology|hardcover|audiobook|audio\scd|paperback|turtleback|mass\s*market|edition|ed\.)[\])}]",
                "",
            ),
            // anything in brackets that mentions an edition
            (r"(?i)[({\[].*?(edition|ed\.).*?[\]})]", ""),
            // thousands separators
            (r"(\d+),(\d+)", "$1$2"),
            // hyphens preceded by whitespace
            (r"(\s-)", " "),
            (r#"[:,;!@$%^&*(){}.`~"\s\[\]/《》「」“”]"#, " "),
        ]
        .into_iter()
        .map(|(pattern, replacement)| {
            (
                Regex::new(pattern).expect("valid title pattern"),
                replacement,
            )
        })
        .collect()
    })
}

fn author_remove_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"[!@#$%^&*(){}`~"\s\[\]/]"#).expect("valid pattern"))
}

fn author_replace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[-+.:;,]").expect("valid pattern"))
}

/// Splits a title into search tokens
///
/// Bracketed edition markers, years and punctuation are removed. With
/// `strip_subtitle`, anything after `:`, `/` or `\` and any bracketed part is
/// dropped first, unless that would leave almost nothing. With
/// `strip_joiners`, the words "a", "and", "the" and "&" are skipped.
pub fn title_tokens(title: Option<&str>, strip_joiners: bool, strip_subtitle: bool) -> Vec<String> {
    let Some(title) = title else {
        return Vec::new();
    };

    let mut title = title.to_string();
    if strip_subtitle {
        let stripped = subtitle_pattern().replace_all(&title, "");
        if stripped.chars().count() > 1 {
            title = stripped.into_owned();
        }
    }

    for (pattern, replacement) in title_patterns() {
        title = pattern.replace_all(&title, *replacement).into_owned();
    }

    title
        .split_whitespace()
        .map(|token| token.trim_matches(|c| c == '"' || c == '\''))
        .filter(|token| !token.is_empty())
        .filter(|token| !strip_joiners || !JOINERS.contains(&token.to_lowercase().as_str()))
        .map(str::to_string)
        .collect()
}

/// Splits author names into search tokens
///
/// Names written as "Last, First" are rotated to "First Last". Tokens of two
/// characters or fewer and nobiliary particles are skipped. Apostrophes are
/// kept so names like O'Brian survive intact.
pub fn author_tokens(authors: &[String], only_first_author: bool) -> Vec<String> {
    let authors = if only_first_author && authors.len() > 1 {
        &authors[..1]
    } else {
        authors
    };

    let mut tokens = Vec::new();
    for author in authors {
        let has_comma = author.contains(',');
        let replaced = author_replace_pattern().replace_all(author, " ");
        let mut parts: Vec<&str> = replaced.split_whitespace().collect();
        if has_comma && !parts.is_empty() {
            parts.rotate_left(1);
        }

        for part in parts {
            let token = author_remove_pattern().replace_all(part, "");
            let token = token.trim();
            if token.chars().count() > 2 && !AUTHOR_NOISE.contains(&token.to_lowercase().as_str())
            {
                tokens.push(token.to_string());
            }
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authors(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_simple_title() {
        assert_eq!(title_tokens(Some("61 Hours"), true, false), vec!["61", "Hours"]);
    }

    #[test]
    fn test_no_title() {
        assert!(title_tokens(None, true, false).is_empty());
        assert!(title_tokens(Some("   "), true, false).is_empty());
    }

    #[test]
    fn test_strip_joiners() {
        assert_eq!(
            title_tokens(Some("The Lord of the Rings"), true, false),
            vec!["Lord", "of", "Rings"]
        );
        assert_eq!(
            title_tokens(Some("The Lord of the Rings"), false, false),
            vec!["The", "Lord", "of", "the", "Rings"]
        );
    }

    #[test]
    fn test_strip_subtitle() {
        assert_eq!(
            title_tokens(Some("Dune: Deluxe Edition"), false, true),
            vec!["Dune"]
        );
        assert_eq!(
            title_tokens(Some("Dune: Deluxe Edition"), false, false),
            vec!["Dune", "Deluxe", "Edition"]
        );
    }

    #[test]
    fn test_bracketed_markers_removed() {
        assert_eq!(
            title_tokens(Some("The Girl Hunters (Paperback) [1962]"), true, false),
            vec!["Girl", "Hunters"]
        );
    }

    #[test]
    fn test_thousands_separator() {
        assert_eq!(
            title_tokens(Some("20,000 Leagues Under the Sea"), true, false),
            vec!["20000", "Leagues", "Under", "Sea"]
        );
    }

    #[test]
    fn test_quotes_trimmed() {
        assert_eq!(
            title_tokens(Some("'Salem's Lot"), true, false),
            vec!["Salem's", "Lot"]
        );
    }

    #[test]
    fn test_author_tokens_first_only() {
        assert_eq!(
            author_tokens(&authors(&["Lee Child", "Someone Else"]), true),
            vec!["Lee", "Child"]
        );
        assert_eq!(
            author_tokens(&authors(&["Lee Child", "Someone Else"]), false),
            vec!["Lee", "Child", "Someone", "Else"]
        );
    }

    #[test]
    fn test_author_last_first_rotated() {
        assert_eq!(
            author_tokens(&authors(&["Spillane, Mickey"]), true),
            vec!["Mickey", "Spillane"]
        );
    }

    #[test]
    fn test_author_short_and_noise_tokens_skipped() {
        assert_eq!(
            author_tokens(&authors(&["J. R. R. Tolkien"]), true),
            vec!["Tolkien"]
        );
        assert_eq!(
            author_tokens(&authors(&["Ludwig van Beethoven"]), true),
            vec!["Ludwig", "Beethoven"]
        );
    }

    #[test]
    fn test_author_apostrophe_kept() {
        assert_eq!(
            author_tokens(&authors(&["Patrick O'Brian"]), true),
            vec!["Patrick", "O'Brian"]
        );
    }

    #[test]
    fn test_no_authors() {
        assert!(author_tokens(&[], true).is_empty());
    }
}
