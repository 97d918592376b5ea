//! Language name resolution
//!
//! Shelfari renders the edition language as a localized name. Known names map
//! straight to ISO 639-2 codes; anything else goes through
//! [`canonicalize_lang`].

/// Localized language names as they appear on detail pages
const SITE_LANGUAGES: &[(&str, &[&str])] = &[
    ("eng", &["English", "Englisch"]),
    ("fra", &["French", "Français"]),
    ("ita", &["Italian", "Italiano"]),
    ("dut", &["Dutch"]),
    ("deu", &["German", "Deutsch"]),
    ("spa", &["Spanish", "Español", "Espaniol"]),
    ("jpn", &["Japanese", "日本語"]),
    ("por", &["Portuguese", "Português"]),
];

/// ISO 639-2 code, ISO 639-1 code, English name
const ISO_LANGUAGES: &[(&str, &str, &str)] = &[
    ("ara", "ar", "arabic"),
    ("ces", "cs", "czech"),
    ("chi", "zh", "chinese"),
    ("dan", "da", "danish"),
    ("deu", "de", "german"),
    ("dut", "nl", "dutch"),
    ("ell", "el", "greek"),
    ("eng", "en", "english"),
    ("fin", "fi", "finnish"),
    ("fra", "fr", "french"),
    ("heb", "he", "hebrew"),
    ("hin", "hi", "hindi"),
    ("hun", "hu", "hungarian"),
    ("ind", "id", "indonesian"),
    ("ita", "it", "italian"),
    ("jpn", "ja", "japanese"),
    ("kor", "ko", "korean"),
    ("lat", "la", "latin"),
    ("nor", "no", "norwegian"),
    ("pol", "pl", "polish"),
    ("por", "pt", "portuguese"),
    ("ron", "ro", "romanian"),
    ("rus", "ru", "russian"),
    ("spa", "es", "spanish"),
    ("swe", "sv", "swedish"),
    ("tur", "tr", "turkish"),
    ("ukr", "uk", "ukrainian"),
];

/// Alternative ISO 639-2 codes accepted as input
const CODE_ALIASES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("nld", "dut"),
    ("zho", "chi"),
    ("gre", "ell"),
    ("cze", "ces"),
    ("rum", "ron"),
];

/// Resolves a language name from a detail page to a language code
pub fn site_language_code(name: &str) -> Option<&'static str> {
    let name = name.trim();
    SITE_LANGUAGES
        .iter()
        .find(|(_, names)| names.contains(&name))
        .map(|(code, _)| *code)
        .or_else(|| canonicalize_lang(name))
}

/// Maps a language code or English language name to its ISO 639-2 code
///
/// Accepts two-letter and three-letter codes as well as names, all
/// case-insensitively. Returns None for anything it does not recognize.
pub fn canonicalize_lang(raw: &str) -> Option<&'static str> {
    let raw = raw.trim().to_lowercase();
    if raw.is_empty() {
        return None;
    }

    if let Some((_, code)) = CODE_ALIASES.iter().find(|(alias, _)| *alias == raw) {
        return Some(code);
    }

    ISO_LANGUAGES
        .iter()
        .find(|(code, short, name)| *code == raw || *short == raw || *name == raw)
        .map(|(code, _, _)| *code)
}
