//! Search results parser
//!
//! This module extracts result entries from a catalog search page and keeps
//! only those that look like the book being searched for. It also parses the
//! per-work editions page used when edition expansion is enabled.

use crate::text::{author_tokens, title_tokens};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Title markers of audio editions
const AUDIO_MARKERS: &[&str] = &["(audio cd)", "(compact disc)", "(audio cassette)"];

/// One accepted search result, in page order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Title as displayed in the results list
    pub title: String,

    /// Authors as displayed in the results list
    pub authors: Vec<String>,

    /// Absolute URL of the detail page
    pub url: String,

    /// Link to the work's editions page, if the entry has one
    pub editions: Option<EditionsLink>,
}

/// "N editions" link of a search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditionsLink {
    /// Absolute URL of the editions page
    pub url: String,

    /// Link text, e.g. "12 editions"
    pub label: String,
}

impl EditionsLink {
    /// Returns true if the link points at more than one edition
    pub fn has_alternatives(&self) -> bool {
        !self.label.trim().eq_ignore_ascii_case("1 edition")
    }
}

/// Returns true if a result is close enough to the searched title and authors
///
/// Each side matches when no tokens were supplied for it, or when at least one
/// token is a case-insensitive substring of the displayed text. Both sides
/// must match.
pub fn is_match(
    title_tokens: &[String],
    author_tokens: &[String],
    title: &str,
    authors: &[String],
) -> bool {
    let title = title.to_lowercase();
    let authors = authors.join(" ").to_lowercase();

    let title_match = title_tokens.is_empty()
        || title_tokens
            .iter()
            .any(|token| title.contains(&token.to_lowercase()));
    let author_match = author_tokens.is_empty()
        || author_tokens
            .iter()
            .any(|token| authors.contains(&token.to_lowercase()));

    title_match && author_match
}

/// Parses a search results page into accepted hits
///
/// # Arguments
///
/// * `html` - The search page body
/// * `base_url` - Base URL for resolving relative links
/// * `orig_title` - Title from the lookup request
/// * `orig_authors` - Authors from the lookup request
///
/// # Returns
///
/// Accepted hits in result order (best first). An unrecognized page yields an
/// empty list.
pub fn parse_results(
    html: &str,
    base_url: &Url,
    orig_title: Option<&str>,
    orig_authors: &[String],
) -> Vec<SearchHit> {
    let document = Html::parse_document(html);

    let Ok(entry_selector) = Selector::parse("ol.book_results > li") else {
        return Vec::new();
    };

    let entries: Vec<ElementRef> = document.select(&entry_selector).collect();
    if entries.is_empty() {
        tracing::debug!("No result entries found on search page");
        return Vec::new();
    }

    let title_tokens = title_tokens(orig_title, true, false);
    let author_tokens = author_tokens(orig_authors, true);

    let mut hits = Vec::new();
    for entry in entries {
        let Some(hit) = parse_entry(&entry, base_url) else {
            tracing::debug!("Skipping search result without a title link");
            continue;
        };

        if !is_match(&title_tokens, &author_tokens, &hit.title, &hit.authors) {
            tracing::warn!(
                "Rejecting as not close enough match: {} {:?}",
                hit.title,
                hit.authors
            );
            continue;
        }

        hits.push(hit);
    }

    hits
}

/// Extracts title, authors and links from one result entry
fn parse_entry(entry: &ElementRef, base_url: &Url) -> Option<SearchHit> {
    let title_selector = Selector::parse("div.text h3 a[href]").ok()?;
    let author_selector = Selector::parse("div.text > a").ok()?;
    let editions_selector = Selector::parse("a[href*='/work/editions/']").ok()?;

    let title_link = entry.select(&title_selector).next()?;
    let title = element_text(&title_link);
    let url = resolve(title_link.value().attr("href")?, base_url)?;

    let authors = entry
        .select(&author_selector)
        .next()
        .map(|a| {
            element_text(&a)
                .split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let editions = entry.select(&editions_selector).next().and_then(|link| {
        Some(EditionsLink {
            url: resolve(link.value().attr("href")?, base_url)?,
            label: element_text(&link),
        })
    });

    Some(SearchHit {
        title,
        authors,
        url,
        editions,
    })
}

/// Parses a work's editions page into candidate URLs
///
/// Audio editions are skipped, as are editions whose title matches none of
/// `title_tokens` (usually foreign-language editions). At most `max_editions`
/// URLs are returned. When every edition is an audio edition, the first one
/// is returned rather than nothing.
pub fn parse_editions(
    html: &str,
    base_url: &Url,
    title_tokens: &[String],
    max_editions: usize,
) -> Vec<String> {
    let document = Html::parse_document(html);

    let Ok(link_selector) = Selector::parse("div.editionData > div:first-child a.bookTitle[href]")
    else {
        return Vec::new();
    };

    let mut editions = Vec::new();
    let mut first_audio = None;

    for link in document.select(&link_selector) {
        let title = element_text(&link).to_lowercase();
        if title.is_empty() {
            continue;
        }
        let Some(url) = link.value().attr("href").and_then(|h| resolve(h, base_url)) else {
            continue;
        };

        if AUDIO_MARKERS.iter().any(|marker| title.contains(marker)) {
            tracing::info!("Skipping audio edition: {}", title);
            if first_audio.is_none() {
                first_audio = Some(url);
            }
            continue;
        }

        if !is_match(title_tokens, &[], &title, &[]) {
            tracing::info!("Skipping alternate title: {}", title);
            continue;
        }

        editions.push(url);
        if editions.len() >= max_editions {
            break;
        }
    }

    if editions.is_empty() {
        if let Some(url) = first_audio {
            tracing::info!("Choosing the first audio edition as no others found");
            editions.push(url);
        }
    }

    editions
}

/// Collects and trims the text of an element
fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Resolves an href against the base URL
fn resolve(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base_url.join(href).ok().map(|url| url.to_string())
}
