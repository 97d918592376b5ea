//! Detail page parser
//!
//! Each field has its own extractor returning `Result<Option<T>, FieldError>`.
//! An extractor that fails is logged and its field left unset; the others
//! still run, so a page with a broken rating widget still yields a record.

use crate::lookup::dates::parse_pubdate;
use crate::lookup::NormalizedRecord;
use crate::text::{collapse_spaces, digits_only, sanitize_comments_html, site_language_code};
use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;
use url::Url;

/// Title attribute of the ISBN element
const ISBN_DEFINITION: &str = "International Standard Book Number";

/// Marker the site puts in the `<title>` of its 404 page
const NOT_FOUND_MARKER: &str = "<title>404 - ";

/// Failure of a single field extractor
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("invalid selector: {0}")]
    Selector(String),

    #[error("no digits in {field} text {text:?}")]
    NoDigits { field: &'static str, text: String },

    #[error("invalid number {text:?}: {source}")]
    Number {
        text: String,
        source: std::num::ParseFloatError,
    },

    #[error("invalid date {0:?}")]
    Date(String),
}

/// Reasons a fetched page is not a usable detail page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("page is a 404 page")]
    NotFound,

    #[error("page carries an error message: {0}")]
    ErrorMessage(String),
}

/// Everything extracted from one detail page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDetails {
    pub site_id: Option<String>,
    pub title: Option<String>,
    /// Year stripped from the end of the title
    pub title_year: Option<i32>,
    pub series: Option<String>,
    pub series_index: Option<f64>,
    pub authors: Vec<String>,
    pub isbn: Option<String>,
    pub rating: Option<f64>,
    pub comments: Option<String>,
    pub cover_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub publisher: Option<String>,
    pub pubdate: Option<DateTime<Utc>>,
    pub language: Option<String>,
}

impl ParsedDetails {
    /// Names of the mandatory fields that are missing
    pub fn missing_mandatory(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.is_none() {
            missing.push("title");
        }
        if self.authors.is_empty() {
            missing.push("authors");
        }
        if self.site_id.is_none() {
            missing.push("shelfari id");
        }
        missing
    }

    /// Builds the normalized record, or None if a mandatory field is missing
    pub fn into_record(self, relevance: usize) -> Option<NormalizedRecord> {
        let (Some(title), Some(site_id)) = (self.title, self.site_id) else {
            return None;
        };
        if self.authors.is_empty() {
            return None;
        }

        Some(NormalizedRecord {
            title,
            authors: self.authors,
            series_index: self.series.as_ref().and(self.series_index),
            series: self.series,
            site_id,
            isbn: self.isbn,
            rating: self.rating,
            comments: self.comments,
            cover_url: self.cover_url,
            tags: self.tags,
            publisher: self.publisher,
            pubdate: self.pubdate,
            language: self.language,
            relevance,
        })
    }
}

/// Checks that a page is a real detail page
///
/// The site answers unknown ids with a 404 page and bad requests with an
/// error message element, both with status 200.
///
/// # Arguments
///
/// * `raw` - The page body as text
/// * `document` - The same body, parsed
///
/// # Returns
///
/// * `Ok(())` - The page looks like a detail page
/// * `Err(PageError)` - The page is a 404 page or carries an error message
pub fn check_detail_page(raw: &str, document: &Html) -> Result<(), PageError> {
    if raw.contains(NOT_FOUND_MARKER) {
        return Err(PageError::NotFound);
    }

    if let Ok(selector) = Selector::parse("#errorMessage") {
        if let Some(element) = document.select(&selector).next() {
            return Err(PageError::ErrorMessage(element_text(&element)));
        }
    }

    Ok(())
}

/// Validates and parses a detail page in one step
///
/// # Arguments
///
/// * `url` - The detail page URL; the Shelfari id is taken from it
/// * `raw` - The page body
/// * `genre_map` - Genre path to tags table, None to skip tags
///
/// # Returns
///
/// The extracted fields, or the reason the page is not a detail page.
/// Individual field failures are logged and never fail the page.
pub fn parse_detail_page(
    url: &str,
    raw: &str,
    genre_map: Option<&HashMap<String, Vec<String>>>,
) -> Result<ParsedDetails, PageError> {
    let document = Html::parse_document(raw);
    check_detail_page(raw, &document)?;
    Ok(extract_all(url, &document, genre_map))
}

/// Parses every field of a detail page
///
/// Does not run the validity gate; see [`parse_detail_page`].
pub fn parse_details(
    url: &str,
    raw: &str,
    genre_map: Option<&HashMap<String, Vec<String>>>,
) -> ParsedDetails {
    let document = Html::parse_document(raw);
    extract_all(url, &document, genre_map)
}

fn extract_all(
    url: &str,
    document: &Html,
    genre_map: Option<&HashMap<String, Vec<String>>>,
) -> ParsedDetails {
    let mut details = ParsedDetails {
        site_id: parse_site_id(url),
        ..ParsedDetails::default()
    };

    if let Some((title, year)) = isolate(url, "title", parse_title(document)) {
        details.title = Some(title);
        details.title_year = year;
    }
    if let Some((series, index)) = isolate(url, "series", parse_series(document)) {
        details.series = Some(series);
        details.series_index = index;
    }
    details.authors = isolate(url, "authors", parse_authors(document)).unwrap_or_default();
    details.isbn = isolate(url, "ISBN", parse_isbn(document));
    details.rating = isolate(url, "rating", parse_rating(document));
    details.comments = isolate(url, "comments", parse_comments(document));
    details.cover_url = isolate(url, "cover", parse_cover(document, url));
    details.publisher = isolate(url, "publisher", parse_publisher(document));
    details.pubdate = isolate(url, "publication date", parse_pubdate_block(document));
    details.language = isolate(url, "language", parse_language(document));
    if let Some(genre_map) = genre_map {
        details.tags = isolate(url, "tags", parse_tags(document, genre_map));
    }

    if details.pubdate.is_none() {
        details.pubdate = details
            .title_year
            .and_then(|year| Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single());
    }

    details
}

/// Logs a failed extractor and turns it into an unset field
fn isolate<T>(url: &str, field: &str, result: Result<Option<T>, FieldError>) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("Error parsing {} for url {}: {}", field, url, e);
            None
        }
    }
}

fn selector(css: &str) -> Result<Selector, FieldError> {
    Selector::parse(css).map_err(|_| FieldError::Selector(css.to_string()))
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(document: &Html, css: &str) -> Result<Option<String>, FieldError> {
    let selector = selector(css)?;
    Ok(document
        .select(&selector)
        .next()
        .map(|element| element_text(&element))
        .filter(|text| !text.is_empty()))
}

fn site_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/books/(\d+)").expect("valid pattern"))
}

fn title_year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\((\d{4})\)\s*$").expect("valid pattern"))
}

fn series_index_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\s*:?\s*\bBook\s+(\d+(?:\.\d+)?)\s*$").expect("valid pattern")
    })
}

fn role_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s*\([^)]*\)").expect("valid pattern"))
}

/// Extracts the Shelfari id from a detail page URL
pub fn parse_site_id(url: &str) -> Option<String> {
    site_id_pattern()
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

fn parse_title(document: &Html) -> Result<Option<(String, Option<i32>)>, FieldError> {
    let Some(text) = first_text(document, "h1.hover_title")? else {
        return Ok(None);
    };

    let year = title_year_pattern()
        .captures(&text)
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse().ok());
    let title = title_year_pattern().replace(&text, "").trim().to_string();

    Ok(Some((title, year)).filter(|(title, _)| !title.is_empty()))
}

fn parse_series(document: &Html) -> Result<Option<(String, Option<f64>)>, FieldError> {
    let Some(text) = first_text(document, "span.series")? else {
        return Ok(None);
    };

    let index = match series_index_pattern()
        .captures(&text)
        .and_then(|captures| captures.get(1))
    {
        Some(m) => Some(m.as_str().parse().map_err(|source| FieldError::Number {
            text: m.as_str().to_string(),
            source,
        })?),
        None => None,
    };
    let series = series_index_pattern().replace(&text, "").trim().to_string();

    Ok(Some((series, index)).filter(|(series, _)| !series.is_empty()))
}

fn parse_authors(document: &Html) -> Result<Option<Vec<String>>, FieldError> {
    let selector = selector("div#WikiModule_Contributors ol li")?;

    let authors: Vec<String> = document
        .select(&selector)
        .map(|li| {
            role_pattern()
                .replace_all(&element_text(&li), "")
                .trim()
                .to_string()
        })
        .filter(|name| !name.is_empty())
        .collect();

    Ok(Some(authors).filter(|authors| !authors.is_empty()))
}

fn parse_rating(document: &Html) -> Result<Option<f64>, FieldError> {
    let Some(text) = first_text(document, "ul.rating li.current")? else {
        return Ok(None);
    };
    Ok(Some(normalize_rating(&text)?))
}

/// Converts the rating widget text to a 0-5 value
///
/// Newer markup renders hundredths ("400" for 4 stars); values of 100 and
/// above are scaled down. Smaller values are taken as-is.
pub fn normalize_rating(text: &str) -> Result<f64, FieldError> {
    let digits = digits_only(text);
    if digits.is_empty() {
        return Err(FieldError::NoDigits {
            field: "rating",
            text: text.to_string(),
        });
    }

    let value: f64 = digits.parse().map_err(|source| FieldError::Number {
        text: digits.clone(),
        source,
    })?;

    if value >= 100.0 {
        Ok(value / 100.0)
    } else {
        Ok(value)
    }
}

fn parse_comments(document: &Html) -> Result<Option<String>, FieldError> {
    let selector = selector("div.ugc.nonTruncatedSum > p")?;
    let Some(paragraph) = document.select(&selector).next() else {
        return Ok(None);
    };

    let html = collapse_spaces(paragraph.html().trim());
    let comments = sanitize_comments_html(&html);
    Ok(Some(comments).filter(|c| !c.is_empty()))
}

fn parse_cover(document: &Html, page_url: &str) -> Result<Option<String>, FieldError> {
    let selector = selector("div#BookMasterImage img[src]")?;
    let Some(src) = document
        .select(&selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
    else {
        return Ok(None);
    };

    let resolved = Url::parse(page_url)
        .and_then(|base| base.join(src))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| src.to_string());
    Ok(Some(resolved))
}

fn parse_isbn(document: &Html) -> Result<Option<String>, FieldError> {
    let css = format!("acronym[title=\"{}\"]", ISBN_DEFINITION);
    let Some(text) = first_text(document, &css)? else {
        return Ok(None);
    };
    let digits = digits_only(&text);
    Ok(Some(digits).filter(|d| !d.is_empty()))
}

/// Text blocks of the first edition module
fn first_edition_blocks(document: &Html) -> Result<Vec<String>, FieldError> {
    let selector = selector("div#WikiModule_FirstEdition div")?;
    Ok(document
        .select(&selector)
        .map(|div| div.text().collect::<String>())
        .collect())
}

/// Returns the text following `label` up to the end of the line or the next
/// label of the block
fn label_value(block: &str, label: &str) -> Option<String> {
    let start = block.find(label)? + label.len();
    let rest = &block[start..];
    let end = ["\n", "Publisher:", "Published:"]
        .iter()
        .filter_map(|stop| rest.find(stop))
        .min()
        .unwrap_or(rest.len());
    let value = rest[..end].trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_publisher(document: &Html) -> Result<Option<String>, FieldError> {
    Ok(first_edition_blocks(document)?
        .iter()
        .find_map(|block| label_value(block, "Publisher:")))
}

fn parse_pubdate_block(document: &Html) -> Result<Option<DateTime<Utc>>, FieldError> {
    let Some(text) = first_edition_blocks(document)?
        .iter()
        .find_map(|block| label_value(block, "Published:"))
    else {
        return Ok(None);
    };
    parse_pubdate(&text).map(Some)
}

fn parse_language(document: &Html) -> Result<Option<String>, FieldError> {
    let Some(name) = first_text(document, "[itemprop=\"inLanguage\"]")? else {
        return Ok(None);
    };

    let code = site_language_code(&name);
    if code.is_none() {
        tracing::debug!("Unrecognized language name: {}", name);
    }
    Ok(code.map(str::to_string))
}

fn parse_tags(
    document: &Html,
    genre_map: &HashMap<String, Vec<String>>,
) -> Result<Option<Vec<String>>, FieldError> {
    let genre_selector = selector("div.stacked div.bigBoxContent div.left")?;
    let link_selector = selector("a")?;

    let mut tags: Vec<String> = Vec::new();
    for genre in document.select(&genre_selector) {
        let path: Vec<String> = genre
            .select(&link_selector)
            .map(|a| element_text(&a))
            .filter(|name| !name.is_empty())
            .collect();
        if path.is_empty() {
            continue;
        }

        let key = path.join(" > ").to_lowercase();
        if let Some(mapped) = genre_map.get(&key) {
            for tag in mapped {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }
    }

    Ok(Some(tags).filter(|tags| !tags.is_empty()))
}
