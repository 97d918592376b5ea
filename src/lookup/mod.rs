//! Lookup module for the Shelfari catalog
//!
//! This module contains the search-and-fetch pipeline, including:
//! - Query building from a title, authors or ISBN
//! - Search result parsing and filtering
//! - Detail page parsing into normalized records
//! - One concurrent worker per candidate detail page
//! - The cross-reference cache used by cover downloads
//! - Overall lookup orchestration (`Shelfari`)

mod browser;
mod cache;
mod dates;
mod details;
mod orchestrator;
mod query;
mod ranking;
mod results;
mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use browser::{Browser, FetchError, FetchedPage, ReqwestBrowser};
pub use cache::XrefCache;
pub use dates::parse_pubdate;
pub use details::{
    check_detail_page, parse_detail_page, parse_details, FieldError, PageError, ParsedDetails,
};
pub use orchestrator::Shelfari;
pub use query::{book_url, build_query};
pub use ranking::{sort_by_relevance, RelevanceKey};
pub use results::{is_match, parse_editions, parse_results, EditionsLink, SearchHit};
pub use worker::DetailWorker;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

/// Identifier kind for Shelfari book ids
pub const SHELFARI_ID: &str = "shelfari";

/// Identifier kind for ISBNs
pub const ISBN: &str = "isbn";

/// Everything known about a book before the lookup starts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupRequest {
    pub title: Option<String>,
    pub authors: Vec<String>,
    /// Identifier kind (`"shelfari"`, `"isbn"`, ...) to value
    pub identifiers: HashMap<String, String>,
}

impl LookupRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    pub fn with_identifier(mut self, kind: impl Into<String>, value: impl Into<String>) -> Self {
        self.identifiers.insert(kind.into(), value.into());
        self
    }

    /// Returns the Shelfari id, if one was supplied
    pub fn shelfari_id(&self) -> Option<&str> {
        self.identifiers
            .get(SHELFARI_ID)
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
    }

    /// Returns the supplied ISBN if it passes checksum validation
    pub fn isbn(&self) -> Option<String> {
        self.identifiers
            .get(ISBN)
            .and_then(|isbn| crate::text::check_isbn(isbn))
    }
}

/// A book record in the host's normalized shape
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub title: String,
    pub authors: Vec<String>,
    pub series: Option<String>,
    pub series_index: Option<f64>,
    pub site_id: String,
    pub isbn: Option<String>,
    /// 0 to 5 for well-formed pages
    pub rating: Option<f64>,
    /// Sanitized HTML
    pub comments: Option<String>,
    pub cover_url: Option<String>,
    /// Deduplicated, in genre order
    pub tags: Option<Vec<String>>,
    pub publisher: Option<String>,
    pub pubdate: Option<DateTime<Utc>>,
    /// ISO 639-2 code
    pub language: Option<String>,
    /// Candidate rank, 0 is the most relevant
    pub relevance: usize,
}

impl NormalizedRecord {
    /// Returns the record's identifiers in the same shape as a request's
    pub fn identifiers(&self) -> HashMap<String, String> {
        let mut identifiers = HashMap::new();
        identifiers.insert(SHELFARI_ID.to_string(), self.site_id.clone());
        if let Some(isbn) = &self.isbn {
            identifiers.insert(ISBN.to_string(), isbn.clone());
        }
        identifiers
    }
}

impl fmt::Display for NormalizedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title:     {}", self.title)?;
        writeln!(f, "Authors:   {}", self.authors.join(" & "))?;
        if let Some(series) = &self.series {
            match self.series_index {
                Some(index) => writeln!(f, "Series:    {} [{}]", series, index)?,
                None => writeln!(f, "Series:    {}", series)?,
            }
        }
        writeln!(f, "Shelfari:  {}", self.site_id)?;
        if let Some(isbn) = &self.isbn {
            writeln!(f, "ISBN:      {}", isbn)?;
        }
        if let Some(rating) = self.rating {
            writeln!(f, "Rating:    {:.2}", rating)?;
        }
        if let Some(publisher) = &self.publisher {
            writeln!(f, "Publisher: {}", publisher)?;
        }
        if let Some(pubdate) = &self.pubdate {
            writeln!(f, "Published: {}", pubdate.format("%Y-%m-%d"))?;
        }
        if let Some(language) = &self.language {
            writeln!(f, "Language:  {}", language)?;
        }
        if let Some(tags) = &self.tags {
            writeln!(f, "Tags:      {}", tags.join(", "))?;
        }
        if let Some(cover_url) = &self.cover_url {
            writeln!(f, "Cover:     {}", cover_url)?;
        }
        if let Some(comments) = &self.comments {
            writeln!(f, "Comments:  {}", comments)?;
        }
        write!(f, "Relevance: {}", self.relevance)
    }
}

/// A downloaded cover image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub url: String,
    pub data: Vec<u8>,
}
