//! Relevance ordering for cover selection

use crate::lookup::{LookupRequest, NormalizedRecord};
use crate::text::check_isbn;

/// Sort key of a record relative to the request it answers
///
/// Sorting ascending puts the best record first: matching ISBN, then having a
/// cover, then an exact title match, then the worker rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RelevanceKey {
    pub isbn_mismatch: bool,
    pub missing_cover: bool,
    pub title_mismatch: bool,
    pub rank: usize,
}

impl RelevanceKey {
    /// Computes the key of `record` for `request`
    ///
    /// When the request has no valid ISBN, no record counts as a mismatch.
    /// The same applies to the title.
    pub fn new(request: &LookupRequest, record: &NormalizedRecord) -> Self {
        let isbn_mismatch = match request.isbn() {
            Some(wanted) => record.isbn.as_deref().and_then(check_isbn) != Some(wanted),
            None => false,
        };

        let title_mismatch = match request.title.as_deref() {
            Some(wanted) => wanted.trim().to_lowercase() != record.title.trim().to_lowercase(),
            None => false,
        };

        Self {
            isbn_mismatch,
            missing_cover: record.cover_url.is_none(),
            title_mismatch,
            rank: record.relevance,
        }
    }
}

/// Sorts records best first
pub fn sort_by_relevance(request: &LookupRequest, records: &mut [NormalizedRecord]) {
    records.sort_by_key(|record| RelevanceKey::new(request, record));
}
