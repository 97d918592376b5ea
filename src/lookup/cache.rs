//! Cross-reference cache
//!
//! This module keeps the ISBN → Shelfari id and Shelfari id → cover URL pairs
//! resolved by detail workers, so that a later cover request can skip the
//! search entirely. Entries never expire; the cache lives as long as the
//! `Shelfari` instance that owns it.

use crate::lookup::{ISBN, SHELFARI_ID};
use crate::text::check_isbn;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// In-memory cross-reference cache shared by all workers of a source
///
/// Safe for concurrent readers and writers; the last writer of a key wins.
#[derive(Debug, Default)]
pub struct XrefCache {
    isbn_to_id: RwLock<HashMap<String, String>>,
    id_to_cover: RwLock<HashMap<String, String>>,
}

impl XrefCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `isbn` belongs to the book with Shelfari id `id`
    pub fn cache_isbn_to_identifier(&self, isbn: &str, id: &str) {
        self.isbn_to_id
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(isbn_key(isbn), id.to_string());
    }

    /// Returns the Shelfari id cached for `isbn`
    pub fn cached_isbn_to_identifier(&self, isbn: &str) -> Option<String> {
        self.isbn_to_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&isbn_key(isbn))
            .cloned()
    }

    /// Records the cover URL of the book with Shelfari id `id`
    pub fn cache_identifier_to_cover_url(&self, id: &str, url: &str) {
        self.id_to_cover
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.trim().to_string(), url.to_string());
    }

    /// Returns the cover URL cached for Shelfari id `id`
    pub fn cached_identifier_to_cover_url(&self, id: &str) -> Option<String> {
        self.id_to_cover
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id.trim())
            .cloned()
    }

    /// Resolves a cover URL from a set of identifiers
    ///
    /// Tries the Shelfari id first, then the ISBN through the ISBN → id map.
    pub fn cached_cover_url(&self, identifiers: &HashMap<String, String>) -> Option<String> {
        let id = identifiers
            .get(SHELFARI_ID)
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .or_else(|| {
                identifiers
                    .get(ISBN)
                    .and_then(|isbn| self.cached_isbn_to_identifier(isbn))
            })?;

        self.cached_identifier_to_cover_url(&id)
    }

    /// Number of cached ISBN → id pairs
    pub fn isbn_count(&self) -> usize {
        self.isbn_to_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of cached id → cover pairs
    pub fn cover_count(&self) -> usize {
        self.id_to_cover
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Normalizes an ISBN so hyphenated and bare forms share a key
fn isbn_key(raw: &str) -> String {
    check_isbn(raw).unwrap_or_else(|| raw.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn identifiers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_cache() {
        let cache = XrefCache::new();
        assert_eq!(cache.cached_isbn_to_identifier("9780385340588"), None);
        assert_eq!(cache.cached_identifier_to_cover_url("6977769"), None);
        assert_eq!(cache.isbn_count(), 0);
        assert_eq!(cache.cover_count(), 0);
    }

    #[test]
    fn test_isbn_key_ignores_formatting() {
        let cache = XrefCache::new();
        cache.cache_isbn_to_identifier("978-0-385-34058-8", "6977769");
        assert_eq!(
            cache.cached_isbn_to_identifier("9780385340588").as_deref(),
            Some("6977769")
        );
    }

    #[test]
    fn test_last_writer_wins() {
        let cache = XrefCache::new();
        cache.cache_identifier_to_cover_url("1", "http://a/1.jpg");
        cache.cache_identifier_to_cover_url("1", "http://a/2.jpg");
        assert_eq!(
            cache.cached_identifier_to_cover_url("1").as_deref(),
            Some("http://a/2.jpg")
        );
        assert_eq!(cache.cover_count(), 1);
    }

    #[test]
    fn test_cover_through_isbn() {
        let cache = XrefCache::new();
        cache.cache_isbn_to_identifier("9780385340588", "6977769");
        cache.cache_identifier_to_cover_url("6977769", "http://images/cover.jpg");

        let by_isbn = identifiers(&[(ISBN, "9780385340588")]);
        assert_eq!(
            cache.cached_cover_url(&by_isbn).as_deref(),
            Some("http://images/cover.jpg")
        );

        let by_id = identifiers(&[(SHELFARI_ID, "6977769")]);
        assert_eq!(
            cache.cached_cover_url(&by_id).as_deref(),
            Some("http://images/cover.jpg")
        );

        let unknown = identifiers(&[(ISBN, "0385340583")]);
        assert_eq!(cache.cached_cover_url(&unknown), None);
    }

    #[test]
    fn test_concurrent_writers() {
        let cache = Arc::new(XrefCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.cache_identifier_to_cover_url(&i.to_string(), "http://a/c.jpg");
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.cover_count(), 8);
    }
}
