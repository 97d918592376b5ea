//! Search query construction
//!
//! Turns a lookup request into the catalog search URL. ISBN searches take
//! priority: the catalog resolves them server-side by redirecting to the book
//! page, so title and author parameters would only get in the way.

use crate::lookup::{LookupRequest, SHELFARI_ID};
use crate::text::{author_tokens, check_isbn, title_tokens};
use std::collections::HashMap;

/// Builds the direct detail page URL when a Shelfari id is known
pub fn book_url(base_url: &str, identifiers: &HashMap<String, String>) -> Option<String> {
    identifiers
        .get(SHELFARI_ID)
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(|id| format!("{}/books/{}", base_url, id))
}

/// Builds the search URL for a request
///
/// Returns None when the request carries neither a valid ISBN nor any usable
/// title or author token.
///
/// # Examples
///
/// ```
/// use shelfari_metadata::lookup::{build_query, LookupRequest};
///
/// let request = LookupRequest::new().with_title("61 Hours").with_author("Lee Child");
/// assert_eq!(
///     build_query("http://www.shelfari.com", &request).as_deref(),
///     Some("http://www.shelfari.com/search/books?Title=61+Hours&Author=Lee+Child")
/// );
/// ```
pub fn build_query(base_url: &str, request: &LookupRequest) -> Option<String> {
    let isbn = request
        .identifiers
        .get(crate::lookup::ISBN)
        .and_then(|isbn| check_isbn(isbn));

    let mut params = Vec::new();
    if let Some(isbn) = isbn {
        params.push(format!("Isbn={}", isbn));
    } else {
        let title_tokens: Vec<String> = title_tokens(request.title.as_deref(), true, true)
            .iter()
            .map(|token| urlencoding::encode(token).into_owned())
            .collect();
        let author_tokens: Vec<String> = author_tokens(&request.authors, true)
            .iter()
            .map(|token| urlencoding::encode(token).into_owned())
            .collect();

        if !title_tokens.is_empty() {
            params.push(format!("Title={}", title_tokens.join("+")));
        }
        if !author_tokens.is_empty() {
            params.push(format!("Author={}", author_tokens.join("+")));
        }
    }

    if params.is_empty() {
        return None;
    }

    Some(format!("{}/search/books?{}", base_url, params.join("&")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::ISBN;

    const BASE: &str = "http://www.shelfari.com";

    #[test]
    fn test_empty_request_has_no_query() {
        assert_eq!(build_query(BASE, &LookupRequest::new()), None);
    }

    #[test]
    fn test_invalid_isbn_alone_has_no_query() {
        let request = LookupRequest::new().with_identifier(ISBN, "1234567890");
        assert_eq!(build_query(BASE, &request), None);
    }

    #[test]
    fn test_isbn_only_query() {
        let request = LookupRequest::new()
            .with_title("61 Hours")
            .with_author("Lee Child")
            .with_identifier(ISBN, "9780385340588");

        let query = build_query(BASE, &request).unwrap();
        assert_eq!(query, "http://www.shelfari.com/search/books?Isbn=9780385340588");
        assert!(!query.contains("Title="));
        assert!(!query.contains("Author="));
    }

    #[test]
    fn test_title_and_author_query() {
        let request = LookupRequest::new()
            .with_title("The Girl Hunters")
            .with_author("Mickey Spillane");

        assert_eq!(
            build_query(BASE, &request).as_deref(),
            Some("http://www.shelfari.com/search/books?Title=Girl+Hunters&Author=Mickey+Spillane")
        );
    }

    #[test]
    fn test_joining_words_dropped_from_title() {
        let request = LookupRequest::new().with_title("The Lion, the Witch and the Wardrobe");
        let query = build_query(BASE, &request).unwrap();
        assert_eq!(
            query,
            "http://www.shelfari.com/search/books?Title=Lion+Witch+Wardrobe"
        );
        assert!(!query.contains("Title=The+"));
    }

    #[test]
    fn test_subtitle_stripped_and_first_author_only() {
        let request = LookupRequest::new()
            .with_title("Dune: Deluxe Edition")
            .with_author("Frank Herbert")
            .with_author("Brian Herbert");

        assert_eq!(
            build_query(BASE, &request).as_deref(),
            Some("http://www.shelfari.com/search/books?Title=Dune&Author=Frank+Herbert")
        );
    }

    #[test]
    fn test_author_only_query() {
        let request = LookupRequest::new().with_author("Lee Child");
        assert_eq!(
            build_query(BASE, &request).as_deref(),
            Some("http://www.shelfari.com/search/books?Author=Lee+Child")
        );
    }

    #[test]
    fn test_tokens_are_percent_encoded() {
        let request = LookupRequest::new().with_title("Les Misérables");
        assert_eq!(
            build_query(BASE, &request).as_deref(),
            Some("http://www.shelfari.com/search/books?Title=Les+Mis%C3%A9rables")
        );
    }

    #[test]
    fn test_book_url() {
        let mut identifiers = HashMap::new();
        assert_eq!(book_url(BASE, &identifiers), None);

        identifiers.insert(SHELFARI_ID.to_string(), "6977769".to_string());
        assert_eq!(
            book_url(BASE, &identifiers).as_deref(),
            Some("http://www.shelfari.com/books/6977769")
        );
    }
}
