//! Integration tests for the lookup pipeline
//!
//! These tests use wiremock to stand in for the Shelfari catalog and run
//! identify and cover requests end-to-end over real HTTP.

use shelfari_metadata::config::Config;
use shelfari_metadata::lookup::{FetchError, ISBN};
use shelfari_metadata::{LookupError, LookupRequest, NormalizedRecord, Shelfari};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DETAIL_PAGE: &str = include_str!("../fixtures/detail_61_hours.html");
const TIMEOUT: Duration = Duration::from_secs(5);

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.source.base_url = base_url.to_string();
    config.lookup.launch_stagger_ms = 10;
    config.lookup.poll_interval_ms = 20;
    config
}

/// Detail page whose cover lives on the mock server
fn detail_page(base_url: &str) -> String {
    DETAIL_PAGE.replace(
        "http://images.shelfari.com/6977769/cover.jpg",
        &format!("{}/covers/6977769.jpg", base_url),
    )
}

fn isbn_request() -> LookupRequest {
    LookupRequest::new()
        .with_title("61 Hours")
        .with_author("Lee Child")
        .with_identifier(ISBN, "9780385340588")
}

fn drain(rx: &mut mpsc::UnboundedReceiver<NormalizedRecord>) -> Vec<NormalizedRecord> {
    let mut records = Vec::new();
    while let Ok(record) = rx.try_recv() {
        records.push(record);
    }
    records
}

async fn mount_isbn_redirect(server: &MockServer) {
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/search/books"))
        .and(query_param("Isbn", "9780385340588"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/books/6977769", base_url).as_str()),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/books/6977769"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page(&base_url))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_isbn_redirect_end_to_end() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_isbn_redirect(&mock_server).await;

    let source = Shelfari::new(create_test_config(&base_url)).expect("Failed to build source");
    let (tx, mut rx) = mpsc::unbounded_channel();
    source
        .identify(&isbn_request(), tx, &CancellationToken::new(), TIMEOUT)
        .await
        .expect("identify failed");

    let records = drain(&mut rx);
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.title, "61 Hours");
    assert_eq!(record.authors, vec!["Lee Child".to_string()]);
    assert_eq!(record.series.as_deref(), Some("Jack Reacher"));
    assert_eq!(record.series_index, Some(14.0));
    assert_eq!(record.site_id, "6977769");
    assert_eq!(record.isbn.as_deref(), Some("9780385340588"));
    assert_eq!(record.language.as_deref(), Some("eng"));
    assert_eq!(record.publisher.as_deref(), Some("Delacorte Press"));
    assert_eq!(
        record.cover_url.as_deref(),
        Some(format!("{}/covers/6977769.jpg", base_url).as_str())
    );
}

#[tokio::test]
async fn test_cover_uses_cache_after_identify() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_isbn_redirect(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/covers/6977769.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0xff, 0xd8, 0xff, 0xe0])
                .insert_header("content-type", "image/jpeg"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let source = Shelfari::new(create_test_config(&base_url)).expect("Failed to build source");
    let abort = CancellationToken::new();

    let (tx, _rx) = mpsc::unbounded_channel();
    source
        .identify(&isbn_request(), tx, &abort, TIMEOUT)
        .await
        .expect("identify failed");

    // Only the ISBN is known; the cache must resolve the rest
    let request = LookupRequest::new().with_identifier(ISBN, "9780385340588");
    let (tx, mut rx) = mpsc::unbounded_channel();
    source
        .download_cover(&request, tx, &abort, TIMEOUT)
        .await
        .expect("cover download failed");

    let cover = rx.try_recv().expect("no cover emitted");
    assert_eq!(cover.data, vec![0xff, 0xd8, 0xff, 0xe0]);
    assert_eq!(cover.url, format!("{}/covers/6977769.jpg", base_url));
}

#[tokio::test]
async fn test_title_search_tolerates_failing_candidates() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/search/books"))
        .and(query_param("Title", "61 Hours"))
        .and(query_param("Author", "Lee Child"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><ol class="book_results">
                <li><div class="text"><h3><a href="/books/6977769">61 Hours</a></h3><a href="/a">Lee Child</a></div></li>
                <li><div class="text"><h3><a href="/books/111">Worth Dying For</a></h3><a href="/a">Lee Child</a></div></li>
                <li><div class="text"><h3><a href="/books/222">61 Hours</a></h3><a href="/a">Lee Child</a></div></li>
            </ol></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/books/6977769"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(&base_url)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/books/222"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    // The rejected search hit must never be fetched
    Mock::given(method("GET"))
        .and(path("/books/111"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let source = Shelfari::new(create_test_config(&base_url)).expect("Failed to build source");
    let request = LookupRequest::new().with_title("61 Hours").with_author("Lee Child");
    let (tx, mut rx) = mpsc::unbounded_channel();
    source
        .identify(&request, tx, &CancellationToken::new(), TIMEOUT)
        .await
        .expect("identify failed");

    let records = drain(&mut rx);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].relevance, 0);
}

#[tokio::test]
async fn test_search_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/books"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let source =
        Shelfari::new(create_test_config(&mock_server.uri())).expect("Failed to build source");
    let request = LookupRequest::new().with_title("61 Hours");
    let (tx, _rx) = mpsc::unbounded_channel();
    let result = source
        .identify(&request, tx, &CancellationToken::new(), TIMEOUT)
        .await;

    match result {
        Err(LookupError::QueryFetch {
            source: FetchError::Status { status, .. },
            ..
        }) => assert_eq!(status, 503),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_detail_page_times_out() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/books/6977769"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page(&base_url))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let source = Shelfari::new(create_test_config(&base_url)).expect("Failed to build source");
    let request = LookupRequest::new().with_identifier("shelfari", "6977769");
    let (tx, mut rx) = mpsc::unbounded_channel();
    source
        .identify(&request, tx, &CancellationToken::new(), Duration::from_millis(300))
        .await
        .expect("identify failed");

    assert!(drain(&mut rx).is_empty());
}
