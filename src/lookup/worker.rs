//! Detail page worker
//!
//! One worker runs per candidate URL. It fetches the detail page, parses it,
//! writes the cross-references it resolved to the cache and pushes the record
//! to the shared sink. Failures end the worker quietly; they are logged here
//! and reported through the returned [`WorkerOutcome`].

use crate::config::Config;
use crate::lookup::{parse_detail_page, Browser, FetchError, NormalizedRecord, XrefCache};
use crate::state::{WorkerOutcome, WorkerState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Fetches and parses one candidate detail page
pub struct DetailWorker {
    url: String,
    rank: usize,
    browser: Arc<dyn Browser>,
    sink: UnboundedSender<NormalizedRecord>,
    abort: CancellationToken,
    cache: Arc<XrefCache>,
    config: Arc<Config>,
    timeout: Duration,
    state: WorkerState,
}

impl DetailWorker {
    /// Creates a worker in the `Created` state
    ///
    /// # Arguments
    ///
    /// * `url` - Candidate detail page URL
    /// * `rank` - Position in the candidate list, becomes the record's relevance
    /// * `browser` - Session owned by this worker
    /// * `sink` - Where the record goes
    /// * `abort` - Shared abort signal
    /// * `cache` - Shared cross-reference cache
    /// * `config` - Source configuration (genre table)
    /// * `timeout` - Detail page fetch timeout
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        url: String,
        rank: usize,
        browser: Arc<dyn Browser>,
        sink: UnboundedSender<NormalizedRecord>,
        abort: CancellationToken,
        cache: Arc<XrefCache>,
        config: Arc<Config>,
        timeout: Duration,
    ) -> Self {
        Self {
            url,
            rank,
            browser,
            sink,
            abort,
            cache,
            config,
            timeout,
            state: WorkerState::Created,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Runs the worker to completion
    pub async fn run(mut self) -> WorkerOutcome {
        let outcome = self.process().await;
        self.transition(WorkerState::Done);
        tracing::debug!("Worker {} for {} finished: {}", self.rank, self.url, outcome);
        outcome
    }

    async fn process(&mut self) -> WorkerOutcome {
        if self.abort.is_cancelled() {
            return WorkerOutcome::Aborted;
        }

        self.transition(WorkerState::Fetching);
        let page = match self.browser.fetch(&self.url, self.timeout).await {
            Ok(page) => page,
            Err(e) => return self.fetch_failed(e),
        };

        if self.abort.is_cancelled() {
            tracing::debug!("Abandoning {} after abort", self.url);
            return WorkerOutcome::Aborted;
        }

        self.transition(WorkerState::Parsing);
        let raw = page.text();
        let details = match parse_detail_page(&self.url, &raw, self.config.genre_map()) {
            Ok(details) => details,
            Err(e) => {
                tracing::warn!("URL {} was not found: {}", self.url, e);
                return WorkerOutcome::NotFound;
            }
        };

        let missing = details.missing_mandatory();
        let Some(record) = details.into_record(self.rank) else {
            tracing::error!(
                "Could not find {} for url {}",
                missing.join(", "),
                self.url
            );
            return WorkerOutcome::Incomplete;
        };

        self.transition(WorkerState::Emitting);
        self.cache_references(&record);

        if self.abort.is_cancelled() {
            tracing::debug!("Abandoning record for {} after abort", self.url);
            return WorkerOutcome::Aborted;
        }

        tracing::info!("Found: {} by {}", record.title, record.authors.join(" & "));
        if self.sink.send(record).is_err() {
            tracing::debug!("Result sink for {} is closed", self.url);
            return WorkerOutcome::Aborted;
        }

        WorkerOutcome::Emitted
    }

    fn fetch_failed(&self, error: FetchError) -> WorkerOutcome {
        match error {
            FetchError::NotFound { .. } => {
                tracing::warn!("URL {} was not found", self.url);
                WorkerOutcome::NotFound
            }
            FetchError::Timeout { .. } => {
                tracing::warn!("Shelfari timed out. Try again later.");
                WorkerOutcome::TimedOut
            }
            other => {
                tracing::error!("Failed to make details query {}: {:?}", self.url, other);
                WorkerOutcome::NetworkError
            }
        }
    }

    fn cache_references(&self, record: &NormalizedRecord) {
        if let Some(isbn) = &record.isbn {
            self.cache.cache_isbn_to_identifier(isbn, &record.site_id);
        }
        if let Some(cover_url) = &record.cover_url {
            self.cache
                .cache_identifier_to_cover_url(&record.site_id, cover_url);
        }
    }

    fn transition(&mut self, next: WorkerState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal worker transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!("Worker {}: {} -> {}", self.rank, self.state, next);
        self.state = next;
    }
}
