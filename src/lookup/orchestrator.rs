//! Lookup orchestration
//!
//! This module contains the end-to-end flow of a lookup, including:
//! - Choosing between a direct detail page and a catalog search
//! - Following ISBN searches that redirect straight to a book
//! - Parsing and optionally expanding search results into candidates
//! - Launching one staggered worker per candidate and waiting for them
//! - Resolving and downloading covers through the cross-reference cache

use crate::config::Config;
use crate::lookup::{
    book_url, build_query, parse_editions, parse_results, sort_by_relevance, Browser,
    CoverImage, DetailWorker, EditionsLink, LookupRequest, NormalizedRecord, ReqwestBrowser,
    XrefCache,
};
use crate::state::WorkerOutcome;
use crate::text::title_tokens;
use crate::LookupError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Shelfari metadata source
///
/// Owns the configuration, the browser every worker is cloned from and the
/// cross-reference cache. One instance serves any number of lookups.
pub struct Shelfari {
    config: Arc<Config>,
    browser: Arc<dyn Browser>,
    cache: Arc<XrefCache>,
}

/// Candidate detail URLs of one lookup, best first
struct Candidates {
    /// What was asked of the catalog, for error reporting
    query: String,
    urls: Vec<String>,
}

impl Shelfari {
    /// Creates a source backed by a reqwest browser
    pub fn new(config: Config) -> crate::Result<Self> {
        let browser = ReqwestBrowser::new(&config.source)?;
        Ok(Self::with_browser(config, Arc::new(browser)))
    }

    /// Creates a source using the given browser
    pub fn with_browser(config: Config, browser: Arc<dyn Browser>) -> Self {
        Self {
            config: Arc::new(config),
            browser,
            cache: Arc::new(XrefCache::new()),
        }
    }

    /// Replaces the cross-reference cache, e.g. to share it between sources
    pub fn with_cache(mut self, cache: Arc<XrefCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &Arc<XrefCache> {
        &self.cache
    }

    /// Looks up a cover URL in the cross-reference cache only
    pub fn cached_cover_url(&self, identifiers: &HashMap<String, String>) -> Option<String> {
        self.cache.cached_cover_url(identifiers)
    }

    /// Identifies a book and pushes one record per matching detail page
    ///
    /// Records arrive on `sink` in completion order, each carrying its
    /// candidate rank as relevance. Setting `abort` stops launching workers
    /// and returns promptly; workers already running are left to finish and
    /// their records are dropped.
    ///
    /// # Arguments
    ///
    /// * `request` - Title, authors and identifiers of the book
    /// * `sink` - Receives one `NormalizedRecord` per parsed detail page
    /// * `abort` - Cooperative abort signal shared with the workers
    /// * `timeout` - Per-request fetch timeout
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Every worker finished, or the lookup was aborted
    /// * `Err(LookupError)` - The lookup could not start
    ///
    /// # Errors
    ///
    /// * `InsufficientMetadata` - Nothing to search with; no request is made
    /// * `QueryFetch` - The search page could not be fetched
    /// * `PageParse` - The search page URL could not be used as a base
    /// * `NoMatches` - The search produced no candidates
    pub async fn identify(
        &self,
        request: &LookupRequest,
        sink: UnboundedSender<NormalizedRecord>,
        abort: &CancellationToken,
        timeout: Duration,
    ) -> crate::Result<()> {
        let candidates = self.find_candidates(request, abort, timeout).await?;

        if abort.is_cancelled() {
            tracing::info!("Lookup aborted before launching workers");
            return Ok(());
        }

        if candidates.urls.is_empty() {
            tracing::error!("No matches found with query: {}", candidates.query);
            return Err(LookupError::NoMatches {
                query: candidates.query,
            });
        }

        tracing::info!(
            "Launching {} detail workers for query {}",
            candidates.urls.len(),
            candidates.query
        );

        let Some(handles) = self.launch_workers(candidates.urls, sink, abort, timeout).await
        else {
            return Ok(());
        };

        if !self.wait_for_workers(&handles, abort).await {
            tracing::info!(
                "Lookup aborted, leaving {} workers to finish on their own",
                handles.iter().filter(|h| !h.is_finished()).count()
            );
            return Ok(());
        }

        let mut emitted = 0;
        for handle in handles {
            match handle.await {
                Ok(outcome) => {
                    if outcome == WorkerOutcome::Emitted {
                        emitted += 1;
                    }
                }
                Err(e) => tracing::error!("Detail worker failed: {}", e),
            }
        }
        tracing::info!("Lookup finished with {} records", emitted);

        Ok(())
    }

    /// Downloads the cover of the best matching book
    ///
    /// Uses the cross-reference cache when it already knows the cover; runs a
    /// full identify otherwise. Nothing is pushed when no cover is found or
    /// the lookup is aborted.
    ///
    /// # Arguments
    ///
    /// * `request` - Title, authors and identifiers of the book
    /// * `sink` - Receives at most one `CoverImage`
    /// * `abort` - Cooperative abort signal
    /// * `timeout` - Per-request fetch timeout
    ///
    /// # Errors
    ///
    /// Errors of the underlying identify, and `CoverDownload` when the image
    /// request fails.
    pub async fn download_cover(
        &self,
        request: &LookupRequest,
        sink: UnboundedSender<CoverImage>,
        abort: &CancellationToken,
        timeout: Duration,
    ) -> crate::Result<()> {
        let mut cover_url = self.cached_cover_url(&request.identifiers);

        if cover_url.is_none() {
            tracing::info!("No cached cover found, running identify");
            let (tx, mut rx) = mpsc::unbounded_channel();
            self.identify(request, tx, abort, timeout).await?;
            if abort.is_cancelled() {
                return Ok(());
            }

            let mut records = Vec::new();
            while let Ok(record) = rx.try_recv() {
                records.push(record);
            }
            sort_by_relevance(request, &mut records);

            cover_url = records
                .iter()
                .find_map(|record| self.cached_cover_url(&record.identifiers()));
        }

        let Some(url) = cover_url else {
            tracing::info!("No cover found");
            return Ok(());
        };

        if abort.is_cancelled() {
            return Ok(());
        }

        tracing::info!("Downloading cover from: {}", url);
        let page = match self.browser.fetch(&url, timeout).await {
            Ok(page) => page,
            Err(source) => {
                tracing::error!("Failed to download cover from: {}: {}", url, source);
                return Err(LookupError::CoverDownload { url, source });
            }
        };

        if abort.is_cancelled() {
            return Ok(());
        }

        if sink.send(CoverImage { url, data: page.body }).is_err() {
            tracing::debug!("Cover sink is closed");
        }

        Ok(())
    }

    /// Resolves the request into candidate detail URLs
    async fn find_candidates(
        &self,
        request: &LookupRequest,
        abort: &CancellationToken,
        timeout: Duration,
    ) -> crate::Result<Candidates> {
        let base_url = &self.config.source.base_url;

        if let Some(url) = book_url(base_url, &request.identifiers) {
            tracing::info!("Using direct detail page: {}", url);
            return Ok(Candidates {
                query: url.clone(),
                urls: vec![url],
            });
        }

        let Some(query) = build_query(base_url, request) else {
            tracing::error!("Insufficient metadata to construct query");
            return Err(LookupError::InsufficientMetadata);
        };

        tracing::info!("Querying: {}", query);
        let page = match self.browser.fetch(&query, timeout).await {
            Ok(page) => page,
            Err(source) => {
                tracing::error!("Failed to make identify query: {}: {}", query, source);
                return Err(LookupError::QueryFetch { query, source });
            }
        };

        if request.isbn().is_some() {
            let urls = if page.final_url.contains("/search/") {
                tracing::info!("ISBN search was not redirected to a book");
                Vec::new()
            } else {
                tracing::info!("ISBN search redirected to: {}", page.final_url);
                vec![page.final_url]
            };
            return Ok(Candidates { query, urls });
        }

        let page_url = Url::parse(&page.final_url).map_err(|e| {
            tracing::error!("Failed to parse Shelfari page for query: {}", query);
            LookupError::PageParse {
                query: query.clone(),
                message: e.to_string(),
            }
        })?;

        let hits = parse_results(
            &page.text(),
            &page_url,
            request.title.as_deref(),
            &request.authors,
        );

        let expandable = if self.config.lookup.expand_editions {
            hits.first()
                .and_then(|hit| hit.editions.clone())
                .filter(EditionsLink::has_alternatives)
        } else {
            None
        };

        if let Some(editions) = expandable {
            if !abort.is_cancelled() {
                if let Some(urls) = self.expand_editions(&editions, request, timeout).await {
                    return Ok(Candidates { query, urls });
                }
            }
        }

        Ok(Candidates {
            query,
            urls: hits.into_iter().map(|hit| hit.url).collect(),
        })
    }

    /// Fetches an editions page; None means "use the search hits instead"
    async fn expand_editions(
        &self,
        editions: &EditionsLink,
        request: &LookupRequest,
        timeout: Duration,
    ) -> Option<Vec<String>> {
        tracing::info!("Expanding {} from: {}", editions.label, editions.url);

        let page = match self.browser.fetch(&editions.url, timeout).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Failed to fetch editions page {}: {}", editions.url, e);
                return None;
            }
        };

        let page_url = Url::parse(&page.final_url).ok()?;
        let tokens = title_tokens(request.title.as_deref(), true, false);
        let urls = parse_editions(
            &page.text(),
            &page_url,
            &tokens,
            self.config.lookup.max_editions,
        );

        if urls.is_empty() {
            tracing::info!("No usable editions found, keeping search results");
            None
        } else {
            Some(urls)
        }
    }

    /// Spawns one worker per URL in rank order, staggered
    ///
    /// Returns None if the abort signal fired during launching.
    async fn launch_workers(
        &self,
        urls: Vec<String>,
        sink: UnboundedSender<NormalizedRecord>,
        abort: &CancellationToken,
        timeout: Duration,
    ) -> Option<Vec<JoinHandle<WorkerOutcome>>> {
        let stagger = self.config.lookup.launch_stagger();
        let mut handles = Vec::with_capacity(urls.len());

        for (rank, url) in urls.into_iter().enumerate() {
            if rank > 0 {
                tokio::select! {
                    _ = abort.cancelled() => {}
                    _ = tokio::time::sleep(stagger) => {}
                }
            }
            if abort.is_cancelled() {
                tracing::info!("Lookup aborted after launching {} workers", handles.len());
                return None;
            }

            let worker = DetailWorker::new(
                url,
                rank,
                self.browser.clone_browser(),
                sink.clone(),
                abort.clone(),
                Arc::clone(&self.cache),
                Arc::clone(&self.config),
                timeout,
            );
            handles.push(tokio::spawn(worker.run()));
        }

        Some(handles)
    }

    /// Polls until every worker finished; false if aborted first
    async fn wait_for_workers(
        &self,
        handles: &[JoinHandle<WorkerOutcome>],
        abort: &CancellationToken,
    ) -> bool {
        let poll_interval = self.config.lookup.poll_interval();

        while !handles.iter().all(JoinHandle::is_finished) {
            tokio::select! {
                _ = abort.cancelled() => return false,
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }

        !abort.is_cancelled()
    }
}
