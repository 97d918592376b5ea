//! HTTP browser used by the lookup pipeline
//!
//! This module handles all HTTP requests, including:
//! - Building the HTTP client with the configured user agent
//! - GET requests with a per-call timeout
//! - Following redirects and reporting the final URL
//! - Error classification (not found, timeout, other)

use crate::config::SourceConfig;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A fetched page or image
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,

    /// Raw response body
    pub body: Vec<u8>,
}

impl FetchedPage {
    /// Decodes the body as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Failure classes of a fetch
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Not found: {url}")]
    NotFound { url: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if error.status() == Some(StatusCode::NOT_FOUND) {
            Self::NotFound {
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// The browsing primitive the lookup pipeline runs on
///
/// Implementations must follow redirects and report the URL they finally
/// landed on, because ISBN searches are resolved server-side by redirecting
/// to the book page.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Performs one GET request bounded by `timeout`
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError>;

    /// Returns an independent session for use by another task
    fn clone_browser(&self) -> Arc<dyn Browser>;
}

/// `Browser` backed by a `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestBrowser {
    client: Client,
}

impl ReqwestBrowser {
    /// Builds a browser from the source configuration
    ///
    /// # Example
    ///
    /// ```no_run
    /// use shelfari_metadata::config::SourceConfig;
    /// use shelfari_metadata::lookup::ReqwestBrowser;
    ///
    /// let browser = ReqwestBrowser::new(&SourceConfig::default()).unwrap();
    /// ```
    pub fn new(config: &SourceConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::limited(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Browser for ReqwestBrowser {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        let final_url = response.url().to_string();

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                url: url.to_string(),
            });
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        Ok(FetchedPage {
            final_url,
            body: body.to_vec(),
        })
    }

    fn clone_browser(&self) -> Arc<dyn Browser> {
        Arc::new(self.clone())
    }
}
