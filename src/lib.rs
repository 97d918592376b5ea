//! Shelfari metadata source
//!
//! This crate looks up books on the Shelfari catalog by title, author, ISBN or
//! Shelfari id, scrapes the matching detail pages concurrently, and produces
//! normalized bibliographic records and cover images for a host application.

pub mod config;
pub mod lookup;
pub mod state;
pub mod text;

use thiserror::Error;

/// Top-level error type for lookup operations
///
/// Only request-wide conditions surface here. Per-candidate failures are
/// logged by the worker that hit them and never reach the caller.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Insufficient metadata to construct query")]
    InsufficientMetadata,

    #[error("Failed to make identify query {query}: {source}")]
    QueryFetch {
        query: String,
        source: lookup::FetchError,
    },

    #[error("Failed to parse Shelfari page for query {query}: {message}")]
    PageParse { query: String, message: String },

    #[error("No matches found with query: {query}")]
    NoMatches { query: String },

    #[error("Failed to download cover from {url}: {source}")]
    CoverDownload {
        url: String,
        source: lookup::FetchError,
    },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for lookup operations
pub type Result<T> = std::result::Result<T, LookupError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use lookup::{CoverImage, LookupRequest, NormalizedRecord, Shelfari, XrefCache};
pub use state::WorkerState;
