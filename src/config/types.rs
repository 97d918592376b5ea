use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Main configuration structure for the Shelfari source
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub lookup: LookupConfig,

    /// Genre path (e.g. "Fiction > Mystery") to tags
    ///
    /// Keys are lowercased when the configuration is loaded. An empty table
    /// disables tag extraction.
    #[serde(rename = "genre-mappings", default = "default_genre_mappings")]
    pub genre_mappings: HashMap<String, Vec<String>>,
}

/// Remote catalog configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Root of the catalog, without trailing slash
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Lookup behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LookupConfig {
    /// Per-request page fetch timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Delay between launching two detail workers (milliseconds)
    #[serde(rename = "launch-stagger-ms", default = "default_launch_stagger_ms")]
    pub launch_stagger_ms: u64,

    /// Bounded wait per worker polling round (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Follow "N editions" links from search results
    #[serde(rename = "expand-editions", default)]
    pub expand_editions: bool,

    /// Maximum number of editions kept when expanding
    #[serde(rename = "max-editions", default = "default_max_editions")]
    pub max_editions: usize,
}

impl Config {
    /// Lowercases genre keys so lookups can be case-insensitive
    pub(crate) fn normalize(mut self) -> Self {
        self.genre_mappings = self
            .genre_mappings
            .into_iter()
            .map(|(genre, tags)| (genre.trim().to_lowercase(), tags))
            .collect();
        self
    }

    /// Returns the genre table, or None when tag extraction is disabled
    pub fn genre_map(&self) -> Option<&HashMap<String, Vec<String>>> {
        if self.genre_mappings.is_empty() {
            None
        } else {
            Some(&self.genre_mappings)
        }
    }
}

impl LookupConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn launch_stagger(&self) -> Duration {
        Duration::from_millis(self.launch_stagger_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            lookup: LookupConfig::default(),
            genre_mappings: default_genre_mappings(),
        }
        .normalize()
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            launch_stagger_ms: default_launch_stagger_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            expand_editions: false,
            max_editions: default_max_editions(),
        }
    }
}

fn default_base_url() -> String {
    "http://www.shelfari.com".to_string()
}

fn default_user_agent() -> String {
    format!("shelfari-metadata/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_launch_stagger_ms() -> u64 {
    100
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_max_editions() -> usize {
    5
}

fn default_genre_mappings() -> HashMap<String, Vec<String>> {
    [
        ("Fiction", &["Fiction"][..]),
        ("Fiction > Mystery", &["Fiction", "Mystery & Thriller"][..]),
        ("Fiction > Thriller", &["Fiction", "Mystery & Thriller"][..]),
        ("Fiction > Science Fiction", &["Fiction", "Science Fiction"][..]),
        ("Fiction > Fantasy", &["Fiction", "Fantasy"][..]),
        ("Fiction > Romance", &["Fiction", "Romance"][..]),
        ("Fiction > Historical Fiction", &["Fiction", "Historical"][..]),
        ("Fiction > Horror", &["Fiction", "Horror"][..]),
        ("Non-Fiction", &["Non-Fiction"][..]),
        ("Non-Fiction > Biography", &["Non-Fiction", "Biography"][..]),
        ("Non-Fiction > History", &["Non-Fiction", "History"][..]),
        ("Non-Fiction > Science", &["Non-Fiction", "Science"][..]),
        ("Children's", &["Children's"][..]),
        ("Young Adult", &["Young Adult"][..]),
        ("Poetry", &["Poetry"][..]),
    ]
    .into_iter()
    .map(|(genre, tags)| {
        (
            genre.to_string(),
            tags.iter().map(|t| t.to_string()).collect(),
        )
    })
    .collect()
}
