//! Configuration module for the Shelfari source
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. The lookup pipeline only reads the configuration; it is shared as an
//! `Arc<Config>` between the orchestrator and its workers.
//!
//! # Example
//!
//! ```no_run
//! use shelfari_metadata::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("shelfari.toml")).unwrap();
//! println!("Expanding editions: {}", config.lookup.expand_editions);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, LookupConfig, SourceConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
