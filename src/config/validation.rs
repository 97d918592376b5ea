use crate::config::types::{Config, LookupConfig, SourceConfig};
use crate::{ConfigError, ConfigResult};
use std::collections::HashMap;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_source_config(&config.source)?;
    validate_lookup_config(&config.lookup)?;
    validate_genre_mappings(&config.genre_mappings)?;
    Ok(())
}

/// Validates the remote catalog configuration
fn validate_source_config(config: &SourceConfig) -> ConfigResult<()> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.base_url.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "base-url '{}' must not end with '/'",
            config.base_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates lookup timing and edition limits
fn validate_lookup_config(config: &LookupConfig) -> ConfigResult<()> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.poll_interval_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "poll-interval-ms must be >= 10ms, got {}ms",
            config.poll_interval_ms
        )));
    }

    if config.max_editions < 1 || config.max_editions > 20 {
        return Err(ConfigError::Validation(format!(
            "max-editions must be between 1 and 20, got {}",
            config.max_editions
        )));
    }

    Ok(())
}

/// Validates the genre to tag table
fn validate_genre_mappings(mappings: &HashMap<String, Vec<String>>) -> ConfigResult<()> {
    for (genre, tags) in mappings {
        if genre.trim().is_empty() {
            return Err(ConfigError::Validation(
                "genre-mappings keys cannot be empty".to_string(),
            ));
        }

        if tags.iter().any(|tag| tag.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "genre '{}' maps to an empty tag",
                genre
            )));
        }
    }

    Ok(())
}
