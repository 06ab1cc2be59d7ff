//! Configuration validation logic

use super::Config;
use crate::constants::MAX_CONCURRENCY_LIMIT;
use crate::errors::{Result, VolleyError};
use url::Url;

/// Validate the configuration
pub fn validate(config: &Config) -> Result<()> {
    validate_target(config)?;
    validate_load(config)?;
    Ok(())
}

/// Validate target configuration
fn validate_target(config: &Config) -> Result<()> {
    let url = Url::parse(&config.target.url).map_err(|e| {
        VolleyError::config(format!("Invalid target URL '{}': {}", config.target.url, e))
    })?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(VolleyError::config(format!(
                "Invalid URL scheme '{}'. Only 'http' and 'https' are supported",
                scheme
            )));
        }
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(VolleyError::config(format!(
            "Target URL '{}' has no host",
            config.target.url
        )));
    }

    Ok(())
}

/// Validate the request budget and worker count
fn validate_load(config: &Config) -> Result<()> {
    if config.load.requests == 0 {
        return Err(VolleyError::config(
            "Number of requests must be greater than 0",
        ));
    }

    if config.load.concurrency == 0 {
        return Err(VolleyError::config("Concurrency must be greater than 0"));
    }

    if config.load.concurrency > MAX_CONCURRENCY_LIMIT {
        return Err(VolleyError::config(format!(
            "Concurrency cannot exceed {}",
            MAX_CONCURRENCY_LIMIT
        )));
    }

    if config.load.timeout.is_zero() {
        return Err(VolleyError::config("Timeout must be greater than 0"));
    }

    Ok(())
}
