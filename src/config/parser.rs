//! Command-line argument parsing for Volley configuration

use clap::Parser;
use std::time::Duration;

use super::{Config, LoadConfig, OutputConfig, ReportFormat, TargetConfig};
use crate::errors::{ErrorContext, Result, VolleyError};

/// Raw configuration from command line arguments
#[derive(Parser, Debug, Clone)]
#[command(
    name = "volley",
    version,
    about = "Stress test an HTTP endpoint with a fixed number of requests spread over concurrent workers",
    long_about = None
)]
pub struct RawConfig {
    /// Target URL
    #[arg(
        short = 'u',
        long = "url",
        value_name = "URL",
        help = "URL of the service to be tested"
    )]
    pub url: String,

    /// Total number of requests
    #[arg(
        short = 'n',
        long = "requests",
        value_name = "COUNT",
        default_value = "1",
        help = "Total number of requests"
    )]
    pub requests: u64,

    /// Number of simultaneous workers
    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "COUNT",
        default_value = "1",
        help = "Number of simultaneous calls"
    )]
    pub concurrency: u32,

    /// Per-request timeout in seconds
    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        default_value = "30",
        help = "Per-request timeout in seconds"
    )]
    pub timeout: u64,

    /// Machine-readable output
    #[arg(long = "json", help = "Print the final report as JSON")]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose", help = "Enable verbose logging")]
    pub verbose: bool,
}

impl RawConfig {
    /// Parse from command line arguments
    pub fn parse_from_args() -> Result<Self> {
        Ok(Self::parse())
    }

    /// Parse from an explicit argument list (first item is the program name)
    pub fn parse_from_list<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args).with_config_context("Invalid arguments")
    }
}

impl TryFrom<RawConfig> for Config {
    type Error = VolleyError;

    fn try_from(raw: RawConfig) -> Result<Self> {
        let url = raw.url.trim().to_string();
        if url.is_empty() {
            return Err(VolleyError::config("Target URL cannot be empty"));
        }

        let format = if raw.json {
            ReportFormat::Json
        } else {
            ReportFormat::Text
        };

        Ok(Config {
            target: TargetConfig { url },
            load: LoadConfig {
                requests: raw.requests,
                concurrency: raw.concurrency,
                timeout: Duration::from_secs(raw.timeout),
            },
            output: OutputConfig {
                verbose: raw.verbose,
                format,
            },
        })
    }
}
