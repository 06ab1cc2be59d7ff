//! Default values and configuration presets

use super::{Config, LoadConfig, OutputConfig, ReportFormat, TargetConfig};
use std::time::Duration;

/// Default configuration values
pub struct Defaults;

impl Defaults {
    pub const REQUESTS: u64 = 1;
    pub const CONCURRENCY: u32 = 1;
    pub const TIMEOUT_SECONDS: u64 = 30;
}

impl Config {
    /// Create a default configuration against the given target
    pub fn for_target(target_url: impl Into<String>) -> Self {
        Self {
            target: TargetConfig {
                url: target_url.into(),
            },
            load: LoadConfig {
                requests: Defaults::REQUESTS,
                concurrency: Defaults::CONCURRENCY,
                timeout: Duration::from_secs(Defaults::TIMEOUT_SECONDS),
            },
            output: OutputConfig {
                verbose: false,
                format: ReportFormat::Text,
            },
        }
    }

    /// Override the request budget and worker count
    pub fn with_load(mut self, requests: u64, concurrency: u32) -> Self {
        self.load.requests = requests;
        self.load.concurrency = concurrency;
        self
    }
}
