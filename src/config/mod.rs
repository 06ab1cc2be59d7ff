//! Configuration management for the Volley load generator
//!
//! This module provides a layered approach to configuration:
//! - Core structures and enums
//! - CLI argument parsing
//! - Configuration validation
//! - Default value management
//!
//! A `Config` is built once and handed by value to the coordinator.

pub mod defaults;
pub mod parser;
pub mod validation;

use crate::errors::Result;
use std::time::Duration;
use url::Url;

/// How the final report is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable summary
    Text,
    /// Single JSON document on stdout
    Json,
}

/// Target configuration
#[derive(Debug, Clone)]
pub struct TargetConfig {
    pub url: String,
}

/// Load shape: how many requests, spread over how many workers
#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub requests: u64,
    pub concurrency: u32,
    pub timeout: Duration,
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub verbose: bool,
    pub format: ReportFormat,
}

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    pub target: TargetConfig,
    pub load: LoadConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Parse and validate configuration from an explicit argument list
    pub fn from_arg_list<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let raw_config = parser::RawConfig::parse_from_list(args)?;
        Self::from_raw(raw_config)
    }

    /// Convert and validate already-parsed command line arguments
    pub fn from_raw(raw_config: parser::RawConfig) -> Result<Self> {
        let config = raw_config.try_into()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Get the target as a parsed URL
    pub fn target_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.target.url)?)
    }

    /// True when some workers are guaranteed to find the budget empty
    pub fn has_idle_workers(&self) -> bool {
        self.load.requests < u64::from(self.load.concurrency)
    }

    /// Capacity of the channel between workers and the aggregator
    pub fn result_channel_capacity(&self) -> usize {
        (self.load.concurrency as usize).max(crate::constants::MIN_RESULT_CHANNEL_CAPACITY)
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("🏐 Volley Load Test Configuration:");
        println!("   Target:           {}", self.target.url);
        println!("   Requests:         {}", self.load.requests);
        println!("   Concurrency:      {}", self.load.concurrency);
        println!("   Timeout:          {}s", self.load.timeout.as_secs());
        println!();
    }
}
