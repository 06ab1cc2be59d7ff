//! Volley: concurrent HTTP load generation with an exact request budget
//!
//! A run issues exactly `requests` GET requests against one target using
//! `concurrency` parallel workers, then folds every outcome into a report.

pub mod client;
pub mod common;
pub mod config;
pub mod constants;
pub mod errors;
pub mod metrics;

pub use client::{Coordinator, HttpTransport, Transport, TransportFailure};
pub use config::Config;
pub use errors::{Result, VolleyError};
pub use metrics::{Report, RunSummary, StatusOutcome};
