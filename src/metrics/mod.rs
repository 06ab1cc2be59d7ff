//! Result collection and reporting for the Volley load generator
//!
//! This module covers the data side of a run:
//! - Per-attempt results as emitted by workers
//! - The single-consumer aggregator that folds them into a report
//! - Presenters that render the finished report

pub mod aggregate;
pub mod reporting;
pub mod result;

// Re-export public types for easier access
pub use aggregate::{AggregateOutcome, Aggregator, Report};
pub use reporting::{JsonPresenter, Presenter, RunSummary, TextPresenter, presenter_for};
pub use result::{RequestResult, StatusOutcome};
