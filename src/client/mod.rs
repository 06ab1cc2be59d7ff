//! Request dispatch for load testing
//!
//! This module holds the concurrent side of a run:
//! - The transport abstraction workers issue requests through
//! - The reqwest-backed HTTP transport
//! - The shared request budget workers claim units from
//! - Workers and the dispatcher that spawns them
//! - The coordinator that wires dispatch to aggregation

pub mod budget;
pub mod dispatcher;
pub mod http;
pub mod manager;
pub mod worker;

// Re-export public types for easier access
pub use budget::RequestBudget;
pub use dispatcher::Dispatcher;
pub use http::HttpTransport;
pub use manager::{CancellationHandle, Coordinator};
pub use worker::{Worker, WorkerStats};

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Broad classification of a request that never received a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Connect,
    Other,
}

/// A request attempt that failed before any status was received
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind:?} failure: {message}")]
pub struct TransportFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportFailure {
    pub fn new<S: Into<String>>(kind: FailureKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportFailure {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_connect() {
            FailureKind::Connect
        } else {
            FailureKind::Other
        };
        Self::new(kind, err.to_string())
    }
}

/// The one capability workers need: issue a GET and report the status code
#[async_trait]
pub trait Transport: Send + Sync {
    async fn issue(&self, url: &Url) -> std::result::Result<u16, TransportFailure>;
}
