//! HTTP transport backed by reqwest

use crate::client::{Transport, TransportFailure};
use crate::errors::{ErrorContext, Result};

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Issues GET requests through one shared reqwest client
///
/// Every worker holds the same transport behind an `Arc`, so the connection
/// pool is shared and reused across attempts.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("volley/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_transport_context("Failed to create HTTP client")?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn issue(&self, url: &Url) -> std::result::Result<u16, TransportFailure> {
        let response = self.http_client.get(url.clone()).send().await?;
        let status = response.status().as_u16();

        // Drain the body so the connection can go back to the pool. The status
        // already arrived, so a body error does not change the outcome.
        if let Err(e) = response.bytes().await {
            debug!("Failed to read response body from {}: {}", url, e);
        }

        Ok(status)
    }
}
