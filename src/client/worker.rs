//! Worker loop: claim a unit, issue one request, hand the result off

use crate::client::{RequestBudget, Transport};
use crate::common::WorkerId;
use crate::constants::DEBUG_LOG_INTERVAL;
use crate::metrics::{RequestResult, StatusOutcome};

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};
use url::Url;

/// Per-worker counters, returned when the worker stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub attempts: u64,
    pub errors: u64,
}

/// One concurrent unit of execution
///
/// A worker is never told how many requests are its own; it keeps claiming
/// from the shared budget until a claim fails. An attempt still in flight
/// when the run is cancelled is abandoned and recorded as a transport error.
pub struct Worker {
    id: WorkerId,
    budget: Arc<RequestBudget>,
    transport: Arc<dyn Transport>,
    target: Arc<Url>,
    results_tx: mpsc::Sender<RequestResult>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Worker {
    pub fn new(
        id: WorkerId,
        budget: Arc<RequestBudget>,
        transport: Arc<dyn Transport>,
        target: Arc<Url>,
        results_tx: mpsc::Sender<RequestResult>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id,
            budget,
            transport,
            target,
            results_tx,
            shutdown_rx,
        }
    }

    /// Run until the budget is exhausted
    pub async fn run(self) -> WorkerStats {
        let mut stats = WorkerStats::default();
        let mut shutdown_rx = self.shutdown_rx.clone();
        debug!("Worker {} started", self.id);

        while let Some(ticket) = self.budget.try_claim() {
            let result = self.attempt(ticket, &mut shutdown_rx).await;

            stats.attempts += 1;
            if result.outcome().is_transport_error() {
                stats.errors += 1;
            }

            // Waits for channel capacity rather than dropping the result
            if self.results_tx.send(result).await.is_err() {
                warn!(
                    "Worker {} could not deliver result for request #{}, aggregator is gone",
                    self.id, ticket
                );
                break;
            }

            if stats.attempts % DEBUG_LOG_INTERVAL == 0 {
                debug!("Worker {} issued {} requests", self.id, stats.attempts);
            }
        }

        debug!(
            "Worker {} finished: {} requests, {} transport errors",
            self.id, stats.attempts, stats.errors
        );
        stats
    }

    /// Issue one request and time it, giving up if the run is cancelled
    async fn attempt(&self, ticket: u64, shutdown_rx: &mut watch::Receiver<bool>) -> RequestResult {
        let start = Instant::now();
        let outcome = tokio::select! {
            biased;

            _ = cancelled(shutdown_rx) => {
                debug!("Worker {} abandoned request #{} on shutdown", self.id, ticket);
                StatusOutcome::TransportError
            }

            issued = self.transport.issue(&self.target) => match issued {
                Ok(status) => StatusOutcome::Status(status),
                Err(failure) => {
                    debug!("Worker {} request #{} failed: {}", self.id, ticket, failure);
                    StatusOutcome::TransportError
                }
            },
        };
        RequestResult::new(outcome, start.elapsed())
    }
}

/// Resolves once shutdown is requested; never resolves if the sender is gone
async fn cancelled(shutdown_rx: &mut watch::Receiver<bool>) {
    let sender_gone = shutdown_rx.wait_for(|cancelled| *cancelled).await.is_err();
    if sender_gone {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{FailureKind, TransportFailure};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    /// Fails every third call, answers 200 otherwise
    struct FlakyTransport {
        calls: AtomicU64,
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn issue(&self, _url: &Url) -> Result<u16, TransportFailure> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call % 3 == 2 {
                Err(TransportFailure::new(FailureKind::Connect, "refused"))
            } else {
                Ok(200)
            }
        }
    }

    /// Never answers
    struct HangingTransport;

    #[async_trait]
    impl Transport for HangingTransport {
        async fn issue(&self, _url: &Url) -> Result<u16, TransportFailure> {
            std::future::pending().await
        }
    }

    fn worker_with(
        budget: Arc<RequestBudget>,
        transport: Arc<dyn Transport>,
        tx: mpsc::Sender<RequestResult>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Worker {
        Worker::new(
            WorkerId::new(0),
            budget,
            transport,
            Arc::new(Url::parse("http://localhost:8080").unwrap()),
            tx,
            shutdown_rx,
        )
    }

    fn worker(budget: u64, tx: mpsc::Sender<RequestResult>) -> Worker {
        // A dropped sender must not read as a shutdown request
        let (_, shutdown_rx) = watch::channel(false);
        worker_with(
            Arc::new(RequestBudget::new(budget)),
            Arc::new(FlakyTransport {
                calls: AtomicU64::new(0),
            }),
            tx,
            shutdown_rx,
        )
    }

    #[tokio::test]
    async fn test_worker_drains_budget_and_keeps_going_after_errors() {
        let (tx, mut rx) = mpsc::channel(16);
        let stats = worker(6, tx).run().await;

        assert_eq!(
            stats,
            WorkerStats {
                attempts: 6,
                errors: 2
            }
        );

        let mut outcomes = Vec::new();
        while let Some(result) = rx.recv().await {
            outcomes.push(result.outcome());
        }
        assert_eq!(outcomes.len(), 6);
        assert_eq!(
            outcomes
                .iter()
                .filter(|outcome| outcome.is_transport_error())
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_worker_waits_on_full_channel() {
        let (tx, mut rx) = mpsc::channel(1);
        let handle = tokio::spawn(worker(4, tx).run());

        let mut received = 0;
        while let Some(_result) = rx.recv().await {
            received += 1;
        }
        assert_eq!(received, 4);
        assert_eq!(handle.await.unwrap().attempts, 4);
    }

    #[tokio::test]
    async fn test_worker_with_empty_budget_exits_immediately() {
        let (tx, mut rx) = mpsc::channel(1);
        let stats = worker(0, tx).run().await;
        assert_eq!(stats.attempts, 0);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_abandons_hung_request() {
        let budget = Arc::new(RequestBudget::new(50));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (tx, mut rx) = mpsc::channel(4);
        let handle = tokio::spawn(
            worker_with(Arc::clone(&budget), Arc::new(HangingTransport), tx, shutdown_rx).run(),
        );

        tokio::time::sleep(Duration::from_millis(20)).await;
        budget.close();
        shutdown_tx.send_replace(true);

        let stats = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker stayed blocked on a hung request")
            .unwrap();
        assert_eq!(stats, WorkerStats { attempts: 1, errors: 1 });

        let result = rx.recv().await.unwrap();
        assert!(result.outcome().is_transport_error());
        assert!(rx.recv().await.is_none());
    }
}
