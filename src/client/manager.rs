//! Coordinator that runs one load test from budget to finished report

use crate::client::{Dispatcher, RequestBudget, Transport, WorkerStats};
use crate::config::{Config, validation};
use crate::errors::{ErrorContext, Result, VolleyError};
use crate::metrics::{Aggregator, RunSummary};

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use url::Url;
use tracing::{error, info, warn};

/// Stops a running load test
///
/// No further units are claimed, and attempts already in flight are
/// abandoned and counted as transport errors.
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    budget: Arc<RequestBudget>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl CancellationHandle {
    /// Returns how many requests will not be issued
    pub fn cancel(&self) -> u64 {
        let abandoned = self.budget.close();
        self.shutdown_tx.send_replace(true);
        warn!(
            "Load test cancelled, {} of {} requests will not be issued",
            abandoned,
            self.budget.total()
        );
        abandoned
    }

    pub fn is_cancelled(&self) -> bool {
        self.budget.is_closed()
    }
}

/// Owns the request budget and wires workers to the aggregator
pub struct Coordinator {
    config: Config,
    target: Arc<Url>,
    transport: Arc<dyn Transport>,
    budget: Arc<RequestBudget>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    handle_signals: bool,
}

impl Coordinator {
    /// Create a coordinator, refusing configurations that break run invariants
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        validation::validate(&config)?;
        let target = Arc::new(config.target_url()?);
        let budget = Arc::new(RequestBudget::new(config.load.requests));
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            target,
            transport,
            budget,
            shutdown_tx: Arc::new(shutdown_tx),
            handle_signals: false,
        })
    }

    /// Cancel the run on Ctrl+C
    pub fn with_signal_handling(mut self) -> Self {
        self.handle_signals = true;
        self
    }

    pub fn cancellation_handle(&self) -> CancellationHandle {
        CancellationHandle {
            budget: Arc::clone(&self.budget),
            shutdown_tx: Arc::clone(&self.shutdown_tx),
        }
    }

    /// Run the load test to completion and return the finished summary
    pub async fn run(self) -> Result<RunSummary> {
        let target = Arc::clone(&self.target);
        let requests = self.config.load.requests;
        let concurrency = self.config.load.concurrency;

        if self.config.has_idle_workers() {
            warn!(
                "Concurrency {} exceeds the {} requested; {} workers will have nothing to do",
                concurrency,
                requests,
                u64::from(concurrency) - requests
            );
        }

        info!(
            "Starting load test: {} requests with {} workers against {}",
            requests, concurrency, target
        );

        if self.handle_signals {
            self.setup_signal_handler();
        }

        let started = Instant::now();
        let (results_tx, results_rx) = mpsc::channel(self.config.result_channel_capacity());

        let completion = Aggregator::new(results_rx, requests).spawn();
        let worker_handles = Dispatcher::new(
            Arc::clone(&self.budget),
            Arc::clone(&self.transport),
            Arc::clone(&target),
            concurrency,
        )
        .spawn(results_tx, self.shutdown_tx.subscribe());

        // Block on the aggregator only; it finishes once every result is in
        let outcome = completion
            .await
            .with_execution_context("Aggregator stopped before delivering a report")?;
        let wall_time = started.elapsed();

        let totals = Self::reap_workers(worker_handles).await?;
        info!(
            "Load test finished in {:.2}s: {} requests, {} transport errors",
            wall_time.as_secs_f64(),
            totals.attempts,
            totals.errors
        );

        if outcome.interrupted {
            warn!(
                "Report covers {} of {} requests",
                outcome.report.total_results(),
                requests
            );
        }

        Ok(RunSummary {
            target: target.to_string(),
            requested: requests,
            concurrency,
            report: outcome.report,
            wall_time,
            interrupted: outcome.interrupted,
        })
    }

    /// Set up Ctrl+C handling: the first press cancels, a second one exits
    fn setup_signal_handler(&self) {
        let handle = self.cancellation_handle();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for ctrl+c: {}", e);
                return;
            }
            warn!("Received Ctrl+C, stopping workers (press again to exit immediately)");
            handle.cancel();

            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Received second Ctrl+C, exiting");
                std::process::exit(130);
            }
        });
    }

    /// Collect worker statistics; every worker has already stopped sending
    async fn reap_workers(
        handles: Vec<tokio::task::JoinHandle<WorkerStats>>,
    ) -> Result<WorkerStats> {
        let mut totals = WorkerStats::default();
        for joined in futures_util::future::join_all(handles).await {
            let stats =
                joined.map_err(|e| VolleyError::execution(format!("Worker failed: {}", e)))?;
            totals.attempts += stats.attempts;
            totals.errors += stats.errors;
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{FailureKind, TransportFailure};

    use async_trait::async_trait;
    use std::sync::OnceLock;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;
    use tokio::time::timeout;
    use url::Url;

    const RUN_DEADLINE: Duration = Duration::from_secs(10);

    /// Answers from a fixed script indexed by call order; errors past its end
    struct ScriptedTransport {
        script: Vec<Option<u16>>,
        calls: AtomicU64,
        delay: Duration,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Option<u16>>) -> Self {
            Self {
                script,
                calls: AtomicU64::new(0),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn issue(&self, _url: &Url) -> std::result::Result<u16, TransportFailure> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.script.get(call).copied().flatten() {
                Some(status) => Ok(status),
                None => Err(TransportFailure::new(FailureKind::Timeout, "scripted failure")),
            }
        }
    }

    /// Cancels the run from inside the transport after a number of calls
    struct CancellingTransport {
        cancel_after: u64,
        calls: AtomicU64,
        handle: OnceLock<CancellationHandle>,
    }

    #[async_trait]
    impl Transport for CancellingTransport {
        async fn issue(&self, _url: &Url) -> std::result::Result<u16, TransportFailure> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.cancel_after
                && let Some(handle) = self.handle.get()
            {
                handle.cancel();
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
            Ok(200)
        }
    }

    fn config(requests: u64, concurrency: u32) -> Config {
        Config::for_target("http://localhost:8080/").with_load(requests, concurrency)
    }

    async fn run(transport: Arc<dyn Transport>, requests: u64, concurrency: u32) -> RunSummary {
        let coordinator = Coordinator::new(config(requests, concurrency), transport).unwrap();
        timeout(RUN_DEADLINE, coordinator.run())
            .await
            .expect("load test did not terminate")
            .unwrap()
    }

    fn status_script(codes: &[(u16, usize)]) -> Vec<Option<u16>> {
        codes
            .iter()
            .flat_map(|(code, n)| std::iter::repeat_n(Some(*code), *n))
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_mixed_outcomes_scenario() {
        let transport = Arc::new(ScriptedTransport::new(status_script(&[(200, 7), (500, 3)])));
        let summary = run(transport.clone(), 10, 4).await;

        let report = &summary.report;
        assert_eq!(report.status_count(200), 7);
        assert_eq!(report.status_count(500), 3);
        assert_eq!(report.histogram().len(), 2);
        assert_eq!(report.total_results(), 10);
        assert!(report.total_elapsed() >= Duration::ZERO);
        assert!(!summary.interrupted);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_conservation_across_concurrency_levels() {
        for (requests, concurrency) in [(1, 1), (10, 3), (37, 8), (64, 64), (100, 7)] {
            let transport = Arc::new(
                ScriptedTransport::new(status_script(&[(200, 1_000)]))
                    .with_delay(Duration::from_micros(200)),
            );
            let summary = run(transport.clone(), requests, concurrency).await;
            assert_eq!(
                summary.report.total_results(),
                requests,
                "requests={} concurrency={}",
                requests,
                concurrency
            );
            assert_eq!(transport.calls.load(Ordering::SeqCst), requests);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_double_claim_over_repeated_runs() {
        for _ in 0..25 {
            let transport = Arc::new(ScriptedTransport::new(status_script(&[(200, 500)])));
            let summary = run(transport.clone(), 50, 16).await;
            assert_eq!(transport.calls.load(Ordering::SeqCst), 50);
            assert_eq!(summary.report.status_count(200), 50);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_more_workers_than_requests_terminates() {
        let transport = Arc::new(ScriptedTransport::new(status_script(&[(200, 3)])));
        let summary = run(transport, 3, 12).await;
        assert_eq!(summary.report.status_count(200), 3);
        assert_eq!(summary.concurrency, 12);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_request_failing_fills_error_bucket_only() {
        let transport = Arc::new(ScriptedTransport::new(Vec::new()));
        let summary = run(transport, 25, 4).await;

        let report = &summary.report;
        assert_eq!(report.errors(), 25);
        assert_eq!(report.histogram().len(), 1);
        assert_eq!(report.status_count(200), 0);
        assert!(!summary.interrupted);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_worker_matches_parallel_histogram() {
        let script = status_script(&[(200, 12), (404, 5), (503, 3)]);

        let sequential = run(Arc::new(ScriptedTransport::new(script.clone())), 20, 1).await;
        let parallel = run(Arc::new(ScriptedTransport::new(script)), 20, 6).await;

        assert_eq!(sequential.report.histogram(), parallel.report.histogram());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cancellation_stops_at_next_claim() {
        let transport = Arc::new(CancellingTransport {
            cancel_after: 5,
            calls: AtomicU64::new(0),
            handle: OnceLock::new(),
        });
        let coordinator = Coordinator::new(config(1_000, 2), transport.clone()).unwrap();
        let handle = coordinator.cancellation_handle();
        transport.handle.set(handle.clone()).unwrap();

        let summary = timeout(RUN_DEADLINE, coordinator.run())
            .await
            .expect("cancelled load test did not terminate")
            .unwrap();

        let issued = transport.calls.load(Ordering::SeqCst);
        assert!(handle.is_cancelled());
        assert!(summary.interrupted);
        assert!(issued < 1_000);
        assert_eq!(summary.report.total_results(), issued);
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_dispatch() {
        let transport = Arc::new(ScriptedTransport::new(Vec::new()));

        for bad in [config(0, 1), config(1, 0), Config::for_target("not a url")] {
            let err = Coordinator::new(bad, transport.clone())
                .err()
                .expect("configuration should be rejected");
            assert!(err.is_config());
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    /// Accepts the request and never answers
    struct HangingTransport {
        calls: AtomicU64,
    }

    #[async_trait]
    impl Transport for HangingTransport {
        async fn issue(&self, _url: &Url) -> std::result::Result<u16, TransportFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cancellation_does_not_wait_for_hung_requests() {
        let transport = Arc::new(HangingTransport {
            calls: AtomicU64::new(0),
        });
        let coordinator = Coordinator::new(config(100, 2), transport.clone()).unwrap();
        let handle = coordinator.cancellation_handle();

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.cancel()
        });

        let summary = timeout(Duration::from_secs(5), coordinator.run())
            .await
            .expect("cancelled load test stayed blocked on hung requests")
            .unwrap();

        assert_eq!(canceller.await.unwrap(), 98);
        assert!(summary.interrupted);
        assert_eq!(summary.report.total_results(), 2);
        assert_eq!(summary.report.errors(), 2);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }
}
