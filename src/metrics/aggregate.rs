//! Single-consumer aggregation of request results into a report

use crate::constants::PROGRESS_LOG_INTERVAL;
use crate::metrics::result::{RequestResult, StatusOutcome};

use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Histogram of outcomes plus timing totals for one run
///
/// Only the aggregator mutates a report. Once handed out it is read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    histogram: BTreeMap<StatusOutcome, u64>,
    total_elapsed: Duration,
    min_elapsed: Option<Duration>,
    max_elapsed: Option<Duration>,
}

impl Report {
    /// Fold one result into the report
    pub(crate) fn record(&mut self, result: &RequestResult) {
        *self.histogram.entry(result.outcome()).or_insert(0) += 1;

        let elapsed = result.elapsed();
        self.total_elapsed += elapsed;

        self.min_elapsed = Some(match self.min_elapsed {
            Some(min) => min.min(elapsed),
            None => elapsed,
        });

        self.max_elapsed = Some(match self.max_elapsed {
            Some(max) => max.max(elapsed),
            None => elapsed,
        });
    }

    pub fn histogram(&self) -> &BTreeMap<StatusOutcome, u64> {
        &self.histogram
    }

    /// Number of results folded in, across every bucket
    pub fn total_results(&self) -> u64 {
        self.histogram.values().sum()
    }

    pub fn count(&self, outcome: StatusOutcome) -> u64 {
        self.histogram.get(&outcome).copied().unwrap_or(0)
    }

    pub fn status_count(&self, code: u16) -> u64 {
        self.count(StatusOutcome::Status(code))
    }

    /// Attempts that never received a response
    pub fn errors(&self) -> u64 {
        self.count(StatusOutcome::TransportError)
    }

    /// Responses in the 2xx range
    pub fn successes(&self) -> u64 {
        self.histogram
            .iter()
            .filter(|(outcome, _)| matches!(outcome.code(), Some(200..=299)))
            .map(|(_, count)| count)
            .sum()
    }

    /// Sum of every attempt's elapsed time
    pub fn total_elapsed(&self) -> Duration {
        self.total_elapsed
    }

    pub fn min_elapsed(&self) -> Option<Duration> {
        self.min_elapsed
    }

    pub fn max_elapsed(&self) -> Option<Duration> {
        self.max_elapsed
    }

    pub fn mean_elapsed(&self) -> Option<Duration> {
        let total = self.total_results();
        if total == 0 {
            return None;
        }
        let nanos = self.total_elapsed.as_nanos() / u128::from(total);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }
}

/// What the aggregator hands back once it stops
#[derive(Debug, Clone)]
pub struct AggregateOutcome {
    pub report: Report,
    /// True when every producer went away before the expected count arrived
    pub interrupted: bool,
}

/// Consumes results one at a time until the expected number has arrived
pub struct Aggregator {
    results_rx: mpsc::Receiver<RequestResult>,
    expected: u64,
}

impl Aggregator {
    pub fn new(results_rx: mpsc::Receiver<RequestResult>, expected: u64) -> Self {
        Self {
            results_rx,
            expected,
        }
    }

    /// Run the aggregator on its own task and return its completion signal
    pub fn spawn(self) -> oneshot::Receiver<AggregateOutcome> {
        let (done_tx, done_rx) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = self.run().await;
            if done_tx.send(outcome).is_err() {
                warn!("Coordinator dropped before the report was delivered");
            }
        });
        done_rx
    }

    /// Fold results until `expected` have been consumed
    ///
    /// The count is known up front, so no close signal is needed. If every
    /// sender is dropped first (a cancelled run) the partial report is
    /// returned and flagged as interrupted.
    pub async fn run(mut self) -> AggregateOutcome {
        let mut report = Report::default();
        let mut remaining = self.expected;

        debug!("Aggregator waiting for {} results", self.expected);

        while remaining > 0 {
            match self.results_rx.recv().await {
                Some(result) => {
                    report.record(&result);
                    remaining -= 1;

                    let received = self.expected - remaining;
                    if received % PROGRESS_LOG_INTERVAL == 0 {
                        info!("Collected {}/{} results", received, self.expected);
                    }
                }
                None => {
                    warn!(
                        "All workers stopped with {} of {} results outstanding",
                        remaining, self.expected
                    );
                    break;
                }
            }
        }

        // Nothing may be folded in after this point
        self.results_rx.close();

        debug!("Aggregator finished with {} results", report.total_results());

        AggregateOutcome {
            report,
            interrupted: remaining > 0,
        }
    }
}
