//! Worker pool that spends the request budget

use crate::client::{RequestBudget, Transport, Worker, WorkerStats};
use crate::common::WorkerId;
use crate::metrics::RequestResult;

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;
use url::Url;

/// Spawns `concurrency` workers sharing one budget and one transport
pub struct Dispatcher {
    budget: Arc<RequestBudget>,
    transport: Arc<dyn Transport>,
    target: Arc<Url>,
    concurrency: u32,
}

impl Dispatcher {
    pub fn new(
        budget: Arc<RequestBudget>,
        transport: Arc<dyn Transport>,
        target: Arc<Url>,
        concurrency: u32,
    ) -> Self {
        Self {
            budget,
            transport,
            target,
            concurrency,
        }
    }

    /// Spawn every worker on the runtime and return their handles
    ///
    /// Takes the sender by value: once this returns, only workers hold
    /// senders, so the channel closes exactly when the last worker exits.
    pub fn spawn(
        self,
        results_tx: mpsc::Sender<RequestResult>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Vec<JoinHandle<WorkerStats>> {
        let handles = (0..self.concurrency)
            .map(|raw_id| {
                let worker = Worker::new(
                    WorkerId::from(raw_id),
                    Arc::clone(&self.budget),
                    Arc::clone(&self.transport),
                    Arc::clone(&self.target),
                    results_tx.clone(),
                    shutdown_rx.clone(),
                );
                tokio::spawn(worker.run())
            })
            .collect();

        debug!(
            "Spawned {} workers, {} of {} requests remaining",
            self.concurrency,
            self.budget.remaining(),
            self.budget.total()
        );
        handles
    }
}
