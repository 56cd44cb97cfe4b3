// Account worker
// One per credentialed account: pop a term, search, rotate it back, cool down

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::dispatcher::{DispatchOutcome, SearchDispatcher};
use super::term_queue::TermQueue;
use super::types::WorkerState;
use crate::monitoring::{Metrics, WorkerProbe};
use crate::search::SearchClient;

/// Result of a single `Searching` pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The queue was empty; nothing was searched or rotated.
    Idle,
    /// A term was dispatched and rotated back to the queue.
    Completed(DispatchOutcome),
}

impl CycleOutcome {
    fn stops_worker(&self) -> bool {
        matches!(
            self,
            CycleOutcome::Completed(DispatchOutcome::CredentialsRejected { .. })
        )
    }
}

/// Why a worker's run loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    Cancelled,
    CredentialsRejected,
}

pub struct AccountWorker {
    index: usize,
    client: Arc<dyn SearchClient>,
    queue: Arc<TermQueue>,
    dispatcher: Arc<SearchDispatcher>,
    metrics: Arc<Metrics>,
    probe: Arc<WorkerProbe>,
    stagger: Duration,
    delay: Duration,
    state: WorkerState,
}

impl AccountWorker {
    pub fn new(
        index: usize,
        client: Arc<dyn SearchClient>,
        queue: Arc<TermQueue>,
        dispatcher: Arc<SearchDispatcher>,
        metrics: Arc<Metrics>,
        stagger: Duration,
        delay: Duration,
    ) -> Self {
        let probe = Arc::new(WorkerProbe::new(index, client.account()));
        Self {
            index,
            client,
            queue,
            dispatcher,
            metrics,
            probe,
            stagger,
            delay,
            state: WorkerState::Idle,
        }
    }

    pub fn probe(&self) -> Arc<WorkerProbe> {
        self.probe.clone()
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    fn transition(&mut self, state: WorkerState) {
        debug!(
            "Worker {} ({}) {:?} -> {:?}",
            self.index,
            self.client.account(),
            self.state,
            state
        );
        self.state = state;
        self.probe.set_state(state);
    }

    /// Runs until cancelled or until the account's credentials are rejected.
    ///
    /// Cancellation is only observed while idle or cooling, so a search that
    /// has started always finishes and rotates its term.
    pub async fn run(mut self, cancellation_token: CancellationToken) -> WorkerExit {
        info!(
            "Worker {} ({}) starting in {:?}, then every {:?}",
            self.index,
            self.client.account(),
            self.stagger,
            self.delay
        );

        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Worker {} cancelled before first search", self.index);
                self.transition(WorkerState::Stopped);
                return WorkerExit::Cancelled;
            }
            _ = tokio::time::sleep(self.stagger) => {}
        }

        loop {
            let outcome = self.cycle().await;

            if outcome.stops_worker() {
                error!(
                    "Worker {} ({}) stopping: credentials rejected",
                    self.index,
                    self.client.account()
                );
                self.metrics.record_worker_stopped();
                self.transition(WorkerState::Stopped);
                return WorkerExit::CredentialsRejected;
            }

            self.transition(WorkerState::Cooling);
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Worker {} ({}) stopping", self.index, self.client.account());
                    self.transition(WorkerState::Stopped);
                    return WorkerExit::Cancelled;
                }
                _ = tokio::time::sleep(self.delay) => {
                    self.transition(WorkerState::Idle);
                }
            }
        }
    }

    /// One `Searching` pass: pop, dispatch, rotate.
    pub async fn cycle(&mut self) -> CycleOutcome {
        self.transition(WorkerState::Searching);

        let Some(descriptor) = self.queue.pop().await else {
            debug!("Worker {} found the queue empty", self.index);
            self.metrics.record_empty_poll();
            return CycleOutcome::Idle;
        };

        let outcome = self
            .dispatcher
            .dispatch(self.client.as_ref(), &descriptor)
            .await;

        let term = descriptor.term().to_string();
        match self.queue.rotate(descriptor).await {
            Ok(cursor) => debug!("Rotated '{}', cursor now {}", term, cursor),
            Err(e) => {
                self.metrics.record_cursor_advance_failure();
                warn!("Rotated '{}' but failed to persist cursor: {}", term, e);
            }
        }
        self.metrics.record_term_rotated();
        self.metrics.record_queue_depth(self.queue.len().await);
        self.probe.record_cycle(outcome.is_failure());

        CycleOutcome::Completed(outcome)
    }
}
