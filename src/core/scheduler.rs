use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::dispatcher::SearchDispatcher;
use super::rate_budget::RateBudget;
use super::term_queue::TermQueue;
use super::types::{SchedulerHealth, SchedulerMetrics, WorkerState};
use super::worker::{AccountWorker, WorkerExit};
use crate::config::Config;
use crate::error::{PollerError, Result};
use crate::monitoring::{Metrics, WorkerProbe};
use crate::search::{SearchClient, SearchOptions, TwitterSearchClient};
use crate::sink::{ElasticsearchStore, ResultSink, ResultStore, StoreIndices};
use crate::source::redis_source::RedisKeys;
use crate::source::{RedisTermSource, TermSource};

/// Owns the term queue and the fleet of account workers.
pub struct SearchScheduler {
    config: Config,
    queue: Arc<TermQueue>,
    dispatcher: Arc<SearchDispatcher>,
    sink: Arc<ResultSink>,
    clients: Vec<Arc<dyn SearchClient>>,
    budget: RateBudget,
    pub metrics: Arc<Metrics>,
    probes: RwLock<Vec<Arc<WorkerProbe>>>,
    is_running: AtomicBool,
    cancellation_token: CancellationToken,
}

impl SearchScheduler {
    /// Wires the scheduler to explicit collaborators after validating `config`.
    pub fn new(
        config: Config,
        source: Arc<dyn TermSource>,
        clients: Vec<Arc<dyn SearchClient>>,
        store: Arc<dyn ResultStore>,
    ) -> Result<Self> {
        config.validate()?;
        if clients.is_empty() {
            return Err(PollerError::Config(
                "At least one search client is required".to_string(),
            ));
        }

        let metrics = Arc::new(Metrics::new());
        let sink = Arc::new(ResultSink::new(store, metrics.clone()));
        let queue = Arc::new(TermQueue::new(source.clone(), config.default_radius.clone()));
        let dispatcher = Arc::new(SearchDispatcher::new(
            SearchOptions::from(&config),
            sink.clone(),
            source,
            metrics.clone(),
        ));
        let budget = RateBudget::from_millis(config.rate_window_ms, config.rate_limit, clients.len());

        Ok(Self {
            config,
            queue,
            dispatcher,
            sink,
            clients,
            budget,
            metrics,
            probes: RwLock::new(Vec::new()),
            is_running: AtomicBool::new(false),
            cancellation_token: CancellationToken::new(),
        })
    }

    /// Connects the production collaborators: Redis term source, one HTTP
    /// search client per account and the bulk result store.
    pub async fn from_config(config: Config) -> Result<Self> {
        info!("Initializing search scheduler");

        let source: Arc<dyn TermSource> =
            Arc::new(RedisTermSource::new(&config.redis_url, RedisKeys::from(&config)).await?);

        let timeout = Duration::from_millis(config.search_timeout_ms);
        let mut clients: Vec<Arc<dyn SearchClient>> = Vec::with_capacity(config.accounts.len());
        for account in &config.accounts {
            let client =
                TwitterSearchClient::new(config.search_api_url.clone(), account.clone(), timeout)?;
            clients.push(Arc::new(client));
        }

        let store: Arc<dyn ResultStore> = Arc::new(ElasticsearchStore::new(
            &config.store_url,
            StoreIndices::from(&config),
            timeout,
        )?);

        Self::new(config, source, clients, store)
    }

    pub fn budget(&self) -> RateBudget {
        self.budget
    }

    pub fn queue(&self) -> Arc<TermQueue> {
        self.queue.clone()
    }

    /// Loads the queue, runs the fleet until it is stopped, then flushes
    /// pending store writes. Fails if the term source is unavailable or if
    /// every account ends up with rejected credentials.
    pub async fn start(&self) -> Result<()> {
        if self
            .is_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PollerError::Processing(
                "Scheduler is already running".to_string(),
            ));
        }

        let result = self.run().await;
        self.is_running.store(false, Ordering::SeqCst);
        result
    }

    async fn run(&self) -> Result<()> {
        let queued = self.queue.load().await?;
        self.metrics.record_queue_depth(queued);

        info!(
            "Starting {} account workers: {:?} between searches per account, {:?} stagger",
            self.clients.len(),
            self.budget.per_account_delay(),
            self.budget.request_lapse()
        );

        let mut workers = self.spawn_workers().await;
        self.metrics.record_workers_active(workers.len());
        let monitoring_task = self.spawn_monitoring_task();

        let mut credentials_stopped = 0usize;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(WorkerExit::CredentialsRejected) => credentials_stopped += 1,
                Ok(WorkerExit::Cancelled) => {}
                Err(e) => error!("Worker task failed: {e}"),
            }
            self.metrics.record_workers_active(workers.len());
        }

        // Every worker has exited; make sure the monitor goes with them
        self.cancellation_token.cancel();
        if let Err(e) = monitoring_task.await {
            warn!("Monitoring task failed: {e}");
        }

        let pending = self.sink.pending_writes();
        if pending > 0 {
            info!("Waiting for {} pending store writes", pending);
        }
        let flush_timeout = Duration::from_secs(self.config.shutdown_timeout_secs);
        if tokio::time::timeout(flush_timeout, self.sink.flush())
            .await
            .is_err()
        {
            warn!("Pending store writes did not finish within {:?}", flush_timeout);
        }

        info!(
            "Scheduler stopped after serving {} terms",
            self.queue.served()
        );

        if credentials_stopped == self.clients.len() {
            return Err(PollerError::Processing(
                "All accounts stopped: credentials rejected".to_string(),
            ));
        }
        Ok(())
    }

    async fn spawn_workers(&self) -> JoinSet<WorkerExit> {
        let mut workers = JoinSet::new();
        let mut probes = self.probes.write().await;
        probes.clear();

        for (index, client) in self.clients.iter().enumerate() {
            let worker = AccountWorker::new(
                index,
                client.clone(),
                self.queue.clone(),
                self.dispatcher.clone(),
                self.metrics.clone(),
                self.budget.stagger_for(index),
                self.budget.per_account_delay(),
            );
            probes.push(worker.probe());
            workers.spawn(worker.run(self.cancellation_token.clone()));
        }

        workers
    }

    fn spawn_monitoring_task(&self) -> tokio::task::JoinHandle<()> {
        let metrics = self.metrics.clone();
        let queue = self.queue.clone();
        let cancellation_token = self.cancellation_token.clone();
        let period = Duration::from_secs(self.config.metrics_log_interval_secs);

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let snapshot = metrics.get_snapshot().await;
                        let depth = queue.len().await;
                        metrics.record_queue_depth(depth);
                        info!(
                            "Metrics - searches: {}, not-ok: {}, results: {}, rotated: {}, queue: {}, store failures: {}",
                            snapshot.total_searches,
                            snapshot.total_search_failures,
                            snapshot.total_results,
                            snapshot.total_terms_rotated,
                            depth,
                            snapshot.total_store_failures
                        );
                    }
                    _ = cancellation_token.cancelled() => {
                        break;
                    }
                }
            }
        })
    }

    /// Stops new search cycles; in-flight searches finish and rotate.
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping search scheduler");
        self.cancellation_token.cancel();
        Ok(())
    }

    pub async fn health(&self) -> SchedulerHealth {
        let snapshot = self.metrics.get_snapshot().await;
        let workers: Vec<_> = self
            .probes
            .read()
            .await
            .iter()
            .map(|probe| probe.status())
            .collect();
        let workers_stopped = workers
            .iter()
            .filter(|w| w.state == WorkerState::Stopped)
            .count();
        let workers_active = workers.len() - workers_stopped;

        SchedulerHealth {
            healthy: self.is_running.load(Ordering::SeqCst) && workers_active > 0,
            workers_active,
            workers_stopped,
            queue_depth: self.queue.len().await,
            terms_served: self.queue.served(),
            last_check: chrono::Utc::now(),
            metrics: SchedulerMetrics {
                total_searches: snapshot.total_searches,
                total_search_failures: snapshot.total_search_failures,
                total_results: snapshot.total_results,
                total_terms_rotated: snapshot.total_terms_rotated,
                total_store_failures: snapshot.total_store_failures,
            },
            workers,
        }
    }
}
