use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Histogram, HistogramVec, Opts, Registry, TextEncoder,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::warn;

use crate::core::types::SearchKind;

lazy_static! {
    static ref REGISTRY: Registry = Registry::new();

    // Search metrics
    //
    // The search kind label is bounded to "keyword" and "geo".
    static ref SEARCHES_COUNTER: CounterVec = CounterVec::new(
        Opts::new(
            "search_poller_searches_total",
            "Total number of searches issued by kind"
        ),
        &["kind"]
    ).unwrap();
    static ref SEARCH_FAILURES_COUNTER: CounterVec = CounterVec::new(
        Opts::new(
            "search_poller_search_failures_total",
            "Total number of searches that failed by kind"
        ),
        &["kind"]
    ).unwrap();
    static ref RATE_LIMITED_COUNTER: Counter = Counter::new(
        "search_poller_rate_limited_total",
        "Total number of searches rejected by the API rate limit"
    ).unwrap();
    static ref RESULTS_COUNTER: Counter = Counter::new(
        "search_poller_results_total",
        "Total number of statuses returned by successful searches"
    ).unwrap();
    static ref SEARCH_DURATION_HISTOGRAM: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "search_poller_search_duration_seconds",
            "Time spent in a single search request in seconds"
        ).buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["kind"]
    ).unwrap();

    // Queue metrics
    static ref TERMS_ROTATED_COUNTER: Counter = Counter::new(
        "search_poller_terms_rotated_total",
        "Total number of terms served and pushed back to the queue"
    ).unwrap();
    static ref EMPTY_POLLS_COUNTER: Counter = Counter::new(
        "search_poller_empty_polls_total",
        "Total number of worker cycles that found the queue empty"
    ).unwrap();
    static ref CURSOR_ADVANCE_FAILURES_COUNTER: Counter = Counter::new(
        "search_poller_cursor_advance_failures_total",
        "Total number of failed attempts to persist the queue cursor"
    ).unwrap();
    static ref QUEUE_DEPTH_GAUGE: Gauge = Gauge::new(
        "search_poller_queue_depth",
        "Number of terms waiting in the queue"
    ).unwrap();

    // Store metrics
    static ref STORE_WRITES_COUNTER: Counter = Counter::new(
        "search_poller_store_writes_total",
        "Total number of successful bulk writes"
    ).unwrap();
    static ref STORE_RECORDS_COUNTER: Counter = Counter::new(
        "search_poller_store_records_total",
        "Total number of records written to the result store"
    ).unwrap();
    static ref STORE_FAILURES_COUNTER: Counter = Counter::new(
        "search_poller_store_failures_total",
        "Total number of bulk writes that failed"
    ).unwrap();
    static ref STORE_WRITE_SIZE_HISTOGRAM: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "search_poller_store_write_size",
            "Number of records per bulk write"
        ).buckets(vec![1.0, 10.0, 50.0, 100.0, 200.0, 300.0, 500.0])
    ).unwrap();

    // Worker metrics
    static ref WORKERS_ACTIVE_GAUGE: Gauge = Gauge::new(
        "search_poller_workers_active",
        "Number of account workers currently running"
    ).unwrap();
    static ref WORKERS_STOPPED_COUNTER: Counter = Counter::new(
        "search_poller_workers_stopped_total",
        "Total number of account workers stopped by rejected credentials"
    ).unwrap();
    static ref UPTIME_GAUGE: Gauge = Gauge::new(
        "search_poller_uptime_seconds",
        "Application uptime in seconds"
    ).unwrap();
}

#[derive(Debug, Clone)]
pub struct Metrics {
    // Core counters
    searches: Arc<AtomicU64>,
    search_failures: Arc<AtomicU64>,
    rate_limited: Arc<AtomicU64>,
    results: Arc<AtomicU64>,
    terms_rotated: Arc<AtomicU64>,
    empty_polls: Arc<AtomicU64>,
    cursor_advance_failures: Arc<AtomicU64>,
    store_writes: Arc<AtomicU64>,
    store_failures: Arc<AtomicU64>,

    // Timing
    start_time: DateTime<Utc>,
    last_search_time: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl Metrics {
    pub fn new() -> Self {
        // Registration failures are logged but not fatal, allowing the service to continue
        REGISTRY
            .register(Box::new(SEARCHES_COUNTER.clone()))
            .unwrap_or_else(|e| warn!("Failed to register SEARCHES_COUNTER: {}", e));
        REGISTRY
            .register(Box::new(SEARCH_FAILURES_COUNTER.clone()))
            .unwrap_or_else(|e| warn!("Failed to register SEARCH_FAILURES_COUNTER: {}", e));
        REGISTRY
            .register(Box::new(RATE_LIMITED_COUNTER.clone()))
            .unwrap_or_else(|e| warn!("Failed to register RATE_LIMITED_COUNTER: {}", e));
        REGISTRY
            .register(Box::new(RESULTS_COUNTER.clone()))
            .unwrap_or_else(|e| warn!("Failed to register RESULTS_COUNTER: {}", e));
        REGISTRY
            .register(Box::new(SEARCH_DURATION_HISTOGRAM.clone()))
            .unwrap_or_else(|e| warn!("Failed to register SEARCH_DURATION_HISTOGRAM: {}", e));

        REGISTRY
            .register(Box::new(TERMS_ROTATED_COUNTER.clone()))
            .unwrap_or_else(|e| warn!("Failed to register TERMS_ROTATED_COUNTER: {}", e));
        REGISTRY
            .register(Box::new(EMPTY_POLLS_COUNTER.clone()))
            .unwrap_or_else(|e| warn!("Failed to register EMPTY_POLLS_COUNTER: {}", e));
        REGISTRY
            .register(Box::new(CURSOR_ADVANCE_FAILURES_COUNTER.clone()))
            .unwrap_or_else(|e| {
                warn!("Failed to register CURSOR_ADVANCE_FAILURES_COUNTER: {}", e)
            });
        REGISTRY
            .register(Box::new(QUEUE_DEPTH_GAUGE.clone()))
            .unwrap_or_else(|e| warn!("Failed to register QUEUE_DEPTH_GAUGE: {}", e));

        REGISTRY
            .register(Box::new(STORE_WRITES_COUNTER.clone()))
            .unwrap_or_else(|e| warn!("Failed to register STORE_WRITES_COUNTER: {}", e));
        REGISTRY
            .register(Box::new(STORE_RECORDS_COUNTER.clone()))
            .unwrap_or_else(|e| warn!("Failed to register STORE_RECORDS_COUNTER: {}", e));
        REGISTRY
            .register(Box::new(STORE_FAILURES_COUNTER.clone()))
            .unwrap_or_else(|e| warn!("Failed to register STORE_FAILURES_COUNTER: {}", e));
        REGISTRY
            .register(Box::new(STORE_WRITE_SIZE_HISTOGRAM.clone()))
            .unwrap_or_else(|e| warn!("Failed to register STORE_WRITE_SIZE_HISTOGRAM: {}", e));

        REGISTRY
            .register(Box::new(WORKERS_ACTIVE_GAUGE.clone()))
            .unwrap_or_else(|e| warn!("Failed to register WORKERS_ACTIVE_GAUGE: {}", e));
        REGISTRY
            .register(Box::new(WORKERS_STOPPED_COUNTER.clone()))
            .unwrap_or_else(|e| warn!("Failed to register WORKERS_STOPPED_COUNTER: {}", e));
        REGISTRY
            .register(Box::new(UPTIME_GAUGE.clone()))
            .unwrap_or_else(|e| warn!("Failed to register UPTIME_GAUGE: {}", e));

        Self {
            searches: Arc::new(AtomicU64::new(0)),
            search_failures: Arc::new(AtomicU64::new(0)),
            rate_limited: Arc::new(AtomicU64::new(0)),
            results: Arc::new(AtomicU64::new(0)),
            terms_rotated: Arc::new(AtomicU64::new(0)),
            empty_polls: Arc::new(AtomicU64::new(0)),
            cursor_advance_failures: Arc::new(AtomicU64::new(0)),
            store_writes: Arc::new(AtomicU64::new(0)),
            store_failures: Arc::new(AtomicU64::new(0)),
            start_time: Utc::now(),
            last_search_time: Arc::new(RwLock::new(None)),
        }
    }

    // Search metrics methods
    pub async fn record_search(&self, kind: SearchKind, duration: Duration, results: usize) {
        self.searches.fetch_add(1, Ordering::Relaxed);
        self.results.fetch_add(results as u64, Ordering::Relaxed);
        SEARCHES_COUNTER.with_label_values(&[kind.as_str()]).inc();
        RESULTS_COUNTER.inc_by(results as f64);
        SEARCH_DURATION_HISTOGRAM
            .with_label_values(&[kind.as_str()])
            .observe(duration.as_secs_f64());
        *self.last_search_time.write().await = Some(Utc::now());
    }

    pub fn record_search_failure(&self, kind: SearchKind) {
        self.searches.fetch_add(1, Ordering::Relaxed);
        self.search_failures.fetch_add(1, Ordering::Relaxed);
        SEARCHES_COUNTER.with_label_values(&[kind.as_str()]).inc();
        SEARCH_FAILURES_COUNTER
            .with_label_values(&[kind.as_str()])
            .inc();
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
        RATE_LIMITED_COUNTER.inc();
    }

    // Queue metrics methods
    pub fn record_term_rotated(&self) {
        self.terms_rotated.fetch_add(1, Ordering::Relaxed);
        TERMS_ROTATED_COUNTER.inc();
    }

    pub fn record_empty_poll(&self) {
        self.empty_polls.fetch_add(1, Ordering::Relaxed);
        EMPTY_POLLS_COUNTER.inc();
    }

    pub fn record_cursor_advance_failure(&self) {
        self.cursor_advance_failures.fetch_add(1, Ordering::Relaxed);
        CURSOR_ADVANCE_FAILURES_COUNTER.inc();
    }

    pub fn record_queue_depth(&self, depth: usize) {
        QUEUE_DEPTH_GAUGE.set(depth as f64);
    }

    // Store metrics methods
    pub fn record_store_write(&self, records: usize) {
        self.store_writes.fetch_add(1, Ordering::Relaxed);
        STORE_WRITES_COUNTER.inc();
        STORE_RECORDS_COUNTER.inc_by(records as f64);
        STORE_WRITE_SIZE_HISTOGRAM.observe(records as f64);
    }

    pub fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
        STORE_FAILURES_COUNTER.inc();
    }

    // Worker metrics methods
    pub fn record_workers_active(&self, active: usize) {
        WORKERS_ACTIVE_GAUGE.set(active as f64);
    }

    pub fn record_worker_stopped(&self) {
        WORKERS_STOPPED_COUNTER.inc();
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        let uptime = (Utc::now() - self.start_time).num_seconds().max(0) as u64;
        UPTIME_GAUGE.set(uptime as f64);

        MetricsSnapshot {
            total_searches: self.searches.load(Ordering::Relaxed),
            total_search_failures: self.search_failures.load(Ordering::Relaxed),
            total_rate_limited: self.rate_limited.load(Ordering::Relaxed),
            total_results: self.results.load(Ordering::Relaxed),
            total_terms_rotated: self.terms_rotated.load(Ordering::Relaxed),
            total_empty_polls: self.empty_polls.load(Ordering::Relaxed),
            total_cursor_advance_failures: self.cursor_advance_failures.load(Ordering::Relaxed),
            total_store_writes: self.store_writes.load(Ordering::Relaxed),
            total_store_failures: self.store_failures.load(Ordering::Relaxed),
            uptime_seconds: uptime,
            start_time: self.start_time,
            last_search_time: *self.last_search_time.read().await,
        }
    }

    pub fn get_prometheus_metrics() -> Result<String, Box<dyn std::error::Error>> {
        let encoder = TextEncoder::new();
        let metric_families = REGISTRY.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    #[cfg(test)]
    pub fn reset_for_tests() {
        SEARCHES_COUNTER.reset();
        SEARCH_FAILURES_COUNTER.reset();
        RATE_LIMITED_COUNTER.reset();
        RESULTS_COUNTER.reset();
        // Histogram types don't support reset()

        TERMS_ROTATED_COUNTER.reset();
        EMPTY_POLLS_COUNTER.reset();
        CURSOR_ADVANCE_FAILURES_COUNTER.reset();
        QUEUE_DEPTH_GAUGE.set(0.0);

        STORE_WRITES_COUNTER.reset();
        STORE_RECORDS_COUNTER.reset();
        STORE_FAILURES_COUNTER.reset();

        WORKERS_ACTIVE_GAUGE.set(0.0);
        WORKERS_STOPPED_COUNTER.reset();
        UPTIME_GAUGE.set(0.0);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_searches: u64,
    pub total_search_failures: u64,
    pub total_rate_limited: u64,
    pub total_results: u64,
    pub total_terms_rotated: u64,
    pub total_empty_polls: u64,
    pub total_cursor_advance_failures: u64,
    pub total_store_writes: u64,
    pub total_store_failures: u64,
    pub uptime_seconds: u64,
    pub start_time: DateTime<Utc>,
    pub last_search_time: Option<DateTime<Utc>>,
}
