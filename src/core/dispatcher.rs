use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::types::{SearchKind, TermDescriptor};
use crate::monitoring::Metrics;
use crate::search::{ResultBatch, SearchClient, SearchError, SearchOptions};
use crate::sink::ResultSink;
use crate::source::TermSource;

/// What happened to one dispatched descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Search succeeded; `results` statuses were handed to the sink.
    Served { kind: SearchKind, results: usize },
    /// Search failed and was treated as zero results.
    Failed { kind: SearchKind },
    /// The account's credentials were rejected.
    CredentialsRejected { kind: SearchKind },
}

impl DispatchOutcome {
    pub fn results(&self) -> usize {
        match self {
            DispatchOutcome::Served { results, .. } => *results,
            _ => 0,
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, DispatchOutcome::Served { .. })
    }
}

/// Routes descriptors to keyword or geographic search and forwards results.
pub struct SearchDispatcher {
    options: SearchOptions,
    sink: Arc<ResultSink>,
    source: Arc<dyn TermSource>,
    metrics: Arc<Metrics>,
}

impl SearchDispatcher {
    pub fn new(
        options: SearchOptions,
        sink: Arc<ResultSink>,
        source: Arc<dyn TermSource>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            options,
            sink,
            source,
            metrics,
        }
    }

    pub async fn dispatch(
        &self,
        client: &dyn SearchClient,
        descriptor: &TermDescriptor,
    ) -> DispatchOutcome {
        let kind = descriptor.kind();
        let start = Instant::now();

        let result = match (descriptor.geocode(), descriptor.radius()) {
            (Some(geocode), radius) => {
                client
                    .geo_search(geocode, radius.unwrap_or_default(), &self.options)
                    .await
            }
            (None, _) => client.keyword_search(descriptor.query(), &self.options).await,
        };

        match result {
            Ok(batch) => {
                let results = batch.len();
                self.metrics
                    .record_search(kind, start.elapsed(), results)
                    .await;
                info!(
                    "[{}] {} search for '{}' returned {} statuses",
                    client.account(),
                    kind,
                    descriptor.term(),
                    results
                );
                self.log_language_mismatches(&batch);

                if results > 0 {
                    if let Err(e) = self.source.record_hits(descriptor.term(), results as u64).await {
                        warn!("Failed to record hits for '{}': {}", descriptor.term(), e);
                    }
                }

                self.sink.submit(batch, descriptor.term());
                DispatchOutcome::Served { kind, results }
            }
            Err(e) => {
                self.metrics.record_search_failure(kind);
                if matches!(e, SearchError::RateLimited { .. }) {
                    self.metrics.record_rate_limited();
                }
                warn!(
                    "[{}] {} search for '{}' failed: {}",
                    client.account(),
                    kind,
                    descriptor.term(),
                    e
                );

                if e.is_fatal_for_account() {
                    DispatchOutcome::CredentialsRejected { kind }
                } else {
                    DispatchOutcome::Failed { kind }
                }
            }
        }
    }

    fn log_language_mismatches(&self, batch: &ResultBatch) {
        for status in &batch.statuses {
            if let Some(lang) = status.lang.as_deref() {
                if lang != self.options.language {
                    debug!(
                        "Status {} has language '{}' (requested '{}')",
                        status.id_str, lang, self.options.language
                    );
                }
            }
        }
    }
}
