// Result sink module
// Tags result batches with their provenance term and bulk writes them

pub mod elasticsearch;
pub mod records;

pub use elasticsearch::{ElasticsearchStore, StoreIndices};
pub use records::{records_from_batch, RecordCategory, StoreRecord};

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::error::Result;
use crate::monitoring::Metrics;
use crate::search::ResultBatch;

/// Bulk destination for stored records.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn bulk_write(&self, records: Vec<StoreRecord>) -> Result<()>;
}

/// Fire-and-forget front of the result store.
///
/// Writes run on tracked background tasks so a slow store never holds up a
/// worker; failures end up in logs and metrics only.
pub struct ResultSink {
    store: Arc<dyn ResultStore>,
    metrics: Arc<Metrics>,
    pending: TaskTracker,
}

impl ResultSink {
    pub fn new(store: Arc<dyn ResultStore>, metrics: Arc<Metrics>) -> Self {
        Self {
            store,
            metrics,
            pending: TaskTracker::new(),
        }
    }

    /// Queues one bulk write for `batch`, tagged with `term`.
    pub fn submit(&self, batch: ResultBatch, term: &str) {
        let records = records_from_batch(batch, term);
        if records.is_empty() {
            return;
        }

        let store = self.store.clone();
        let metrics = self.metrics.clone();
        let term = term.to_string();
        self.pending.spawn(async move {
            let count = records.len();
            match store.bulk_write(records).await {
                Ok(()) => {
                    metrics.record_store_write(count);
                    debug!("Stored {} records for term '{}'", count, term);
                }
                Err(e) => {
                    metrics.record_store_failure();
                    warn!("Failed to store {} records for term '{}': {}", count, term, e);
                }
            }
        });
    }

    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Waits until every write submitted so far has finished.
    pub async fn flush(&self) {
        self.pending.close();
        self.pending.wait().await;
        self.pending.reopen();
    }
}
