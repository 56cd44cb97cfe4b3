use async_trait::async_trait;
use search_poller::error::{PollerError, Result};
use search_poller::sink::{RecordCategory, ResultStore, StoreRecord};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Keeps every bulk write in memory.
#[derive(Default)]
pub struct RecordingStore {
    records: Mutex<Vec<StoreRecord>>,
    writes: AtomicUsize,
    failing: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.failing.store(true, Ordering::SeqCst);
        store
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<StoreRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Provenance tags of every stored tweet, in write order.
    pub fn tweet_terms(&self) -> Vec<String> {
        self.records()
            .iter()
            .filter(|r| r.category == RecordCategory::Tweet)
            .filter_map(|r| r.document["term"].as_str().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl ResultStore for RecordingStore {
    async fn bulk_write(&self, records: Vec<StoreRecord>) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(PollerError::Store("store offline".to_string()));
        }
        self.records.lock().unwrap().extend(records);
        Ok(())
    }
}
