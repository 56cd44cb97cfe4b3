use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::types::TermDescriptor;
use crate::error::{PollerError, Result};
use crate::source::{dictionary_terms, location_terms, TermSource};

/// Shared, persisted work queue of term descriptors.
///
/// All mutation goes through `pop`, `push` and `advance_cursor`; the deque
/// itself is never handed out, so two workers can never observe the same
/// popped descriptor.
pub struct TermQueue {
    source: Arc<dyn TermSource>,
    default_radius: String,
    terms: Mutex<VecDeque<TermDescriptor>>,
    served: AtomicU64,
}

impl TermQueue {
    pub fn new(source: Arc<dyn TermSource>, default_radius: impl Into<String>) -> Self {
        Self {
            source,
            default_radius: default_radius.into(),
            terms: Mutex::new(VecDeque::new()),
            served: AtomicU64::new(0),
        }
    }

    /// Replaces the queue with the persisted term set, skipping the entries
    /// consumed by previous runs. Returns the resulting queue length.
    pub async fn load(&self) -> Result<usize> {
        let words = self
            .source
            .dictionary_terms()
            .await
            .map_err(|e| unavailable("dictionary terms", e))?;
        let geocodes = self
            .source
            .location_geocodes()
            .await
            .map_err(|e| unavailable("location geocodes", e))?;
        let cursor = self
            .source
            .cursor()
            .await
            .map_err(|e| unavailable("cursor", e))?;

        let mut all = dictionary_terms(words);
        let dictionary_count = all.len();
        all.extend(location_terms(&geocodes, &self.default_radius));
        let total = all.len();

        let skip = resume_offset(cursor, total);
        if skip != cursor as usize {
            warn!(
                "Persisted cursor {} is past the {} known terms, resuming at offset {}",
                cursor, total, skip
            );
        }

        let remaining: VecDeque<TermDescriptor> = all.into_iter().skip(skip).collect();
        let len = remaining.len();
        *self.terms.lock().await = remaining;

        info!(
            "Loaded term queue: {} dictionary + {} location terms, cursor {}, {} queued",
            dictionary_count,
            total - dictionary_count,
            cursor,
            len
        );
        if len == 0 && total > 0 {
            warn!(
                "Cursor {} consumed all {} terms; workers will idle until the cursor is reset",
                cursor, total
            );
        } else if len == 0 {
            warn!("Term queue is empty after load; workers will idle");
        }

        Ok(len)
    }

    pub async fn pop(&self) -> Option<TermDescriptor> {
        let term = self.terms.lock().await.pop_front();
        if let Some(term) = &term {
            debug!("Popped term '{}'", term.term());
        }
        term
    }

    pub async fn push(&self, term: TermDescriptor) {
        debug!("Pushed term '{}' to tail", term.term());
        self.terms.lock().await.push_back(term);
    }

    /// Records that `n` more terms were served. The in-process counter always
    /// advances; the persisted cursor may fail independently.
    pub async fn advance_cursor(&self, n: u64) -> Result<u64> {
        self.served.fetch_add(n, Ordering::AcqRel);
        self.source.advance_cursor(n).await
    }

    /// Completion step for a served term: back to the tail, cursor forward by one.
    pub async fn rotate(&self, term: TermDescriptor) -> Result<u64> {
        self.push(term).await;
        self.advance_cursor(1).await
    }

    /// Terms served by this process since start.
    pub fn served(&self) -> u64 {
        self.served.load(Ordering::Acquire)
    }

    pub async fn len(&self) -> usize {
        self.terms.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.terms.lock().await.is_empty()
    }

    /// Copy of the current queue order, head first.
    pub async fn snapshot(&self) -> Vec<TermDescriptor> {
        self.terms.lock().await.iter().cloned().collect()
    }
}

/// Number of leading terms to skip for a persisted cursor.
///
/// A cursor within the term set skips exactly that many entries. The cursor
/// keeps growing while terms rotate, so a value beyond the set wraps around.
pub fn resume_offset(cursor: u64, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let total_u64 = total as u64;
    if cursor <= total_u64 {
        cursor as usize
    } else {
        (cursor % total_u64) as usize
    }
}

fn unavailable(what: &str, e: PollerError) -> PollerError {
    match e {
        PollerError::SourceUnavailable(_) => e,
        other => PollerError::SourceUnavailable(format!("failed to read {what}: {other}")),
    }
}
