use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::core::types::WorkerState;

/// Point-in-time view of one account worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub index: usize,
    pub account: String,
    pub state: WorkerState,
    pub cycles: u64,
    pub failures: u64,
}

/// Shared between a worker and the health endpoint; the worker writes, the
/// scheduler reads.
#[derive(Debug)]
pub struct WorkerProbe {
    index: usize,
    account: String,
    state: AtomicU8,
    cycles: AtomicU64,
    failures: AtomicU64,
}

impl WorkerProbe {
    pub fn new(index: usize, account: impl Into<String>) -> Self {
        Self {
            index,
            account: account.into(),
            state: AtomicU8::new(encode_state(WorkerState::Idle)),
            cycles: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub fn set_state(&self, state: WorkerState) {
        self.state.store(encode_state(state), Ordering::Release);
    }

    pub fn state(&self) -> WorkerState {
        decode_state(self.state.load(Ordering::Acquire))
    }

    pub fn record_cycle(&self, failed: bool) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn status(&self) -> WorkerStatus {
        WorkerStatus {
            index: self.index,
            account: self.account.clone(),
            state: self.state(),
            cycles: self.cycles.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

fn encode_state(state: WorkerState) -> u8 {
    match state {
        WorkerState::Idle => 0,
        WorkerState::Searching => 1,
        WorkerState::Cooling => 2,
        WorkerState::Stopped => 3,
    }
}

fn decode_state(raw: u8) -> WorkerState {
    match raw {
        0 => WorkerState::Idle,
        1 => WorkerState::Searching,
        2 => WorkerState::Cooling,
        _ => WorkerState::Stopped,
    }
}
