use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::monitoring::WorkerStatus;

/// One unit of search work.
///
/// A descriptor carrying a `geocode` is a geographic search; anything else is a
/// keyword search on `query`. Fields are private so a descriptor cannot change
/// once it has been queued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermDescriptor {
    query: String,
    term: String,
    geocode: Option<String>,
    radius: Option<String>,
}

impl TermDescriptor {
    /// Keyword descriptor where the provenance tag is the query itself.
    pub fn keyword(word: impl Into<String>) -> Self {
        let word = word.into();
        Self {
            query: word.clone(),
            term: word,
            geocode: None,
            radius: None,
        }
    }

    pub fn geo(
        query: impl Into<String>,
        term: impl Into<String>,
        geocode: impl Into<String>,
        radius: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            term: term.into(),
            geocode: Some(geocode.into()),
            radius: Some(radius.into()),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn geocode(&self) -> Option<&str> {
        self.geocode.as_deref()
    }

    pub fn radius(&self) -> Option<&str> {
        self.radius.as_deref()
    }

    pub fn kind(&self) -> SearchKind {
        if self.geocode.is_some() {
            SearchKind::Geo
        } else {
            SearchKind::Keyword
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Keyword,
    Geo,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Keyword => "keyword",
            SearchKind::Geo => "geo",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of an account worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Idle,
    Searching,
    Cooling,
    Stopped,
}

/// Scheduler metrics for monitoring and observability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerMetrics {
    pub total_searches: u64,
    pub total_search_failures: u64,
    pub total_results: u64,
    pub total_terms_rotated: u64,
    pub total_store_failures: u64,
}

/// Health status for the whole worker fleet
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerHealth {
    pub healthy: bool,
    pub workers_active: usize,
    pub workers_stopped: usize,
    pub queue_depth: usize,
    pub terms_served: u64,
    pub last_check: DateTime<Utc>,
    pub metrics: SchedulerMetrics,
    pub workers: Vec<WorkerStatus>,
}
