// Term source module
// Persisted term set, resume cursor and per-term hit counters

pub mod locations;
pub mod redis_source;

pub use locations::{dictionary_terms, location_terms};
pub use redis_source::RedisTermSource;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;

/// Storage the term queue is loaded from and reports progress to.
#[async_trait]
pub trait TermSource: Send + Sync {
    async fn dictionary_terms(&self) -> Result<Vec<String>>;

    /// Location key (comma separated fields) to `"lat,lon"` geocode.
    async fn location_geocodes(&self) -> Result<HashMap<String, String>>;

    /// Number of terms consumed across previous runs. Missing means 0.
    async fn cursor(&self) -> Result<u64>;

    /// Adds `n` to the persisted cursor and returns the new value.
    async fn advance_cursor(&self, n: u64) -> Result<u64>;

    async fn set_cursor(&self, value: u64) -> Result<()>;

    async fn record_hits(&self, term: &str, hits: u64) -> Result<()>;
}
