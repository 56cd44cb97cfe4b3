// Search client module
// One client per credentialed account; keyword and geographic searches

pub mod twitter;

pub use twitter::TwitterSearchClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("rate limited by search API (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("credentials rejected for account '{account}'")]
    InvalidCredentials { account: String },

    #[error("failed to decode search response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SearchError {
    /// The account can never search again with these credentials.
    pub fn is_fatal_for_account(&self) -> bool {
        matches!(self, SearchError::InvalidCredentials { .. })
    }
}

/// Filters applied to every search regardless of kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub language: String,
    pub page_size: u32,
}

impl From<&crate::Config> for SearchOptions {
    fn from(config: &crate::Config) -> Self {
        Self {
            language: config.language.clone(),
            page_size: config.page_size,
        }
    }
}

/// One status returned by the search API.
///
/// Only the fields the sink needs are typed; everything else is kept
/// verbatim in `extra` and written to the store unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    /// Empty when the API omitted it; such statuses are never stored.
    #[serde(default)]
    pub id_str: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub user: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Statuses returned by one search call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultBatch {
    #[serde(default)]
    pub statuses: Vec<Status>,
}

impl ResultBatch {
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Name of the account whose credentials this client uses.
    fn account(&self) -> &str;

    async fn keyword_search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<ResultBatch, SearchError>;

    async fn geo_search(
        &self,
        geocode: &str,
        radius: &str,
        options: &SearchOptions,
    ) -> Result<ResultBatch, SearchError>;
}
