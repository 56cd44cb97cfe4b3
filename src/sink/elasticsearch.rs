use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use super::records::{RecordCategory, StoreRecord};
use super::ResultStore;
use crate::error::{PollerError, Result};

/// Target index for each record category.
#[derive(Debug, Clone)]
pub struct StoreIndices {
    pub user: String,
    pub tweet: String,
    pub message: String,
}

impl StoreIndices {
    pub fn for_category(&self, category: RecordCategory) -> &str {
        match category {
            RecordCategory::User => &self.user,
            RecordCategory::Tweet => &self.tweet,
            RecordCategory::Message => &self.message,
        }
    }
}

impl From<&crate::Config> for StoreIndices {
    fn from(config: &crate::Config) -> Self {
        Self {
            user: config.user_index.clone(),
            tweet: config.tweet_index.clone(),
            message: config.message_index.clone(),
        }
    }
}

/// Bulk writer for an Elasticsearch-compatible `_bulk` endpoint.
pub struct ElasticsearchStore {
    client: Client,
    bulk_url: String,
    indices: StoreIndices,
}

impl ElasticsearchStore {
    pub fn new(base_url: &str, indices: StoreIndices, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let bulk_url = format!("{}/_bulk", base_url.trim_end_matches('/'));

        info!(
            "Result store at {} (users: '{}', tweets: '{}', messages: '{}')",
            bulk_url, indices.user, indices.tweet, indices.message
        );

        Ok(Self {
            client,
            bulk_url,
            indices,
        })
    }

    /// Newline-delimited action/document pairs.
    pub fn bulk_body(&self, records: &[StoreRecord]) -> Result<String> {
        let mut body = String::new();
        for record in records {
            let mut action = json!({ "_index": self.indices.for_category(record.category) });
            if let Some(id) = &record.id {
                action["_id"] = Value::String(id.clone());
            }
            body.push_str(&serde_json::to_string(&json!({ "index": action }))?);
            body.push('\n');
            body.push_str(&serde_json::to_string(&record.document)?);
            body.push('\n');
        }
        Ok(body)
    }
}

#[async_trait]
impl ResultStore for ElasticsearchStore {
    async fn bulk_write(&self, records: Vec<StoreRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let body = self.bulk_body(&records)?;
        let response = self
            .client
            .post(&self.bulk_url)
            .header(header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PollerError::Store(format!(
                "Bulk write returned {status}: {text}"
            )));
        }

        let result: Value = response.json().await?;
        if result.get("errors").and_then(Value::as_bool).unwrap_or(false) {
            let failed = result
                .get("items")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter(|item| {
                            item.get("index")
                                .and_then(|i| i.get("error"))
                                .is_some()
                        })
                        .count()
                })
                .unwrap_or(0);
            return Err(PollerError::Store(format!(
                "Bulk write rejected {failed} of {} records",
                records.len()
            )));
        }

        debug!("Bulk wrote {} records", records.len());
        Ok(())
    }
}
