use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use super::{ResultBatch, SearchClient, SearchError, SearchOptions};
use crate::config::AccountCredentials;

/// Search API client bound to one account's bearer token.
pub struct TwitterSearchClient {
    client: Client,
    endpoint: String,
    account: AccountCredentials,
}

impl TwitterSearchClient {
    pub fn new(
        endpoint: impl Into<String>,
        account: AccountCredentials,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            account,
        })
    }

    async fn search(&self, params: &[(&str, String)]) -> Result<ResultBatch, SearchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(&self.account.bearer_token)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(SearchError::InvalidCredentials {
                    account: self.account.name.clone(),
                });
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                return Err(SearchError::RateLimited { retry_after_secs });
            }
            _ if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(SearchError::Api {
                    status: status.as_u16(),
                    body,
                });
            }
            _ => {}
        }

        let body = response.bytes().await?;
        let batch: ResultBatch = serde_json::from_slice(&body)?;
        debug!(
            "Account '{}' received {} statuses",
            self.account.name,
            batch.len()
        );
        Ok(batch)
    }
}

#[async_trait]
impl SearchClient for TwitterSearchClient {
    fn account(&self) -> &str {
        &self.account.name
    }

    async fn keyword_search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<ResultBatch, SearchError> {
        self.search(&[
            ("q", query.to_string()),
            ("lang", options.language.clone()),
            ("count", options.page_size.to_string()),
        ])
        .await
    }

    async fn geo_search(
        &self,
        geocode: &str,
        radius: &str,
        options: &SearchOptions,
    ) -> Result<ResultBatch, SearchError> {
        self.search(&[
            ("q", String::new()),
            ("lang", options.language.clone()),
            ("count", options.page_size.to_string()),
            ("geocode", format!("{geocode},{radius}")),
        ])
        .await
    }
}
