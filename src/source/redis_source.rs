use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, Client};
use std::collections::HashMap;
use tracing::{debug, info};

use super::TermSource;
use crate::error::{PollerError, Result};

/// Redis keys backing the term source.
#[derive(Debug, Clone)]
pub struct RedisKeys {
    pub dictionary: String,
    pub cursor: String,
    pub locations: String,
    pub hits: String,
}

impl From<&crate::Config> for RedisKeys {
    fn from(config: &crate::Config) -> Self {
        Self {
            dictionary: config.dictionary_key.clone(),
            cursor: config.cursor_key.clone(),
            locations: config.locations_key.clone(),
            hits: config.hits_key.clone(),
        }
    }
}

pub struct RedisTermSource {
    connection: MultiplexedConnection,
    keys: RedisKeys,
}

impl RedisTermSource {
    pub async fn new(redis_url: &str, keys: RedisKeys) -> Result<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            PollerError::SourceUnavailable(format!("Invalid Redis URL {redis_url}: {e}"))
        })?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                PollerError::SourceUnavailable(format!("Failed to connect to Redis: {e}"))
            })?;

        info!(
            "Connected to Redis term source (dictionary '{}', locations '{}', cursor '{}')",
            keys.dictionary, keys.locations, keys.cursor
        );

        Ok(Self { connection, keys })
    }
}

#[async_trait]
impl TermSource for RedisTermSource {
    async fn dictionary_terms(&self) -> Result<Vec<String>> {
        let words: Vec<String> = redis::cmd("SMEMBERS")
            .arg(&self.keys.dictionary)
            .query_async(&mut self.connection.clone())
            .await
            .map_err(PollerError::Redis)?;

        debug!(
            "Loaded {} dictionary terms from '{}'",
            words.len(),
            self.keys.dictionary
        );
        Ok(words)
    }

    async fn location_geocodes(&self) -> Result<HashMap<String, String>> {
        let geocodes: HashMap<String, String> = redis::cmd("HGETALL")
            .arg(&self.keys.locations)
            .query_async(&mut self.connection.clone())
            .await
            .map_err(PollerError::Redis)?;

        debug!(
            "Loaded {} location geocodes from '{}'",
            geocodes.len(),
            self.keys.locations
        );
        Ok(geocodes)
    }

    async fn cursor(&self) -> Result<u64> {
        let cursor: Option<u64> = redis::cmd("GET")
            .arg(&self.keys.cursor)
            .query_async(&mut self.connection.clone())
            .await
            .map_err(PollerError::Redis)?;

        Ok(cursor.unwrap_or(0))
    }

    async fn advance_cursor(&self, n: u64) -> Result<u64> {
        let value: u64 = redis::cmd("INCRBY")
            .arg(&self.keys.cursor)
            .arg(n)
            .query_async(&mut self.connection.clone())
            .await
            .map_err(PollerError::Redis)?;

        Ok(value)
    }

    async fn set_cursor(&self, value: u64) -> Result<()> {
        let _: () = redis::cmd("SET")
            .arg(&self.keys.cursor)
            .arg(value)
            .query_async(&mut self.connection.clone())
            .await
            .map_err(PollerError::Redis)?;

        Ok(())
    }

    async fn record_hits(&self, term: &str, hits: u64) -> Result<()> {
        let _: i64 = redis::cmd("HINCRBY")
            .arg(&self.keys.hits)
            .arg(term)
            .arg(hits)
            .query_async(&mut self.connection.clone())
            .await
            .map_err(PollerError::Redis)?;

        Ok(())
    }
}
