use crate::error::{PollerError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::fmt;
use std::path::Path;

/// One credentialed identity used to issue searches.
#[derive(Clone, Deserialize)]
pub struct AccountCredentials {
    pub name: String,
    pub bearer_token: String,
}

impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("name", &self.name)
            .field("bearer_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Term source (Redis) settings
    pub redis_url: String,
    pub dictionary_key: String,
    pub cursor_key: String,
    pub locations_key: String,
    pub hits_key: String,

    // Search API settings
    pub search_api_url: String,
    pub search_timeout_ms: u64,
    pub accounts: Vec<AccountCredentials>,

    // Rate budget settings
    pub rate_window_ms: u64,
    pub rate_limit: u32,

    // Query settings
    pub default_radius: String,
    pub language: String,
    pub page_size: u32,

    // Result store settings
    pub store_url: String,
    pub user_index: String,
    pub tweet_index: String,
    pub message_index: String,

    // HTTP server settings
    pub http_port: u16,

    // Shutdown and monitoring settings
    pub shutdown_timeout_secs: u64,
    pub metrics_log_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let accounts_file = env::var("ACCOUNTS_FILE")
            .map_err(|_| PollerError::Config("ACCOUNTS_FILE is required".to_string()))?;

        Ok(Config {
            // Term source configuration
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            dictionary_key: env::var("DICTIONARY_KEY").unwrap_or_else(|_| "dictionary".to_string()),
            cursor_key: env::var("CURSOR_KEY").unwrap_or_else(|_| "pointer".to_string()),
            locations_key: env::var("LOCATIONS_KEY")
                .unwrap_or_else(|_| "municipios:location".to_string()),
            hits_key: env::var("HITS_KEY").unwrap_or_else(|_| "term:hits".to_string()),

            // Search API configuration
            search_api_url: env::var("SEARCH_API_URL").unwrap_or_else(|_| {
                "https://api.twitter.com/1.1/search/tweets.json".to_string()
            }),
            search_timeout_ms: env::var("SEARCH_TIMEOUT_MS")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .unwrap_or(10000),
            accounts: Self::load_accounts(&accounts_file)?,

            // Rate budget configuration
            rate_window_ms: env::var("RATE_WINDOW_MS")
                .unwrap_or_else(|_| "900000".to_string())
                .parse()
                .unwrap_or(900_000),
            rate_limit: env::var("RATE_LIMIT")
                .unwrap_or_else(|_| "180".to_string())
                .parse()
                .unwrap_or(180),

            // Query configuration
            default_radius: env::var("DEFAULT_RADIUS").unwrap_or_else(|_| "20km".to_string()),
            language: env::var("SEARCH_LANGUAGE").unwrap_or_else(|_| "es".to_string()),
            page_size: env::var("PAGE_SIZE")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),

            // Result store configuration
            store_url: env::var("STORE_URL")
                .unwrap_or_else(|_| "http://localhost:9200".to_string()),
            user_index: env::var("USER_INDEX").unwrap_or_else(|_| "twitter-users".to_string()),
            tweet_index: env::var("TWEET_INDEX").unwrap_or_else(|_| "twitter-tweets".to_string()),
            message_index: env::var("MESSAGE_INDEX")
                .unwrap_or_else(|_| "geo-messages".to_string()),

            // HTTP server configuration
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),

            // Shutdown and monitoring configuration
            shutdown_timeout_secs: env::var("SHUTDOWN_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            metrics_log_interval_secs: env::var("METRICS_LOG_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
        })
    }

    /// Reads the account list, a JSON array of `{"name", "bearer_token"}` objects.
    pub fn load_accounts(path: impl AsRef<Path>) -> Result<Vec<AccountCredentials>> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PollerError::Config(format!(
                "Failed to read accounts file {}: {e}",
                path.display()
            ))
        })?;
        let accounts: Vec<AccountCredentials> = serde_json::from_str(&raw)?;
        Ok(accounts)
    }

    pub fn validate(&self) -> Result<()> {
        // Account validation
        if self.accounts.is_empty() {
            return Err(PollerError::Config(
                "At least one account is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for account in &self.accounts {
            if account.bearer_token.trim().is_empty() {
                return Err(PollerError::Config(format!(
                    "Account '{}' has an empty bearer token",
                    account.name
                )));
            }
            if !names.insert(account.name.as_str()) {
                return Err(PollerError::Config(format!(
                    "Duplicate account name '{}'",
                    account.name
                )));
            }
        }

        // Rate budget validation
        if self.rate_window_ms == 0 {
            return Err(PollerError::Config(
                "Rate window must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit == 0 {
            return Err(PollerError::Config(
                "Rate limit must be greater than 0".to_string(),
            ));
        }

        // Query validation
        if self.page_size == 0 || self.page_size > 100 {
            return Err(PollerError::Config(
                "Page size must be between 1 and 100".to_string(),
            ));
        }

        if self.default_radius.trim().is_empty() {
            return Err(PollerError::Config(
                "Default radius must not be empty".to_string(),
            ));
        }

        if self.language.trim().is_empty() {
            return Err(PollerError::Config(
                "Search language must not be empty".to_string(),
            ));
        }

        if self.search_timeout_ms == 0 {
            return Err(PollerError::Config(
                "Search timeout must be greater than 0".to_string(),
            ));
        }

        // HTTP port validation (valid port range: 1-65535)
        if self.http_port == 0 {
            return Err(PollerError::Config(
                "HTTP port must be between 1 and 65535".to_string(),
            ));
        }

        // Shutdown timeout validation
        if self.shutdown_timeout_secs == 0 {
            return Err(PollerError::Config(
                "Shutdown timeout must be greater than 0".to_string(),
            ));
        }

        if self.metrics_log_interval_secs == 0 {
            return Err(PollerError::Config(
                "Metrics log interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
