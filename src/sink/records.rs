use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::search::ResultBatch;

const TWITTER_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Logical partition a stored record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordCategory {
    /// Status author
    User,
    /// Full status, tagged with its provenance term
    Tweet,
    /// Compact `{id, created_at, text, term}` view of a status
    Message,
}

impl RecordCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordCategory::User => "user",
            RecordCategory::Tweet => "tweet",
            RecordCategory::Message => "message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreRecord {
    pub category: RecordCategory,
    pub id: Option<String>,
    pub document: Value,
}

/// Splits a batch into per-category records, tagging each status with `term`.
///
/// Statuses without an id or an author are dropped.
pub fn records_from_batch(batch: ResultBatch, term: &str) -> Vec<StoreRecord> {
    let mut records = Vec::with_capacity(batch.len() * 3);

    for mut status in batch.statuses {
        if status.id_str.is_empty() {
            debug!("Skipping status without id_str");
            continue;
        }
        let Some(user) = status.user.take() else {
            debug!("Skipping status {} without user", status.id_str);
            continue;
        };

        let user_id = user
            .get("id_str")
            .and_then(Value::as_str)
            .map(str::to_string);
        records.push(StoreRecord {
            category: RecordCategory::User,
            id: user_id,
            document: user,
        });

        let message = json!({
            "id": status.id_str,
            "created_at": normalize_created_at(&status.created_at),
            "text": status.text,
            "term": term,
        });

        let id = status.id_str.clone();
        let mut tweet = match serde_json::to_value(&status) {
            Ok(value) => value,
            Err(e) => {
                debug!("Failed to serialize status {}: {}", id, e);
                continue;
            }
        };
        if let Some(fields) = tweet.as_object_mut() {
            fields.remove("user");
            fields.insert("term".to_string(), Value::String(term.to_string()));
        }

        records.push(StoreRecord {
            category: RecordCategory::Tweet,
            id: Some(id.clone()),
            document: tweet,
        });
        records.push(StoreRecord {
            category: RecordCategory::Message,
            id: Some(id),
            document: message,
        });
    }

    records
}

/// Converts the search API date format to RFC 3339, keeping the raw value
/// when it does not parse.
pub fn normalize_created_at(raw: &str) -> String {
    DateTime::parse_from_str(raw, TWITTER_DATE_FORMAT)
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339())
        .unwrap_or_else(|_| raw.to_string())
}
