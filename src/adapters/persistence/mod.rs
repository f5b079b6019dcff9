use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    app_error::{AppError, AppResult},
    application::ports::kv_store::KvStore,
    domain::entities::date_key::DateKeyFormat,
};

pub mod customer;
pub mod invoice;
pub mod keys;
pub mod payment;
pub mod schedule;
pub mod subscription_plan;

const MAX_JSON_LOG_LEN: usize = 200;

/// Keys fetched per `list` call when a repository needs a full prefix scan.
const SCAN_PAGE: usize = 500;

/// Decode a stored JSON value, logging a truncated copy of the raw value on failure.
///
/// # Arguments
/// * `raw` - The stored value
/// * `key` - Key it was read from (for log filtering)
pub fn decode_json<T: DeserializeOwned>(raw: &str, key: &str) -> AppResult<T> {
    serde_json::from_str(raw).map_err(|err| {
        // Truncate raw JSON to prevent log bloat from large ledgers
        let truncated = if raw.chars().count() > MAX_JSON_LOG_LEN {
            format!("{}...", raw.chars().take(MAX_JSON_LOG_LEN).collect::<String>())
        } else {
            raw.to_string()
        };

        tracing::warn!(
            key = key,
            raw_json = %truncated,
            error = %err,
            "Failed to decode stored value"
        );
        AppError::Internal(format!("corrupt value at {key}"))
    })
}

/// Repository implementation over any [`KvStore`].
#[derive(Clone)]
pub struct KvPersistence {
    store: Arc<dyn KvStore>,
    key_format: DateKeyFormat,
}

impl KvPersistence {
    pub fn new(store: Arc<dyn KvStore>, key_format: DateKeyFormat) -> Self {
        KvPersistence { store, key_format }
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        self.store
            .get(key)
            .await?
            .map(|raw| decode_json(&raw, key))
            .transpose()
    }

    async fn put_json<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(format!("encode {key}: {e}")))?;
        self.store.put(key, &raw).await
    }

    /// Every key under `prefix`, following the cursor to the end.
    async fn list_all(&self, prefix: &str) -> AppResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.store.list(prefix, cursor.as_deref(), SCAN_PAGE).await?;
            keys.extend(page.keys);
            match page.cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(keys),
            }
        }
    }
}
