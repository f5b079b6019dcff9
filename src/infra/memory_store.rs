use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::kv_store::{KeyPage, KvStore, page_from_sorted},
};

/// Process-local store for development runs and tests. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> AppResult<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str, cursor: Option<&str>, limit: usize) -> AppResult<KeyPage> {
        let entries = self.entries()?;
        // BTreeMap iterates in key order, start at the prefix
        let keys = entries
            .range(prefix.to_string()..)
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(prefix))
            .cloned();
        Ok(page_from_sorted(keys, prefix, cursor, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_put_delete() {
        let store = MemoryKvStore::new();
        assert_eq!(store.get("a").await.unwrap(), None);

        store.put("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));

        store.delete("a").await.unwrap();
        store.delete("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_is_prefix_scoped_and_ordered() {
        let store = MemoryKvStore::new();
        for key in ["plan:b", "plan_name:x", "plan:a", "payment:1", "plan:c"] {
            store.put(key, "v").await.unwrap();
        }

        let page = store.list("plan:", None, 10).await.unwrap();
        assert_eq!(page.keys, vec!["plan:a", "plan:b", "plan:c"]);
        assert_eq!(page.cursor, None);

        let first = store.list("plan:", None, 2).await.unwrap();
        let second = store
            .list("plan:", first.cursor.as_deref(), 2)
            .await
            .unwrap();
        assert_eq!(second.keys, vec!["plan:c"]);
    }
}
