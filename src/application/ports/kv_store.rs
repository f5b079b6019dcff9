use async_trait::async_trait;

use crate::app_error::AppResult;

/// One page of keys returned by [`KvStore::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPage {
    /// Keys in ascending order.
    pub keys: Vec<String>,
    /// Pass back to `list` to continue. `None` when the listing is complete.
    pub cursor: Option<String>,
}

/// Key-value store consumed by the persistence adapters.
///
/// Implementations guarantee atomic single-key `get`/`put`/`delete` and
/// prefix-ordered listing. There are no multi-key transactions.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;
    async fn put(&self, key: &str, value: &str) -> AppResult<()>;
    async fn delete(&self, key: &str) -> AppResult<()>;
    /// Lists keys starting with `prefix` that sort strictly after `cursor`.
    async fn list(&self, prefix: &str, cursor: Option<&str>, limit: usize) -> AppResult<KeyPage>;
}

/// Builds a page from an ascending key iterator, shared by the store adapters.
pub fn page_from_sorted<I>(keys: I, prefix: &str, cursor: Option<&str>, limit: usize) -> KeyPage
where
    I: IntoIterator<Item = String>,
{
    let limit = limit.max(1);
    let mut page: Vec<String> = keys
        .into_iter()
        .filter(|k| k.starts_with(prefix))
        .filter(|k| cursor.is_none_or(|c| k.as_str() > c))
        .take(limit + 1)
        .collect();

    let has_more = page.len() > limit;
    page.truncate(limit);
    let cursor = if has_more { page.last().cloned() } else { None };

    KeyPage { keys: page, cursor }
}
