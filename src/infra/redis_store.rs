use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::kv_store::{KeyPage, KvStore, page_from_sorted},
    infra::error::InfraError,
};

const SCAN_COUNT: usize = 1000;

/// Sorted set holding every stored key at score 0, so prefix listing is a
/// `ZRANGEBYLEX` over the index instead of a keyspace scan.
const KEY_INDEX: &str = "kv_key_index";

#[derive(Clone)]
pub struct RedisKvStore {
    manager: ConnectionManager,
}

impl RedisKvStore {
    pub async fn new(redis_url: &SecretString) -> Result<Self, InfraError> {
        let client =
            redis::Client::open(redis_url.expose_secret()).map_err(InfraError::RedisConnection)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(InfraError::RedisConnection)?;

        let store = Self { manager };
        let indexed = store
            .rebuild_key_index()
            .await
            .map_err(InfraError::RedisConnection)?;
        info!(indexed, "redis key index ready");

        Ok(store)
    }

    /// Adds every existing key to the index, once at startup, so data written
    /// before the index existed stays listable.
    async fn rebuild_key_index(&self) -> Result<usize, redis::RedisError> {
        let mut conn = self.manager.clone();
        let mut scan_cursor: u64 = 0;
        let mut indexed = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(scan_cursor)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;

            let members: Vec<(i64, String)> = batch
                .into_iter()
                .filter(|key| key != KEY_INDEX)
                .map(|key| (0, key))
                .collect();
            if !members.is_empty() {
                indexed += members.len();
                let _: () = conn.zadd_multiple(KEY_INDEX, &members).await?;
            }

            if next == 0 {
                return Ok(indexed);
            }
            scan_cursor = next;
        }
    }
}

fn store_error(e: redis::RedisError) -> AppError {
    AppError::Store(e.to_string())
}

/// `ZRANGEBYLEX` bounds covering keys under `prefix` that sort after `cursor`.
fn lex_range(prefix: &str, cursor: Option<&str>) -> (Vec<u8>, Vec<u8>) {
    let min = match cursor {
        Some(c) if c >= prefix => [b"(".as_slice(), c.as_bytes()].concat(),
        _ => [b"[".as_slice(), prefix.as_bytes()].concat(),
    };
    // 0xFF never appears in UTF-8, so it sorts after every key with this prefix
    let max = [b"[".as_slice(), prefix.as_bytes(), &[0xFF_u8][..]].concat();
    (min, max)
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get(key).await.map_err(store_error)
    }

    async fn put(&self, key: &str, value: &str) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let _: () = redis::pipe()
            .atomic()
            .set(key, value)
            .ignore()
            .zadd(KEY_INDEX, key, 0)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let _: () = redis::pipe()
            .atomic()
            .del(key)
            .ignore()
            .zrem(KEY_INDEX, key)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn list(&self, prefix: &str, cursor: Option<&str>, limit: usize) -> AppResult<KeyPage> {
        let mut conn = self.manager.clone();
        let (min, max) = lex_range(prefix, cursor);

        // One extra key tells whether another page follows
        let keys: Vec<String> = redis::cmd("ZRANGEBYLEX")
            .arg(KEY_INDEX)
            .arg(min)
            .arg(max)
            .arg("LIMIT")
            .arg(0)
            .arg(limit.max(1) + 1)
            .query_async(&mut conn)
            .await
            .map_err(store_error)?;

        Ok(page_from_sorted(keys, prefix, cursor, limit))
    }
}
