//! Failure-injecting doubles for the store and the settlement gateway.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        kv_store::{KeyPage, KvStore},
        settlement::{SettlementGateway, SettlementReceipt},
    },
    domain::entities::invoice::Invoice,
    infra::memory_store::MemoryKvStore,
};

// ============================================================================
// FlakyKvStore
// ============================================================================

/// In-memory store whose writes under one prefix can be made to fail.
#[derive(Default)]
pub struct FlakyKvStore {
    inner: MemoryKvStore,
    failing_prefix: Mutex<Option<String>>,
}

impl FlakyKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every put/delete on a key starting with `prefix` fails from now on.
    pub fn fail_writes_to(&self, prefix: &str) {
        *self.failing_prefix.lock().unwrap() = Some(prefix.to_string());
    }

    pub fn heal(&self) {
        *self.failing_prefix.lock().unwrap() = None;
    }

    fn check_write(&self, key: &str) -> AppResult<()> {
        match self.failing_prefix.lock().unwrap().as_deref() {
            Some(prefix) if key.starts_with(prefix) => {
                Err(AppError::Store(format!("injected write failure for {key}")))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl KvStore for FlakyKvStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> AppResult<()> {
        self.check_write(key)?;
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.check_write(key)?;
        self.inner.delete(key).await
    }

    async fn list(&self, prefix: &str, cursor: Option<&str>, limit: usize) -> AppResult<KeyPage> {
        self.inner.list(prefix, cursor, limit).await
    }
}

// ============================================================================
// FailingSettlementGateway
// ============================================================================

/// Gateway that declines a fixed number of charges, or all of them.
pub struct FailingSettlementGateway {
    fail_forever: bool,
    failures_left: AtomicU32,
    calls: AtomicU32,
}

impl FailingSettlementGateway {
    pub fn always() -> Self {
        Self {
            fail_forever: true,
            failures_left: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        }
    }

    /// Declines the first `n` charges, then accepts.
    pub fn times(n: u32) -> Self {
        Self {
            fail_forever: false,
            failures_left: AtomicU32::new(n),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettlementGateway for FailingSettlementGateway {
    async fn settle(&self, invoice: &Invoice) -> AppResult<SettlementReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let declined = self.fail_forever
            || self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
        if declined {
            return Err(AppError::Store(format!(
                "settlement declined for invoice {}",
                invoice.id
            )));
        }

        Ok(SettlementReceipt {
            reference: format!("test_settle_{}", Uuid::new_v4()),
            payment_method: crate::infra::stub_settlement::AUTO_RETRY_METHOD.to_string(),
        })
    }
}
