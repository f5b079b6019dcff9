//! Test utilities shared by the unit tests.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - Failure-injecting doubles for the store and the settlement gateway
//! - `TestBilling`, which wires every use case over an in-memory store

mod billing_harness;
mod billing_mocks;
mod factories;

pub use billing_harness::*;
pub use billing_mocks::*;
pub use factories::*;

use std::sync::Arc;

use crate::{
    adapters::persistence::KvPersistence, domain::entities::date_key::DateKeyFormat,
    infra::memory_store::MemoryKvStore,
};

/// Fresh persistence over an empty in-memory store with ISO bucket keys.
pub fn in_memory_persistence() -> Arc<KvPersistence> {
    Arc::new(KvPersistence::new(
        Arc::new(MemoryKvStore::new()),
        DateKeyFormat::Iso,
    ))
}
