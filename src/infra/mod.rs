pub mod billing_worker;
pub mod config;
pub mod error;
pub mod memory_store;
pub mod redis_store;
pub mod setup;
pub mod stub_settlement;
