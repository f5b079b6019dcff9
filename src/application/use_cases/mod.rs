pub mod customer;
pub mod invoice_generation;
pub mod payment;
pub mod plan_catalog;
pub mod schedule;
