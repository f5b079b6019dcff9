//! Shared types for the billing engine.
//!
//! This crate provides:
//! - Billing cycle enum (`BillingCycle`)
//! - Invoice payment status enum and its transition rules (`PaymentStatus`)
//! - Customer subscription status enum (`SubscriptionStatus`)

mod cycle;
mod payment;
mod subscription;

pub use cycle::BillingCycle;
pub use payment::PaymentStatus;
pub use subscription::SubscriptionStatus;
