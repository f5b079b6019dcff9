//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use billing_types::{BillingCycle, PaymentStatus, SubscriptionStatus};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::domain::entities::{
    customer::{Customer, SubscriptionChange},
    invoice::Invoice,
    subscription_plan::SubscriptionPlan,
};

/// Midnight UTC on the given date.
pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Returns a consistent test datetime (2024-01-15 12:00:00 UTC).
pub fn test_datetime() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
}

/// Create a monthly test plan priced 300.
pub fn create_test_plan(overrides: impl FnOnce(&mut SubscriptionPlan)) -> SubscriptionPlan {
    let mut plan = SubscriptionPlan {
        id: Uuid::new_v4(),
        name: "Basic".to_string(),
        price: 300.0,
        billing_cycle: BillingCycle::Monthly,
    };
    overrides(&mut plan);
    plan
}

/// Create an active customer whose ledger starts on the given plan at `test_datetime()`.
pub fn create_test_customer(
    plan: &SubscriptionPlan,
    overrides: impl FnOnce(&mut Customer),
) -> Customer {
    let mut customer = Customer {
        id: Uuid::new_v4(),
        name: "Customer".to_string(),
        email: "customer@example.com".to_string(),
        current_subscription_plan_id: plan.id,
        current_subscription_status: SubscriptionStatus::Active,
        subscription_changes: vec![SubscriptionChange {
            subscription_plan_id: plan.id,
            change_date: test_datetime(),
            billing_cycle: plan.billing_cycle,
        }],
        last_generated_at: None,
    };
    overrides(&mut customer);
    customer
}

/// Create a pending invoice of 300 issued at `test_datetime()`.
pub fn create_test_invoice(customer_id: Uuid, overrides: impl FnOnce(&mut Invoice)) -> Invoice {
    let mut invoice = Invoice {
        id: Uuid::new_v4(),
        customer_id,
        amount: 300,
        due_date: test_datetime(),
        payment_status: PaymentStatus::Pending,
        payment_date: None,
        retry_attempts: 0,
    };
    overrides(&mut invoice);
    invoice
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factories_apply_overrides() {
        let plan = create_test_plan(|p| p.billing_cycle = BillingCycle::Yearly);
        let customer = create_test_customer(&plan, |c| c.email = "x@example.com".into());
        let invoice = create_test_invoice(customer.id, |i| i.amount = 42);

        assert_eq!(customer.current_cycle(), Some(BillingCycle::Yearly));
        assert_eq!(customer.email, "x@example.com");
        assert_eq!(invoice.customer_id, customer.id);
        assert_eq!(invoice.amount, 42);
    }
}
