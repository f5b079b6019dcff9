use std::sync::Arc;

use async_trait::async_trait;
use billing_types::SubscriptionStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{billing_math::due_date, validators::is_valid_email},
    domain::entities::customer::{Customer, SubscriptionChange},
    use_cases::{
        invoice_generation::{InvoicePage, InvoiceRepo},
        plan_catalog::PlanRepo,
        schedule::GenerationSchedule,
    },
};

/// Upper bound for one page of `list_invoices`.
pub const MAX_INVOICE_PAGE: usize = 100;

#[async_trait]
pub trait CustomerRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Customer>>;
    async fn email_exists(&self, email: &str) -> AppResult<bool>;
    /// Stores the customer and claims the email.
    async fn insert(&self, customer: &Customer) -> AppResult<()>;
    async fn update(&self, customer: &Customer) -> AppResult<()>;
    /// Removes the customer and releases the email.
    async fn delete(&self, customer: &Customer) -> AppResult<()>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerInput {
    pub name: String,
    pub email: String,
    pub subscription_plan_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanAssignment {
    pub customer: Customer,
    pub subscription_plan_name: String,
    /// Set when the assignment moved the customer to another schedule bucket.
    pub rescheduled_to: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct CustomerUseCases {
    repo: Arc<dyn CustomerRepo>,
    plans: Arc<dyn PlanRepo>,
    invoices: Arc<dyn InvoiceRepo>,
    schedule: GenerationSchedule,
}

impl CustomerUseCases {
    pub fn new(
        repo: Arc<dyn CustomerRepo>,
        plans: Arc<dyn PlanRepo>,
        invoices: Arc<dyn InvoiceRepo>,
        schedule: GenerationSchedule,
    ) -> Self {
        Self {
            repo,
            plans,
            invoices,
            schedule,
        }
    }

    pub async fn create_customer(&self, input: CreateCustomerInput) -> AppResult<Customer> {
        self.create_customer_at(input, Utc::now()).await
    }

    /// Signs the customer up on a plan and schedules their first invoice
    /// one billing cycle after `now`.
    #[instrument(skip(self))]
    pub async fn create_customer_at(
        &self,
        input: CreateCustomerInput,
        now: DateTime<Utc>,
    ) -> AppResult<Customer> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidInput("Name is required".into()));
        }
        let email = input.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::InvalidInput("Invalid email address".into()));
        }
        if self.repo.email_exists(&email).await? {
            return Err(AppError::EmailTaken);
        }

        let plan = self
            .plans
            .get_by_id(input.subscription_plan_id)
            .await?
            .ok_or(AppError::PlanNotFound)?;

        let customer = Customer {
            id: Uuid::new_v4(),
            name,
            email,
            current_subscription_plan_id: plan.id,
            current_subscription_status: SubscriptionStatus::Active,
            subscription_changes: vec![SubscriptionChange {
                subscription_plan_id: plan.id,
                change_date: now,
                billing_cycle: plan.billing_cycle,
            }],
            last_generated_at: None,
        };
        self.repo.insert(&customer).await?;

        let first_bill_date = due_date(now, plan.billing_cycle).date_naive();
        self.schedule.schedule(customer.id, first_bill_date).await?;

        info!(
            customer_id = %customer.id,
            plan_id = %plan.id,
            %first_bill_date,
            "customer created"
        );
        Ok(customer)
    }

    pub async fn get_customer(&self, id: Uuid) -> AppResult<Customer> {
        self.repo.get_by_id(id).await?.ok_or(AppError::CustomerNotFound)
    }

    /// Deletes the customer and their schedule slot. Invoices are kept.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, id: Uuid) -> AppResult<()> {
        let customer = self.get_customer(id).await?;
        self.schedule.unschedule_current(id).await?;
        self.repo.delete(&customer).await?;
        info!(customer_id = %id, "customer deleted");
        Ok(())
    }

    pub async fn assign_subscription_plan(
        &self,
        customer_id: Uuid,
        plan_id: Uuid,
    ) -> AppResult<PlanAssignment> {
        self.assign_subscription_plan_at(customer_id, plan_id, Utc::now())
            .await
    }

    /// Switches the customer to another plan.
    ///
    /// The change is appended to the ledger and priced at the next
    /// generation. A change of billing cycle moves the customer to the bucket
    /// one new cycle after the change date. A cancelled customer is
    /// reactivated with a fresh ledger.
    #[instrument(skip(self))]
    pub async fn assign_subscription_plan_at(
        &self,
        customer_id: Uuid,
        plan_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<PlanAssignment> {
        let mut customer = self.get_customer(customer_id).await?;
        let plan = self
            .plans
            .get_by_id(plan_id)
            .await?
            .ok_or(AppError::PlanNotFound)?;

        if !customer.current_subscription_status.is_active() {
            customer.reset_ledger(plan.id, plan.billing_cycle, now);
            customer.current_subscription_status = SubscriptionStatus::Active;
            self.repo.update(&customer).await?;

            let bill_date = due_date(now, plan.billing_cycle).date_naive();
            self.schedule.move_to(customer_id, bill_date).await?;

            info!(%customer_id, %plan_id, %bill_date, "subscription reactivated");
            return Ok(PlanAssignment {
                customer,
                subscription_plan_name: plan.name,
                rescheduled_to: Some(bill_date),
            });
        }

        if customer.current_subscription_plan_id == plan_id {
            return Err(AppError::SamePlan);
        }

        let previous_cycle = customer.current_cycle();
        let change = customer.record_plan_change(plan.id, plan.billing_cycle, now);
        self.repo.update(&customer).await?;

        let rescheduled_to = if previous_cycle != Some(plan.billing_cycle) {
            let bill_date = due_date(change.change_date, plan.billing_cycle).date_naive();
            self.schedule.move_to(customer_id, bill_date).await?;
            Some(bill_date)
        } else {
            None
        };

        info!(
            %customer_id,
            %plan_id,
            cycle = %plan.billing_cycle,
            rescheduled = rescheduled_to.is_some(),
            "subscription plan assigned"
        );
        Ok(PlanAssignment {
            customer,
            subscription_plan_name: plan.name,
            rescheduled_to,
        })
    }

    /// Cancels the subscription and removes the customer from the schedule.
    #[instrument(skip(self))]
    pub async fn cancel_subscription(&self, customer_id: Uuid) -> AppResult<Customer> {
        let mut customer = self.get_customer(customer_id).await?;
        if !customer.current_subscription_status.is_active() {
            return Ok(customer);
        }

        customer.current_subscription_status = SubscriptionStatus::Cancelled;
        self.repo.update(&customer).await?;
        self.schedule.unschedule_current(customer_id).await?;

        info!(%customer_id, "subscription cancelled");
        Ok(customer)
    }

    /// Invoices of the customer, oldest first.
    pub async fn list_invoices(
        &self,
        customer_id: Uuid,
        cursor: Option<&str>,
        limit: usize,
    ) -> AppResult<InvoicePage> {
        self.get_customer(customer_id).await?;
        self.invoices
            .list_by_customer(customer_id, cursor, limit.clamp(1, MAX_INVOICE_PAGE))
            .await
    }

    /// Date the customer's next invoice is scheduled for.
    pub async fn current_bill_date(&self, customer_id: Uuid) -> AppResult<Option<NaiveDate>> {
        self.get_customer(customer_id).await?;
        self.schedule.active_bill_date(customer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestBilling, at, date};
    use billing_types::BillingCycle;

    #[tokio::test]
    async fn test_create_customer_schedules_first_bill() {
        let billing = TestBilling::new();
        let plan = billing.plan("Basic", 300.0, BillingCycle::Monthly).await;

        let customer = billing
            .customers
            .create_customer_at(
                CreateCustomerInput {
                    name: "Ada".into(),
                    email: "Ada@Example.com".into(),
                    subscription_plan_id: plan.id,
                },
                at(2024, 1, 1),
            )
            .await
            .unwrap();

        assert_eq!(customer.email, "ada@example.com");
        assert_eq!(customer.subscription_changes.len(), 1);
        assert_eq!(customer.subscription_changes[0].change_date, at(2024, 1, 1));
        assert_eq!(
            billing.schedule.due_on(date(2024, 2, 1)).await.unwrap(),
            vec![customer.id]
        );
        assert_eq!(
            billing.customers.current_bill_date(customer.id).await.unwrap(),
            Some(date(2024, 2, 1))
        );
    }

    #[tokio::test]
    async fn test_yearly_signup_due_a_year_later() {
        let billing = TestBilling::new();
        let plan = billing.plan("Annual", 1200.0, BillingCycle::Yearly).await;

        let customer = billing.customer_on(&plan, at(2024, 3, 15)).await;

        assert_eq!(
            billing.customers.current_bill_date(customer.id).await.unwrap(),
            Some(date(2025, 3, 15))
        );
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let billing = TestBilling::new();
        let plan = billing.plan("Basic", 300.0, BillingCycle::Monthly).await;
        billing.customer_on(&plan, at(2024, 1, 1)).await;

        let result = billing
            .customers
            .create_customer_at(
                CreateCustomerInput {
                    name: "Someone else".into(),
                    email: "CUSTOMER@example.com ".into(),
                    subscription_plan_id: plan.id,
                },
                at(2024, 1, 2),
            )
            .await;

        assert!(matches!(result, Err(AppError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_create_with_unknown_plan() {
        let billing = TestBilling::new();
        let result = billing
            .customers
            .create_customer(CreateCustomerInput {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                subscription_plan_id: Uuid::new_v4(),
            })
            .await;

        assert!(matches!(result, Err(AppError::PlanNotFound)));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_email() {
        let billing = TestBilling::new();
        let plan = billing.plan("Basic", 300.0, BillingCycle::Monthly).await;
        let result = billing
            .customers
            .create_customer(CreateCustomerInput {
                name: "Ada".into(),
                email: "not-an-email".into(),
                subscription_plan_id: plan.id,
            })
            .await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_same_plan_is_rejected() {
        let billing = TestBilling::new();
        let plan = billing.plan("Basic", 300.0, BillingCycle::Monthly).await;
        let customer = billing.customer_on(&plan, at(2024, 1, 1)).await;

        let result = billing
            .customers
            .assign_subscription_plan_at(customer.id, plan.id, at(2024, 1, 5))
            .await;

        assert!(matches!(result, Err(AppError::SamePlan)));
    }

    #[tokio::test]
    async fn test_assign_unknown_customer_or_plan() {
        let billing = TestBilling::new();
        let plan = billing.plan("Basic", 300.0, BillingCycle::Monthly).await;
        let customer = billing.customer_on(&plan, at(2024, 1, 1)).await;

        let missing_customer = billing
            .customers
            .assign_subscription_plan(Uuid::new_v4(), plan.id)
            .await;
        assert!(matches!(missing_customer, Err(AppError::CustomerNotFound)));

        let missing_plan = billing
            .customers
            .assign_subscription_plan(customer.id, Uuid::new_v4())
            .await;
        assert!(matches!(missing_plan, Err(AppError::PlanNotFound)));
    }

    #[tokio::test]
    async fn test_yearly_to_monthly_rebuckets() {
        let billing = TestBilling::new();
        let yearly = billing.plan("Annual", 1200.0, BillingCycle::Yearly).await;
        let monthly = billing.plan("Monthly", 100.0, BillingCycle::Monthly).await;
        let customer = billing.customer_on(&yearly, at(2024, 1, 1)).await;

        let assignment = billing
            .customers
            .assign_subscription_plan_at(customer.id, monthly.id, at(2024, 1, 11))
            .await
            .unwrap();

        assert_eq!(assignment.subscription_plan_name, "Monthly");
        assert_eq!(assignment.rescheduled_to, Some(date(2024, 2, 11)));
        assert_eq!(assignment.customer.subscription_changes.len(), 2);
        assert!(billing.schedule.due_on(date(2025, 1, 1)).await.unwrap().is_empty());
        assert_eq!(
            billing.schedule.due_on(date(2024, 2, 11)).await.unwrap(),
            vec![customer.id]
        );
    }

    #[tokio::test]
    async fn test_monthly_to_yearly_rebuckets_too() {
        let billing = TestBilling::new();
        let monthly = billing.plan("Monthly", 100.0, BillingCycle::Monthly).await;
        let yearly = billing.plan("Annual", 1200.0, BillingCycle::Yearly).await;
        let customer = billing.customer_on(&monthly, at(2024, 1, 1)).await;

        let assignment = billing
            .customers
            .assign_subscription_plan_at(customer.id, yearly.id, at(2024, 1, 20))
            .await
            .unwrap();

        assert_eq!(assignment.rescheduled_to, Some(date(2025, 1, 20)));
        assert!(billing.schedule.due_on(date(2024, 2, 1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_cycle_switch_keeps_bucket() {
        let billing = TestBilling::new();
        let basic = billing.plan("Basic", 300.0, BillingCycle::Monthly).await;
        let pro = billing.plan("Pro", 600.0, BillingCycle::Monthly).await;
        let customer = billing.customer_on(&basic, at(2024, 1, 1)).await;

        let assignment = billing
            .customers
            .assign_subscription_plan_at(customer.id, pro.id, at(2024, 1, 16))
            .await
            .unwrap();

        assert_eq!(assignment.rescheduled_to, None);
        assert_eq!(
            billing.schedule.due_on(date(2024, 2, 1)).await.unwrap(),
            vec![customer.id]
        );
    }

    #[tokio::test]
    async fn test_cancel_unschedules_and_reassign_reactivates() {
        let billing = TestBilling::new();
        let basic = billing.plan("Basic", 300.0, BillingCycle::Monthly).await;
        let customer = billing.customer_on(&basic, at(2024, 1, 1)).await;

        let cancelled = billing
            .customers
            .cancel_subscription(customer.id)
            .await
            .unwrap();
        assert_eq!(
            cancelled.current_subscription_status,
            SubscriptionStatus::Cancelled
        );
        assert!(billing.schedule.due_on(date(2024, 2, 1)).await.unwrap().is_empty());
        assert_eq!(
            billing.customers.current_bill_date(customer.id).await.unwrap(),
            None
        );

        // Re-subscribing to the same plan restarts the cycle
        let assignment = billing
            .customers
            .assign_subscription_plan_at(customer.id, basic.id, at(2024, 3, 10))
            .await
            .unwrap();
        assert_eq!(
            assignment.customer.current_subscription_status,
            SubscriptionStatus::Active
        );
        assert_eq!(assignment.customer.subscription_changes.len(), 1);
        assert_eq!(assignment.rescheduled_to, Some(date(2024, 4, 10)));
    }

    #[tokio::test]
    async fn test_delete_customer_frees_email_and_slot() {
        let billing = TestBilling::new();
        let plan = billing.plan("Basic", 300.0, BillingCycle::Monthly).await;
        let customer = billing.customer_on(&plan, at(2024, 1, 1)).await;

        billing.customers.delete_customer(customer.id).await.unwrap();

        assert!(matches!(
            billing.customers.get_customer(customer.id).await,
            Err(AppError::CustomerNotFound)
        ));
        assert!(billing.schedule.due_on(date(2024, 2, 1)).await.unwrap().is_empty());

        // Email can be reused
        billing.customer_on(&plan, at(2024, 1, 2)).await;
    }

    #[tokio::test]
    async fn test_list_invoices_requires_customer() {
        let billing = TestBilling::new();
        let result = billing
            .customers
            .list_invoices(Uuid::new_v4(), None, 10)
            .await;
        assert!(matches!(result, Err(AppError::CustomerNotFound)));
    }
}
