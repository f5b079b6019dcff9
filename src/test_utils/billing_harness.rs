//! `TestBilling` wires every use case over an in-memory store.

use std::sync::Arc;

use billing_types::BillingCycle;
use chrono::{DateTime, Utc};

use crate::{
    adapters::persistence::KvPersistence,
    application::ports::{kv_store::KvStore, settlement::SettlementGateway},
    domain::entities::{
        customer::Customer, date_key::DateKeyFormat, subscription_plan::SubscriptionPlan,
    },
    infra::{
        memory_store::MemoryKvStore, setup::BillingServices,
        stub_settlement::StubSettlementGateway,
    },
    test_utils::FlakyKvStore,
    use_cases::{
        customer::{CreateCustomerInput, CustomerUseCases},
        invoice_generation::InvoiceGenerationUseCases,
        payment::PaymentUseCases,
        plan_catalog::{CreatePlanInput, PlanCatalogUseCases},
        schedule::GenerationSchedule,
    },
};

const DEFAULT_MAX_RETRIES: u32 = 5;

pub struct TestBilling {
    pub store: Arc<dyn KvStore>,
    pub plans: Arc<PlanCatalogUseCases>,
    pub customers: Arc<CustomerUseCases>,
    pub generator: Arc<InvoiceGenerationUseCases>,
    pub payments: Arc<PaymentUseCases>,
    pub schedule: GenerationSchedule,
    flaky: Option<Arc<FlakyKvStore>>,
}

impl TestBilling {
    pub fn new() -> Self {
        Self::with_key_format(DateKeyFormat::Iso)
    }

    pub fn with_key_format(key_format: DateKeyFormat) -> Self {
        Self::build(
            Arc::new(MemoryKvStore::new()),
            key_format,
            Arc::new(StubSettlementGateway::new()),
            DEFAULT_MAX_RETRIES,
            None,
        )
    }

    pub fn with_flaky_store() -> Self {
        let flaky = Arc::new(FlakyKvStore::new());
        Self::build(
            flaky.clone(),
            DateKeyFormat::Iso,
            Arc::new(StubSettlementGateway::new()),
            DEFAULT_MAX_RETRIES,
            Some(flaky),
        )
    }

    pub fn with_gateway(gateway: Arc<dyn SettlementGateway>, max_retries: u32) -> Self {
        Self::build(
            Arc::new(MemoryKvStore::new()),
            DateKeyFormat::Iso,
            gateway,
            max_retries,
            None,
        )
    }

    fn build(
        store: Arc<dyn KvStore>,
        key_format: DateKeyFormat,
        gateway: Arc<dyn SettlementGateway>,
        max_retries: u32,
        flaky: Option<Arc<FlakyKvStore>>,
    ) -> Self {
        let persistence = Arc::new(KvPersistence::new(store.clone(), key_format));
        let services = BillingServices::new(persistence, gateway, max_retries);
        Self {
            store,
            plans: services.plans,
            customers: services.customers,
            generator: services.generator,
            payments: services.payments,
            schedule: services.schedule,
            flaky,
        }
    }

    /// The flaky store. Panics unless built with `with_flaky_store`.
    pub fn flaky(&self) -> &FlakyKvStore {
        self.flaky.as_deref().expect("built without a flaky store")
    }

    pub async fn plan(&self, name: &str, price: f64, cycle: BillingCycle) -> SubscriptionPlan {
        self.plans
            .create_plan(CreatePlanInput {
                name: name.to_string(),
                price,
                billing_cycle: cycle,
            })
            .await
            .unwrap()
    }

    /// Signs up `customer@example.com` on `plan` at `when`.
    pub async fn customer_on(&self, plan: &SubscriptionPlan, when: DateTime<Utc>) -> Customer {
        self.customer_with_email(plan, "customer@example.com", when)
            .await
    }

    pub async fn customer_with_email(
        &self,
        plan: &SubscriptionPlan,
        email: &str,
        when: DateTime<Utc>,
    ) -> Customer {
        self.customers
            .create_customer_at(
                CreateCustomerInput {
                    name: "Customer".to_string(),
                    email: email.to_string(),
                    subscription_plan_id: plan.id,
                },
                when,
            )
            .await
            .unwrap()
    }

    /// Raw stored value under `key`.
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.store.get(key).await.unwrap()
    }

    /// Raw stored values of every key under `prefix`.
    pub async fn raw_prefix(&self, prefix: &str) -> Vec<String> {
        let page = self.store.list(prefix, None, 1000).await.unwrap();
        let mut values = Vec::with_capacity(page.keys.len());
        for key in page.keys {
            if let Some(value) = self.store.get(&key).await.unwrap() {
                values.push(value);
            }
        }
        values
    }
}
