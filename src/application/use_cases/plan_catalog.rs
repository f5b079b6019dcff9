use std::sync::Arc;

use async_trait::async_trait;
use billing_types::BillingCycle;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::validators::{is_valid_plan_name, is_valid_price},
    domain::entities::subscription_plan::SubscriptionPlan,
};

#[async_trait]
pub trait PlanRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionPlan>>;
    async fn name_exists(&self, name: &str) -> AppResult<bool>;
    /// Stores the plan and claims its name.
    async fn insert(&self, plan: &SubscriptionPlan) -> AppResult<()>;
    /// Overwrites the plan, moving the name claim when the name changed.
    async fn update(&self, previous_name: &str, plan: &SubscriptionPlan) -> AppResult<()>;
    async fn delete(&self, plan: &SubscriptionPlan) -> AppResult<()>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanInput {
    pub name: String,
    pub price: f64,
    pub billing_cycle: BillingCycle,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanInput {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub billing_cycle: Option<BillingCycle>,
}

#[derive(Clone)]
pub struct PlanCatalogUseCases {
    repo: Arc<dyn PlanRepo>,
}

impl PlanCatalogUseCases {
    pub fn new(repo: Arc<dyn PlanRepo>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn create_plan(&self, input: CreatePlanInput) -> AppResult<SubscriptionPlan> {
        let name = input.name.trim().to_string();
        validate(&name, input.price)?;

        if self.repo.name_exists(&name).await? {
            return Err(AppError::PlanNameTaken);
        }

        let plan = SubscriptionPlan {
            id: Uuid::new_v4(),
            name,
            price: input.price,
            billing_cycle: input.billing_cycle,
        };
        self.repo.insert(&plan).await?;

        info!(plan_id = %plan.id, name = %plan.name, cycle = %plan.billing_cycle, "plan created");
        Ok(plan)
    }

    pub async fn get_plan(&self, id: Uuid) -> AppResult<SubscriptionPlan> {
        self.repo.get_by_id(id).await?.ok_or(AppError::PlanNotFound)
    }

    /// Applies an explicit plan edit. Ledger entries keep referencing the plan
    /// by id, so a price change affects every future proration.
    ///
    /// A cycle edit does not touch existing subscribers: their ledger entries
    /// keep the cycle they were recorded with, which still drives proration
    /// and their current bill date. The new cycle applies from each
    /// subscriber's next generation on.
    #[instrument(skip(self))]
    pub async fn update_plan(&self, id: Uuid, input: UpdatePlanInput) -> AppResult<SubscriptionPlan> {
        let existing = self.get_plan(id).await?;

        let name = input
            .name
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| existing.name.clone());
        let price = input.price.unwrap_or(existing.price);
        validate(&name, price)?;

        if name != existing.name && self.repo.name_exists(&name).await? {
            return Err(AppError::PlanNameTaken);
        }

        let updated = SubscriptionPlan {
            id,
            name,
            price,
            billing_cycle: input.billing_cycle.unwrap_or(existing.billing_cycle),
        };
        self.repo.update(&existing.name, &updated).await?;

        info!(plan_id = %id, "plan updated");
        Ok(updated)
    }

    /// Deletes the plan. Customers referencing it are left untouched.
    #[instrument(skip(self))]
    pub async fn delete_plan(&self, id: Uuid) -> AppResult<()> {
        let plan = self.get_plan(id).await?;
        self.repo.delete(&plan).await?;
        info!(plan_id = %id, "plan deleted");
        Ok(())
    }
}

fn validate(name: &str, price: f64) -> AppResult<()> {
    if !is_valid_plan_name(name) {
        return Err(AppError::InvalidInput("Invalid plan name".into()));
    }
    if !is_valid_price(price) {
        return Err(AppError::InvalidInput(
            "Price must be a non-negative number".into(),
        ));
    }
    Ok(())
}
