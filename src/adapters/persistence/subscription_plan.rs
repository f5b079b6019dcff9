use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::{KvPersistence, keys},
    app_error::AppResult,
    domain::entities::subscription_plan::SubscriptionPlan,
    use_cases::plan_catalog::PlanRepo,
};

#[async_trait]
impl PlanRepo for KvPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionPlan>> {
        self.get_json(&keys::plan(id)).await
    }

    async fn name_exists(&self, name: &str) -> AppResult<bool> {
        Ok(self.store.get(&keys::plan_name(name)).await?.is_some())
    }

    async fn insert(&self, plan: &SubscriptionPlan) -> AppResult<()> {
        self.put_json(&keys::plan(plan.id), plan).await?;
        self.store
            .put(&keys::plan_name(&plan.name), &plan.id.to_string())
            .await
    }

    async fn update(&self, previous_name: &str, plan: &SubscriptionPlan) -> AppResult<()> {
        self.put_json(&keys::plan(plan.id), plan).await?;
        if previous_name != plan.name {
            self.store
                .put(&keys::plan_name(&plan.name), &plan.id.to_string())
                .await?;
            self.store.delete(&keys::plan_name(previous_name)).await?;
        }
        Ok(())
    }

    async fn delete(&self, plan: &SubscriptionPlan) -> AppResult<()> {
        self.store.delete(&keys::plan(plan.id)).await?;
        self.store.delete(&keys::plan_name(&plan.name)).await
    }
}
