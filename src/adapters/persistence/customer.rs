use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::{KvPersistence, keys},
    app_error::AppResult,
    domain::entities::customer::Customer,
    use_cases::customer::CustomerRepo,
};

#[async_trait]
impl CustomerRepo for KvPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Customer>> {
        self.get_json(&keys::customer(id)).await
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        Ok(self.store.get(&keys::customer_email(email)).await?.is_some())
    }

    async fn insert(&self, customer: &Customer) -> AppResult<()> {
        self.put_json(&keys::customer(customer.id), customer).await?;
        self.store
            .put(&keys::customer_email(&customer.email), &customer.id.to_string())
            .await
    }

    async fn update(&self, customer: &Customer) -> AppResult<()> {
        self.put_json(&keys::customer(customer.id), customer).await
    }

    async fn delete(&self, customer: &Customer) -> AppResult<()> {
        self.store.delete(&keys::customer(customer.id)).await?;
        self.store
            .delete(&keys::customer_email(&customer.email))
            .await
    }
}
