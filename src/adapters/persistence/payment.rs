use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::{KvPersistence, keys},
    app_error::AppResult,
    domain::entities::payment::Payment,
    use_cases::payment::PaymentRepo,
};

#[async_trait]
impl PaymentRepo for KvPersistence {
    async fn insert(&self, payment: &Payment) -> AppResult<()> {
        self.put_json(&keys::payment(payment.id), payment).await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Payment>> {
        self.get_json(&keys::payment(id)).await
    }
}
