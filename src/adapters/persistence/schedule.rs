use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;
use uuid::Uuid;

use crate::{
    adapters::persistence::{KvPersistence, keys},
    app_error::{AppError, AppResult},
    use_cases::schedule::ScheduleRepo,
};

#[async_trait]
impl ScheduleRepo for KvPersistence {
    async fn load_bucket(&self, date: NaiveDate) -> AppResult<Vec<Uuid>> {
        Ok(self
            .get_json(&keys::bucket(self.key_format, date))
            .await?
            .unwrap_or_default())
    }

    async fn store_bucket(&self, date: NaiveDate, customer_ids: &[Uuid]) -> AppResult<()> {
        self.put_json(&keys::bucket(self.key_format, date), &customer_ids)
            .await
    }

    async fn delete_bucket(&self, date: NaiveDate) -> AppResult<()> {
        self.store
            .delete(&keys::bucket(self.key_format, date))
            .await
    }

    async fn list_bucket_dates(&self) -> AppResult<Vec<NaiveDate>> {
        let mut dates = Vec::new();
        for key in self.list_all(keys::BUCKET_PREFIX).await? {
            let raw = &key[keys::BUCKET_PREFIX.len()..];
            match self.key_format.parse(raw) {
                Some(date) => dates.push(date),
                None => warn!(
                    key = %key,
                    format = %self.key_format,
                    "bucket key in another date format skipped"
                ),
            }
        }
        // Legacy keys do not sort chronologically
        dates.sort();
        Ok(dates)
    }

    async fn get_active_bill_date(&self, customer_id: Uuid) -> AppResult<Option<NaiveDate>> {
        let key = keys::active_bill_date(customer_id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };
        self.key_format
            .parse(&raw)
            .map(Some)
            .ok_or_else(|| AppError::Internal(format!("unreadable bill date at {key}: {raw}")))
    }

    async fn set_active_bill_date(&self, customer_id: Uuid, date: NaiveDate) -> AppResult<()> {
        self.store
            .put(
                &keys::active_bill_date(customer_id),
                &self.key_format.format(date),
            )
            .await
    }

    async fn clear_active_bill_date(&self, customer_id: Uuid) -> AppResult<()> {
        self.store
            .delete(&keys::active_bill_date(customer_id))
            .await
    }
}
