use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::app_error::AppResult;

/// Raw bucket storage behind the generation schedule index.
///
/// One bucket per calendar date, each holding customer ids, plus a pointer
/// per customer to the bucket they currently sit in.
#[async_trait]
pub trait ScheduleRepo: Send + Sync {
    async fn load_bucket(&self, date: NaiveDate) -> AppResult<Vec<Uuid>>;
    async fn store_bucket(&self, date: NaiveDate, customer_ids: &[Uuid]) -> AppResult<()>;
    async fn delete_bucket(&self, date: NaiveDate) -> AppResult<()>;
    /// Every date that currently has a bucket, in ascending order.
    async fn list_bucket_dates(&self) -> AppResult<Vec<NaiveDate>>;
    async fn get_active_bill_date(&self, customer_id: Uuid) -> AppResult<Option<NaiveDate>>;
    async fn set_active_bill_date(&self, customer_id: Uuid, date: NaiveDate) -> AppResult<()>;
    async fn clear_active_bill_date(&self, customer_id: Uuid) -> AppResult<()>;
}

/// Date-bucketed index of customers whose next invoice is due.
///
/// A customer sits in at most one bucket and a bucket key is never left
/// empty. The store has no multi-key transactions, so `reschedule` commits
/// the removal before the insertion starts.
#[derive(Clone)]
pub struct GenerationSchedule {
    repo: Arc<dyn ScheduleRepo>,
}

impl GenerationSchedule {
    pub fn new(repo: Arc<dyn ScheduleRepo>) -> Self {
        Self { repo }
    }

    /// Adds the customer to the `date` bucket, then points them at it.
    #[instrument(skip(self))]
    pub async fn schedule(&self, customer_id: Uuid, date: NaiveDate) -> AppResult<()> {
        let mut bucket = self.repo.load_bucket(date).await?;
        if !bucket.contains(&customer_id) {
            bucket.push(customer_id);
            self.repo.store_bucket(date, &bucket).await?;
        }
        self.repo.set_active_bill_date(customer_id, date).await?;
        debug!(%customer_id, %date, "customer scheduled");
        Ok(())
    }

    /// Removes the customer from the `date` bucket.
    ///
    /// The pointer goes first: a member left without a pointer is still
    /// billed, a pointer left without its bucket entry is not.
    #[instrument(skip(self))]
    pub async fn unschedule(&self, customer_id: Uuid, date: NaiveDate) -> AppResult<()> {
        if self.repo.get_active_bill_date(customer_id).await? == Some(date) {
            self.repo.clear_active_bill_date(customer_id).await?;
        }

        let mut bucket = self.repo.load_bucket(date).await?;
        let before = bucket.len();
        bucket.retain(|id| *id != customer_id);

        if bucket.is_empty() {
            self.repo.delete_bucket(date).await?;
        } else if bucket.len() != before {
            self.repo.store_bucket(date, &bucket).await?;
        }

        debug!(%customer_id, %date, "customer unscheduled");
        Ok(())
    }

    /// Moves a customer between buckets.
    #[instrument(skip(self))]
    pub async fn reschedule(
        &self,
        customer_id: Uuid,
        old_date: NaiveDate,
        new_date: NaiveDate,
    ) -> AppResult<()> {
        if old_date == new_date {
            return self.schedule(customer_id, new_date).await;
        }
        self.unschedule(customer_id, old_date).await?;
        self.schedule(customer_id, new_date).await
    }

    /// Moves the customer from wherever the pointer says to `new_date`.
    pub async fn move_to(&self, customer_id: Uuid, new_date: NaiveDate) -> AppResult<()> {
        match self.repo.get_active_bill_date(customer_id).await? {
            Some(old_date) => self.reschedule(customer_id, old_date, new_date).await,
            None => self.schedule(customer_id, new_date).await,
        }
    }

    /// Removes the customer from the bucket the pointer names, if any.
    pub async fn unschedule_current(&self, customer_id: Uuid) -> AppResult<Option<NaiveDate>> {
        let current = self.repo.get_active_bill_date(customer_id).await?;
        if let Some(date) = current {
            self.unschedule(customer_id, date).await?;
        }
        Ok(current)
    }

    /// Members of the bucket for `date`. The bucket is left in place.
    pub async fn due_on(&self, date: NaiveDate) -> AppResult<Vec<Uuid>> {
        self.repo.load_bucket(date).await
    }

    pub async fn clear(&self, date: NaiveDate) -> AppResult<()> {
        self.repo.delete_bucket(date).await
    }

    pub async fn active_bill_date(&self, customer_id: Uuid) -> AppResult<Option<NaiveDate>> {
        self.repo.get_active_bill_date(customer_id).await
    }

    /// Bucket dates up to and including `up_to`, oldest first.
    pub async fn pending_dates(&self, up_to: NaiveDate) -> AppResult<Vec<NaiveDate>> {
        let mut dates: Vec<NaiveDate> = self
            .repo
            .list_bucket_dates()
            .await?
            .into_iter()
            .filter(|d| *d <= up_to)
            .collect();
        dates.sort();
        Ok(dates)
    }
}
