use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::billing_math::{due_date, prorate},
    domain::entities::{customer::Customer, invoice::Invoice, subscription_plan::SubscriptionPlan},
    use_cases::{customer::CustomerRepo, plan_catalog::PlanRepo, schedule::GenerationSchedule},
};

#[async_trait]
pub trait InvoiceRepo: Send + Sync {
    /// Stores the invoice and indexes it under its customer.
    async fn insert(&self, invoice: &Invoice) -> AppResult<()>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Invoice>>;
    async fn update(&self, invoice: &Invoice) -> AppResult<()>;
    /// Invoices of one customer ordered by issue instant.
    async fn list_by_customer(
        &self,
        customer_id: Uuid,
        cursor: Option<&str>,
        limit: usize,
    ) -> AppResult<InvoicePage>;
    /// Every stored invoice, in key order.
    async fn list_page(&self, cursor: Option<&str>, limit: usize) -> AppResult<InvoicePage>;
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePage {
    pub invoices: Vec<Invoice>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRunReport {
    pub date: NaiveDate,
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// True when the bucket was removed at the end of the run.
    pub cleared: bool,
}

enum MemberOutcome {
    Generated,
    Skipped,
}

#[derive(Clone)]
pub struct InvoiceGenerationUseCases {
    customers: Arc<dyn CustomerRepo>,
    plans: Arc<dyn PlanRepo>,
    invoices: Arc<dyn InvoiceRepo>,
    schedule: GenerationSchedule,
}

impl InvoiceGenerationUseCases {
    pub fn new(
        customers: Arc<dyn CustomerRepo>,
        plans: Arc<dyn PlanRepo>,
        invoices: Arc<dyn InvoiceRepo>,
        schedule: GenerationSchedule,
    ) -> Self {
        Self {
            customers,
            plans,
            invoices,
            schedule,
        }
    }

    pub async fn generate_invoice(&self, customer_id: Uuid) -> AppResult<Invoice> {
        self.generate_invoice_at(customer_id, Utc::now()).await
    }

    /// Bills the customer's ledger and starts the next cycle.
    ///
    /// The steps are not atomic. A crash after the customer is persisted but
    /// before the schedule moves is repaired by the next bucket run.
    #[instrument(skip(self))]
    pub async fn generate_invoice_at(
        &self,
        customer_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Invoice> {
        let mut customer = self
            .customers
            .get_by_id(customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        if !customer.current_subscription_status.is_active() {
            return Err(AppError::SubscriptionCancelled);
        }
        if customer.generated_on_same_day(now) {
            return Err(AppError::AlreadyGenerated);
        }

        let plans = self.load_ledger_plans(&customer).await?;
        let breakdown = prorate(&customer.subscription_changes, &plans)?;
        for period in &breakdown.periods {
            debug!(
                plan_id = %period.plan_id,
                start = %period.start,
                end = %period.end,
                days = period.days,
                charge = period.charge,
                "prorated period"
            );
        }

        let plan = plans
            .get(&customer.current_subscription_plan_id)
            .cloned()
            .ok_or(AppError::PlanNotFound)?;

        let invoice = Invoice::issue(customer.id, breakdown.total, now);
        self.invoices.insert(&invoice).await?;

        let next_start = now
            .checked_add_days(Days::new(1))
            .ok_or_else(|| AppError::Internal("generation instant out of range".into()))?;
        customer.reset_ledger(plan.id, plan.billing_cycle, next_start);
        customer.last_generated_at = Some(now);
        self.customers.update(&customer).await?;

        let next_bill_date = next_bill_date(&customer)?;
        self.schedule.move_to(customer.id, next_bill_date).await?;

        info!(
            %customer_id,
            invoice_id = %invoice.id,
            amount = invoice.amount,
            %next_bill_date,
            "invoice generated"
        );
        Ok(invoice)
    }

    /// Generates invoices for every member of the `date` bucket.
    ///
    /// Members that succeed are moved to their next bucket as they go. The
    /// bucket is cleared only when no member failed, so a rerun sees just the
    /// members that failed.
    #[instrument(skip(self, cancel))]
    pub async fn run_due_generations(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> AppResult<GenerationRunReport> {
        let members = self.schedule.due_on(date).await?;
        let mut report = GenerationRunReport {
            date,
            generated: 0,
            skipped: 0,
            failed: 0,
            cleared: false,
        };

        if members.is_empty() {
            return Ok(report);
        }

        info!(%date, members = members.len(), "running due generations");

        for customer_id in members {
            if cancel.is_cancelled() {
                warn!(%date, "generation run cancelled, bucket kept");
                return Ok(report);
            }

            match self.process_member(customer_id, date, now).await {
                Ok(MemberOutcome::Generated) => report.generated += 1,
                Ok(MemberOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    error!(%customer_id, %date, error = %e, "invoice generation failed");
                    report.failed += 1;
                }
            }
        }

        if report.failed == 0 {
            self.schedule.clear(date).await?;
            report.cleared = true;
        }

        info!(
            %date,
            generated = report.generated,
            skipped = report.skipped,
            failed = report.failed,
            cleared = report.cleared,
            "generation run finished"
        );
        Ok(report)
    }

    /// Drains every bucket dated up to `today`, oldest first.
    pub async fn run_pending_generations(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<GenerationRunReport>> {
        let mut reports = Vec::new();
        for date in self.schedule.pending_dates(today).await? {
            if cancel.is_cancelled() {
                break;
            }
            reports.push(self.run_due_generations(date, now, cancel).await?);
        }
        Ok(reports)
    }

    async fn process_member(
        &self,
        customer_id: Uuid,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<MemberOutcome> {
        // An earlier delivery already moved this customer on. A missing
        // pointer means its write failed, and generation restores it.
        match self.schedule.active_bill_date(customer_id).await? {
            Some(current) if current != date => {
                debug!(%customer_id, %date, %current, "stale bucket member skipped");
                return Ok(MemberOutcome::Skipped);
            }
            Some(_) => {}
            None => warn!(%customer_id, %date, "bucket member has no bill date pointer"),
        }

        let Some(customer) = self.customers.get_by_id(customer_id).await? else {
            self.schedule.unschedule(customer_id, date).await?;
            return Ok(MemberOutcome::Skipped);
        };

        if !customer.current_subscription_status.is_active() {
            self.schedule.unschedule(customer_id, date).await?;
            return Ok(MemberOutcome::Skipped);
        }

        // Invoice written but the schedule never moved
        if customer
            .last_generated_at
            .is_some_and(|at| at.date_naive() >= date)
        {
            let next = next_bill_date(&customer)?;
            self.schedule.move_to(customer_id, next).await?;
            info!(%customer_id, %next, "resumed interrupted generation");
            return Ok(MemberOutcome::Skipped);
        }

        self.generate_invoice_at(customer_id, now).await?;
        Ok(MemberOutcome::Generated)
    }

    async fn load_ledger_plans(
        &self,
        customer: &Customer,
    ) -> AppResult<HashMap<Uuid, SubscriptionPlan>> {
        let mut plans = HashMap::new();
        let ids = customer
            .subscription_changes
            .iter()
            .map(|c| c.subscription_plan_id)
            .chain(std::iter::once(customer.current_subscription_plan_id));

        for id in ids {
            if plans.contains_key(&id) {
                continue;
            }
            let plan = self
                .plans
                .get_by_id(id)
                .await?
                .ok_or(AppError::PlanNotFound)?;
            plans.insert(id, plan);
        }
        Ok(plans)
    }
}

fn next_bill_date(customer: &Customer) -> AppResult<NaiveDate> {
    let current = customer
        .current_change()
        .ok_or_else(|| AppError::Internal("subscription ledger is empty".into()))?;
    Ok(due_date(current.change_date, current.billing_cycle).date_naive())
}
