use std::sync::Arc;

use async_trait::async_trait;
use billing_types::PaymentStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::settlement::SettlementGateway,
    domain::entities::{invoice::Invoice, payment::Payment},
    use_cases::invoice_generation::InvoiceRepo,
};

/// Invoices fetched per page while scanning for retries.
const RETRY_SCAN_PAGE: usize = 100;

#[async_trait]
pub trait PaymentRepo: Send + Sync {
    async fn insert(&self, payment: &Payment) -> AppResult<()>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Payment>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryReport {
    pub scanned: usize,
    pub attempted: usize,
    pub settled: usize,
    pub still_pending: usize,
    /// Candidates skipped because they hit the retry cap.
    pub exhausted: usize,
}

#[derive(Clone)]
pub struct PaymentUseCases {
    invoices: Arc<dyn InvoiceRepo>,
    payments: Arc<dyn PaymentRepo>,
    gateway: Arc<dyn SettlementGateway>,
    max_retries: u32,
}

impl PaymentUseCases {
    pub fn new(
        invoices: Arc<dyn InvoiceRepo>,
        payments: Arc<dyn PaymentRepo>,
        gateway: Arc<dyn SettlementGateway>,
        max_retries: u32,
    ) -> Self {
        Self {
            invoices,
            payments,
            gateway,
            max_retries,
        }
    }

    pub async fn get_invoice(&self, id: Uuid) -> AppResult<Invoice> {
        self.invoices
            .get_by_id(id)
            .await?
            .ok_or(AppError::InvoiceNotFound)
    }

    pub async fn get_payment(&self, id: Uuid) -> AppResult<Option<Payment>> {
        self.payments.get_by_id(id).await
    }

    pub async fn process_payment(
        &self,
        invoice_id: Uuid,
        amount: i64,
        payment_method: &str,
    ) -> AppResult<Payment> {
        self.process_payment_at(invoice_id, amount, payment_method, Utc::now())
            .await
    }

    /// Records a payment for the full invoice amount and marks it paid.
    #[instrument(skip(self))]
    pub async fn process_payment_at(
        &self,
        invoice_id: Uuid,
        amount: i64,
        payment_method: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Payment> {
        let mut invoice = self.get_invoice(invoice_id).await?;

        if invoice.payment_status == PaymentStatus::Paid {
            return Err(AppError::AlreadyPaid);
        }
        if amount != invoice.amount {
            return Err(AppError::AmountMismatch {
                expected: invoice.amount,
                got: amount,
            });
        }
        let payment_method = payment_method.trim();
        if payment_method.is_empty() {
            return Err(AppError::InvalidInput("Payment method is required".into()));
        }

        // A failed invoice goes back through pending before it can be paid
        if invoice.payment_status == PaymentStatus::Failed {
            invoice.transition(PaymentStatus::Pending, now);
        }
        if !invoice.transition(PaymentStatus::Paid, now) {
            return Err(AppError::Internal(format!(
                "invoice {} cannot be paid from {}",
                invoice.id, invoice.payment_status
            )));
        }

        let payment = Payment {
            id: Uuid::new_v4(),
            invoice_id,
            amount,
            payment_method: payment_method.to_string(),
            payment_date: now,
        };
        self.payments.insert(&payment).await?;
        self.invoices.update(&invoice).await?;

        info!(%invoice_id, payment_id = %payment.id, amount, "payment processed");
        Ok(payment)
    }

    /// External failure signal for a pending invoice.
    #[instrument(skip(self))]
    pub async fn mark_payment_failed(&self, invoice_id: Uuid) -> AppResult<Invoice> {
        let mut invoice = self.get_invoice(invoice_id).await?;
        match invoice.payment_status {
            PaymentStatus::Paid => Err(AppError::AlreadyPaid),
            PaymentStatus::Failed => Ok(invoice),
            PaymentStatus::Pending => {
                invoice.transition(PaymentStatus::Failed, Utc::now());
                self.invoices.update(&invoice).await?;
                warn!(%invoice_id, "invoice payment failed");
                Ok(invoice)
            }
        }
    }

    pub async fn retry_failed_payments(&self, cancel: &CancellationToken) -> AppResult<RetryReport> {
        self.retry_failed_payments_at(Utc::now(), cancel).await
    }

    /// Scans every invoice and retries settlement of the failed ones.
    ///
    /// Per-invoice errors are logged and leave the invoice pending for the
    /// next run. Invoices that used up `max_retries` are only counted.
    #[instrument(skip(self, cancel))]
    pub async fn retry_failed_payments_at(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> AppResult<RetryReport> {
        let mut report = RetryReport::default();
        let mut cursor: Option<String> = None;

        'pages: loop {
            let page = self
                .invoices
                .list_page(cursor.as_deref(), RETRY_SCAN_PAGE)
                .await?;

            for invoice in page.invoices {
                if cancel.is_cancelled() {
                    warn!("payment retry cancelled");
                    break 'pages;
                }
                report.scanned += 1;

                if !invoice.awaiting_retry() {
                    continue;
                }
                if invoice.retry_attempts >= self.max_retries {
                    debug!(invoice_id = %invoice.id, attempts = invoice.retry_attempts, "retry cap reached");
                    report.exhausted += 1;
                    continue;
                }

                report.attempted += 1;
                let invoice_id = invoice.id;
                match self.retry_one(invoice, now).await {
                    Ok(true) => report.settled += 1,
                    Ok(false) => report.still_pending += 1,
                    Err(e) => {
                        error!(%invoice_id, error = %e, "payment retry failed");
                        report.still_pending += 1;
                    }
                }
            }

            match page.cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(
            scanned = report.scanned,
            attempted = report.attempted,
            settled = report.settled,
            still_pending = report.still_pending,
            exhausted = report.exhausted,
            "payment retry finished"
        );
        Ok(report)
    }

    /// Returns true when the invoice ended up paid.
    async fn retry_one(&self, mut invoice: Invoice, now: DateTime<Utc>) -> AppResult<bool> {
        invoice.retry_attempts += 1;
        if invoice.payment_status == PaymentStatus::Failed {
            invoice.transition(PaymentStatus::Pending, now);
        }
        self.invoices.update(&invoice).await?;

        let receipt = match self.gateway.settle(&invoice).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(
                    invoice_id = %invoice.id,
                    attempt = invoice.retry_attempts,
                    error = %e,
                    "settlement failed, invoice left pending"
                );
                return Ok(false);
            }
        };

        let payment = Payment {
            id: Uuid::new_v4(),
            invoice_id: invoice.id,
            amount: invoice.amount,
            payment_method: receipt.payment_method,
            payment_date: now,
        };
        self.payments.insert(&payment).await?;
        invoice.transition(PaymentStatus::Paid, now);
        self.invoices.update(&invoice).await?;

        info!(
            invoice_id = %invoice.id,
            reference = %receipt.reference,
            attempt = invoice.retry_attempts,
            "invoice settled on retry"
        );
        Ok(true)
    }
}
