use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::use_cases::{invoice_generation::InvoiceGenerationUseCases, payment::PaymentUseCases};

/// Drains due schedule buckets and retries failed payments until `cancel` fires.
///
/// Both jobs run on the same task, so a generation run and a retry scan never
/// overlap. Work in progress stops at the next item boundary on cancellation.
pub async fn run_billing_loop(
    generator: Arc<InvoiceGenerationUseCases>,
    payments: Arc<PaymentUseCases>,
    generation_poll_secs: u64,
    retry_interval_secs: u64,
    cancel: CancellationToken,
) {
    let mut generation_ticker = interval(Duration::from_secs(generation_poll_secs));
    let mut retry_ticker = interval(Duration::from_secs(retry_interval_secs));
    generation_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    retry_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "Billing worker started (generation every {}s, payment retry every {}s)",
        generation_poll_secs, retry_interval_secs
    );

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Billing worker stopping");
                break;
            }
            _ = generation_ticker.tick() => {
                run_generations(&generator, &cancel).await;
            }
            _ = retry_ticker.tick() => {
                run_retries(&payments, &cancel).await;
            }
        }
    }
}

async fn run_generations(generator: &InvoiceGenerationUseCases, cancel: &CancellationToken) {
    let now = Utc::now();
    match generator
        .run_pending_generations(now.date_naive(), now, cancel)
        .await
    {
        Ok(reports) => {
            for report in reports.iter().filter(|r| !r.cleared) {
                warn!(
                    date = %report.date,
                    failed = report.failed,
                    "Bucket kept for redelivery"
                );
            }
        }
        Err(e) => {
            error!(error = %e, "Failed to run due generations");
        }
    }
}

async fn run_retries(payments: &PaymentUseCases, cancel: &CancellationToken) {
    match payments.retry_failed_payments(cancel).await {
        Ok(report) if report.exhausted > 0 => {
            warn!(
                exhausted = report.exhausted,
                "Invoices reached the retry cap and need manual follow-up"
            );
        }
        Ok(_) => {}
        Err(e) => {
            error!(error = %e, "Failed to scan invoices for payment retry");
        }
    }
}
