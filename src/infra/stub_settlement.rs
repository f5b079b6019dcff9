use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    application::ports::settlement::{SettlementGateway, SettlementReceipt},
    domain::entities::invoice::Invoice,
};

/// Payment method recorded for invoices collected by the retry job.
pub const AUTO_RETRY_METHOD: &str = "auto_retry";

/// Settlement gateway that accepts every charge without calling out.
///
/// Stands in for a real provider until one is wired up.
#[derive(Clone, Default)]
pub struct StubSettlementGateway;

impl StubSettlementGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SettlementGateway for StubSettlementGateway {
    async fn settle(&self, invoice: &Invoice) -> AppResult<SettlementReceipt> {
        let reference = format!("stub_settle_{}", Uuid::new_v4());
        debug!(invoice_id = %invoice.id, amount = invoice.amount, %reference, "stub settlement");
        Ok(SettlementReceipt {
            reference,
            payment_method: AUTO_RETRY_METHOD.to_string(),
        })
    }
}
