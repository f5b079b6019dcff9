use async_trait::async_trait;

use crate::{app_error::AppResult, domain::entities::invoice::Invoice};

/// Outcome of a successful settlement attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementReceipt {
    /// Provider-side reference for the charge.
    pub reference: String,
    pub payment_method: String,
}

/// Payment gateway used by the retry job to collect an outstanding invoice.
#[async_trait]
pub trait SettlementGateway: Send + Sync {
    async fn settle(&self, invoice: &Invoice) -> AppResult<SettlementReceipt>;
}
