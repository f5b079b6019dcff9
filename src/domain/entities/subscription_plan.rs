use billing_types::BillingCycle;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    pub id: Uuid,
    pub name: String,
    /// Price for one full billing cycle, in whole currency units.
    pub price: f64,
    pub billing_cycle: BillingCycle,
}
