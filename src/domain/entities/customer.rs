use billing_types::{BillingCycle, SubscriptionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry of the subscription ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionChange {
    pub subscription_plan_id: Uuid,
    pub change_date: DateTime<Utc>,
    pub billing_cycle: BillingCycle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub current_subscription_plan_id: Uuid,
    pub current_subscription_status: SubscriptionStatus,
    /// Plan changes since the last invoice generation, oldest first. Never empty.
    pub subscription_changes: Vec<SubscriptionChange>,
    /// Instant of the last invoice generation.
    #[serde(default)]
    pub last_generated_at: Option<DateTime<Utc>>,
}

impl Customer {
    /// The ledger entry describing the active plan.
    pub fn current_change(&self) -> Option<&SubscriptionChange> {
        self.subscription_changes.last()
    }

    pub fn current_cycle(&self) -> Option<BillingCycle> {
        self.current_change().map(|c| c.billing_cycle)
    }

    /// Appends a plan change and makes it the current plan.
    ///
    /// The ledger stays chronologically non-decreasing: a change dated before
    /// the last entry is recorded at the last entry's date. Returns the entry
    /// that was appended.
    pub fn record_plan_change(
        &mut self,
        plan_id: Uuid,
        cycle: BillingCycle,
        at: DateTime<Utc>,
    ) -> SubscriptionChange {
        let change_date = match self.current_change() {
            Some(last) if last.change_date > at => last.change_date,
            _ => at,
        };
        let change = SubscriptionChange {
            subscription_plan_id: plan_id,
            change_date,
            billing_cycle: cycle,
        };
        self.subscription_changes.push(change.clone());
        self.current_subscription_plan_id = plan_id;
        change
    }

    /// Replaces the ledger with a single entry for the given plan.
    pub fn reset_ledger(&mut self, plan_id: Uuid, cycle: BillingCycle, at: DateTime<Utc>) {
        self.subscription_changes = vec![SubscriptionChange {
            subscription_plan_id: plan_id,
            change_date: at,
            billing_cycle: cycle,
        }];
        self.current_subscription_plan_id = plan_id;
    }

    /// Returns true if an invoice was already generated on the same UTC date as `now`.
    pub fn generated_on_same_day(&self, now: DateTime<Utc>) -> bool {
        self.last_generated_at
            .is_some_and(|at| at.date_naive() == now.date_naive())
    }
}
