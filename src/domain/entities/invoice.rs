use billing_types::PaymentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub customer_id: Uuid,
    /// Whole currency units.
    pub amount: i64,
    /// Generation instant the invoice was issued at.
    pub due_date: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<DateTime<Utc>>,
    /// Automatic settlement retries performed so far.
    #[serde(default)]
    pub retry_attempts: u32,
}

impl Invoice {
    pub fn issue(customer_id: Uuid, amount: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            amount,
            due_date: now,
            payment_status: PaymentStatus::Pending,
            payment_date: None,
            retry_attempts: 0,
        }
    }

    /// Moves the invoice to `next`, returning false if the transition is not allowed.
    ///
    /// `payment_date` is set when the invoice becomes paid and only then.
    pub fn transition(&mut self, next: PaymentStatus, now: DateTime<Utc>) -> bool {
        if !self.payment_status.can_transition_to(next) {
            return false;
        }
        self.payment_status = next;
        if next == PaymentStatus::Paid {
            self.payment_date = Some(now);
        }
        true
    }

    /// True for invoices the retry job should pick up.
    pub fn awaiting_retry(&self) -> bool {
        match self.payment_status {
            PaymentStatus::Failed => true,
            PaymentStatus::Pending => self.retry_attempts > 0,
            PaymentStatus::Paid => false,
        }
    }
}
