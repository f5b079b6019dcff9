//! Due-date projection and proration over a subscription ledger.
//!
//! Everything here is pure: plans are looked up in a map the caller loads
//! beforehand, and "now" never enters the arithmetic.

use std::collections::HashMap;

use billing_types::BillingCycle;
use chrono::{DateTime, Months, Utc};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{customer::SubscriptionChange, subscription_plan::SubscriptionPlan},
};

/// Proration denominator for monthly plans. Not calendar-exact.
pub const MONTHLY_CYCLE_DAYS: i64 = 30;
/// Proration denominator for yearly plans. Not calendar-exact.
pub const YEARLY_CYCLE_DAYS: i64 = 365;

/// Projects the next due date one calendar month or year after `change_date`.
///
/// Month-end overflow clamps to the last valid day (Jan 31 + 1 month is
/// Feb 29 in a leap year), so the result is always a real date.
pub fn due_date(change_date: DateTime<Utc>, cycle: BillingCycle) -> DateTime<Utc> {
    let months = match cycle {
        BillingCycle::Monthly => Months::new(1),
        BillingCycle::Yearly => Months::new(12),
    };
    change_date
        .checked_add_months(months)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub fn days_in_cycle(cycle: BillingCycle) -> i64 {
    match cycle {
        BillingCycle::Monthly => MONTHLY_CYCLE_DAYS,
        BillingCycle::Yearly => YEARLY_CYCLE_DAYS,
    }
}

/// Whole days between the UTC calendar dates of `start` and `end`.
///
/// Both instants are normalized to midnight first, so time of day never
/// produces partial days.
pub fn whole_days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end.date_naive() - start.date_naive()).num_days()
}

/// One priced sub-period of a ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct ProratedPeriod {
    pub plan_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub days: i64,
    /// Unrounded charge for the period.
    pub charge: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProrationBreakdown {
    pub periods: Vec<ProratedPeriod>,
    /// Sum of all periods rounded to a whole currency unit.
    pub total: i64,
}

/// End of the last ledger period.
///
/// The period is anchored at the latest entry that switched billing cycle
/// relative to the entry before it, or at the first entry when none did, and
/// runs one anchor cycle from there. A cycle switch reschedules the customer
/// to that same date, so the charged period always ends on the bill date.
pub fn cycle_end(ledger: &[SubscriptionChange]) -> Option<DateTime<Utc>> {
    let anchor = ledger
        .windows(2)
        .rev()
        .find(|pair| pair[0].billing_cycle != pair[1].billing_cycle)
        .map(|pair| &pair[1])
        .or_else(|| ledger.first())?;

    Some(due_date(anchor.change_date, anchor.billing_cycle))
}

/// Prices every period of the ledger.
///
/// A single-entry ledger is charged the plan price as is. Otherwise each
/// entry is charged `price / days_in_cycle * days` for the days it was
/// active, and the sum is rounded once (half away from zero). The divisor
/// comes from the cycle recorded on the entry, not the plan's current one.
pub fn prorate(
    ledger: &[SubscriptionChange],
    plans: &HashMap<Uuid, SubscriptionPlan>,
) -> AppResult<ProrationBreakdown> {
    let end_of_cycle =
        cycle_end(ledger).ok_or_else(|| AppError::Internal("subscription ledger is empty".into()))?;

    if let [only] = ledger {
        let plan = plans
            .get(&only.subscription_plan_id)
            .ok_or(AppError::PlanNotFound)?;
        return Ok(ProrationBreakdown {
            periods: vec![ProratedPeriod {
                plan_id: plan.id,
                start: only.change_date,
                end: end_of_cycle,
                days: whole_days_between(only.change_date, end_of_cycle),
                charge: plan.price,
            }],
            total: plan.price.round() as i64,
        });
    }

    let mut periods = Vec::with_capacity(ledger.len());
    let mut sum = 0.0_f64;

    for (i, change) in ledger.iter().enumerate() {
        let plan = plans
            .get(&change.subscription_plan_id)
            .ok_or(AppError::PlanNotFound)?;

        let end = ledger
            .get(i + 1)
            .map(|next| next.change_date)
            .unwrap_or(end_of_cycle);
        let days = whole_days_between(change.change_date, end).max(0);
        let charge = plan.price / days_in_cycle(change.billing_cycle) as f64 * days as f64;

        sum += charge;
        periods.push(ProratedPeriod {
            plan_id: plan.id,
            start: change.change_date,
            end,
            days,
            charge,
        });
    }

    Ok(ProrationBreakdown {
        periods,
        total: sum.round() as i64,
    })
}

/// Total prorated charge for the ledger, in whole currency units.
pub fn prorated_charge(
    ledger: &[SubscriptionChange],
    plans: &HashMap<Uuid, SubscriptionPlan>,
) -> AppResult<i64> {
    prorate(ledger, plans).map(|b| b.total)
}
