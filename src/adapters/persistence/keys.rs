//! Key layout of the store.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use uuid::Uuid;

use crate::domain::entities::date_key::DateKeyFormat;

pub const CUSTOMER_INVOICE_PREFIX: &str = "customer_invoice:";
pub const INVOICE_PREFIX: &str = "invoice:";
pub const BUCKET_PREFIX: &str = "invoiceGenerationDate:";

pub fn customer(id: Uuid) -> String {
    format!("customer:{id}")
}

pub fn customer_email(email: &str) -> String {
    format!("customer_email:{email}")
}

pub fn plan(id: Uuid) -> String {
    format!("plan:{id}")
}

pub fn plan_name(name: &str) -> String {
    format!("plan_name:{name}")
}

pub fn invoice(id: Uuid) -> String {
    format!("{INVOICE_PREFIX}{id}")
}

pub fn customer_invoices(customer_id: Uuid) -> String {
    format!("{CUSTOMER_INVOICE_PREFIX}{customer_id}:")
}

/// Index entry for one invoice. Fixed-width timestamps keep keys in issue order.
pub fn customer_invoice(customer_id: Uuid, issued: DateTime<Utc>, invoice_id: Uuid) -> String {
    format!(
        "{}{}:{}",
        customer_invoices(customer_id),
        issued.to_rfc3339_opts(SecondsFormat::Micros, true),
        invoice_id
    )
}

/// Invoice id at the end of a [`customer_invoice`] key.
pub fn invoice_id_from_index(key: &str) -> Option<Uuid> {
    key.rsplit(':').next().and_then(|id| Uuid::parse_str(id).ok())
}

pub fn bucket(format: DateKeyFormat, date: NaiveDate) -> String {
    format!("{BUCKET_PREFIX}{}", format.format(date))
}

pub fn active_bill_date(customer_id: Uuid) -> String {
    format!("customerActiveBillDate:{customer_id}")
}

pub fn payment(id: Uuid) -> String {
    format!("payment:{id}")
}
