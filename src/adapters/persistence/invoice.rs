use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use crate::{
    adapters::persistence::{KvPersistence, keys},
    app_error::AppResult,
    application::ports::kv_store::KeyPage,
    domain::entities::invoice::Invoice,
    use_cases::invoice_generation::{InvoicePage, InvoiceRepo},
};

impl KvPersistence {
    /// Loads the invoices a page of keys points at, skipping dangling entries.
    async fn load_invoice_page<F>(&self, page: KeyPage, id_of: F) -> AppResult<InvoicePage>
    where
        F: Fn(&str) -> Option<Uuid> + Send,
    {
        let mut invoices = Vec::with_capacity(page.keys.len());
        for key in &page.keys {
            let Some(id) = id_of(key) else {
                warn!(key = %key, "unparseable invoice key skipped");
                continue;
            };
            match self.get_json::<Invoice>(&keys::invoice(id)).await? {
                Some(invoice) => invoices.push(invoice),
                None => warn!(key = %key, invoice_id = %id, "dangling invoice key skipped"),
            }
        }
        Ok(InvoicePage {
            invoices,
            cursor: page.cursor,
        })
    }
}

#[async_trait]
impl InvoiceRepo for KvPersistence {
    async fn insert(&self, invoice: &Invoice) -> AppResult<()> {
        self.put_json(&keys::invoice(invoice.id), invoice).await?;
        self.store
            .put(
                &keys::customer_invoice(invoice.customer_id, invoice.due_date, invoice.id),
                &invoice.id.to_string(),
            )
            .await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Invoice>> {
        self.get_json(&keys::invoice(id)).await
    }

    async fn update(&self, invoice: &Invoice) -> AppResult<()> {
        self.put_json(&keys::invoice(invoice.id), invoice).await
    }

    async fn list_by_customer(
        &self,
        customer_id: Uuid,
        cursor: Option<&str>,
        limit: usize,
    ) -> AppResult<InvoicePage> {
        let page = self
            .store
            .list(&keys::customer_invoices(customer_id), cursor, limit)
            .await?;
        self.load_invoice_page(page, keys::invoice_id_from_index)
            .await
    }

    async fn list_page(&self, cursor: Option<&str>, limit: usize) -> AppResult<InvoicePage> {
        let page = self.store.list(keys::INVOICE_PREFIX, cursor, limit).await?;
        self.load_invoice_page(page, |key| {
            key.strip_prefix(keys::INVOICE_PREFIX)
                .and_then(|id| Uuid::parse_str(id).ok())
        })
        .await
    }
}
