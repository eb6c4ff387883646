use chrono::NaiveDate;

use crate::api::{absent_on_error, degrade, BillingApi};
use crate::audit::AuditInfo;
use crate::client::ChargeOptions;
use crate::error::{ApiError, UsageError};
use crate::mapper::map_single;
use crate::transport::Transport;
use crate::types::{Invoice, InvoicePayment};

/// Invoice operations.
#[derive(Debug)]
pub struct Invoices<'a, T: Transport> {
    api: &'a BillingApi<T>,
}

impl<'a, T: Transport> Invoices<'a, T> {
    pub(crate) fn new(api: &'a BillingApi<T>) -> Self {
        Self { api }
    }

    /// `GET /invoices/{invoiceId}[?withItems=true]`
    pub fn try_get(
        &self,
        invoice_id: &str,
        with_items: bool,
        headers: &[(String, String)],
    ) -> Result<Invoice, ApiError> {
        let client = self.api.client();
        let response = self.api.send(&client.build_get_invoice(invoice_id, with_items, headers))?;
        client.parse_invoice(&response)
    }

    /// Fetch an invoice; `None` when the call fails.
    pub fn get(&self, invoice_id: &str, with_items: bool, headers: &[(String, String)]) -> Option<Invoice> {
        absent_on_error("invoice.get", self.try_get(invoice_id, with_items, headers))
    }

    /// `POST /invoices?accountId=..[&targetDate=..]`, then resolve the created invoice.
    pub fn try_create(
        &self,
        account_id: &str,
        target_date: Option<NaiveDate>,
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> Result<Invoice, ApiError> {
        let request = self
            .api
            .client()
            .build_create_invoice(account_id, target_date, audit, headers);
        let response = self.api.send(&request)?;
        self.api.map_created(&response, headers, map_single)
    }

    /// Generate an invoice for `account_id`; `None` when the call fails.
    pub fn create(
        &self,
        account_id: &str,
        target_date: Option<NaiveDate>,
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> Option<Invoice> {
        absent_on_error(
            "invoice.create",
            self.try_create(account_id, target_date, audit, headers),
        )
    }

    /// `GET /invoices/{invoiceId}/payments[?withAttempts=true][&withPluginInfos=true]`
    pub fn try_get_payments(
        &self,
        invoice_id: &str,
        with_plugin_info: bool,
        with_attempts: bool,
        headers: &[(String, String)],
    ) -> Result<Vec<InvoicePayment>, ApiError> {
        let client = self.api.client();
        let request = client.build_get_invoice_payments(invoice_id, with_plugin_info, with_attempts, headers);
        let response = self.api.send(&request)?;
        client.parse_invoice_payments(&response)
    }

    pub fn get_payments(
        &self,
        invoice_id: &str,
        with_plugin_info: bool,
        with_attempts: bool,
        headers: &[(String, String)],
    ) -> Option<Vec<InvoicePayment>> {
        absent_on_error(
            "invoice.get_payments",
            self.try_get_payments(invoice_id, with_plugin_info, with_attempts, headers),
        )
    }

    /// `GET /invoices/{invoiceId}/html`. The body comes back for any status;
    /// only transport failures are errors, and they are not degraded.
    pub fn get_invoice_as_html(&self, invoice_id: &str, headers: &[(String, String)]) -> Result<String, ApiError> {
        let client = self.api.client();
        let response = self.api.send(&client.build_get_invoice_html(invoice_id, headers))?;
        Ok(client.parse_invoice_html(response))
    }

    /// Charge `invoice.items` to `invoice.account_id`, then fetch the invoice
    /// the first created item landed on, with its items.
    ///
    /// Once the charge request has succeeded the charge exists server-side;
    /// a failure of the follow-up fetch still fails the whole call.
    pub fn try_charge(
        &self,
        invoice: &Invoice,
        options: &ChargeOptions,
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> Result<Invoice, ApiError> {
        let account_id = invoice
            .account_id
            .as_deref()
            .ok_or(UsageError::MissingField("accountId"))?;
        let client = self.api.client();
        let request = client.build_charge(account_id, &invoice.items, options, audit, headers)?;
        let response = self.api.send(&request)?;
        let items = client.parse_charge(&response)?;
        let invoice_id = items
            .first()
            .and_then(|item| item.invoice_id.as_deref())
            .ok_or(ApiError::EmptyChargeResponse)?;
        self.try_get(invoice_id, true, headers)
    }

    /// `Err` only when `invoice.account_id` is unset; API failures yield `Ok(None)`.
    pub fn charge(
        &self,
        invoice: &Invoice,
        options: &ChargeOptions,
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> Result<Option<Invoice>, UsageError> {
        degrade("invoice.charge", self.try_charge(invoice, options, audit, headers))
    }
}
