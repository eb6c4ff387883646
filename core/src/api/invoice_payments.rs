use crate::api::{degrade, BillingApi};
use crate::audit::AuditInfo;
use crate::client::PaymentOptions;
use crate::error::{ApiError, UsageError};
use crate::mapper::map_single;
use crate::transport::Transport;
use crate::types::InvoicePayment;

/// Invoice payment operations.
#[derive(Debug)]
pub struct InvoicePayments<'a, T: Transport> {
    api: &'a BillingApi<T>,
}

impl<'a, T: Transport> InvoicePayments<'a, T> {
    pub(crate) fn new(api: &'a BillingApi<T>) -> Self {
        Self { api }
    }

    /// `POST /invoices/{targetInvoiceId}/payments`, then resolve the created payment.
    ///
    /// Requires `target_invoice_id` and `account_id` on `payment`.
    pub fn try_create(
        &self,
        payment: &InvoicePayment,
        options: &PaymentOptions,
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> Result<InvoicePayment, ApiError> {
        let target_invoice_id = payment
            .target_invoice_id
            .as_deref()
            .ok_or(UsageError::MissingField("targetInvoiceId"))?;
        if payment.account_id.is_none() {
            return Err(UsageError::MissingField("accountId").into());
        }
        let request = self.api.client().build_create_invoice_payment(
            target_invoice_id,
            payment,
            options,
            audit,
            headers,
        )?;
        let response = self.api.send(&request)?;
        self.api.map_created(&response, headers, map_single)
    }

    /// `Err` only for a missing identifier; API failures yield `Ok(None)`.
    pub fn create(
        &self,
        payment: &InvoicePayment,
        options: &PaymentOptions,
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> Result<Option<InvoicePayment>, UsageError> {
        degrade(
            "invoice_payment.create",
            self.try_create(payment, options, audit, headers),
        )
    }
}
