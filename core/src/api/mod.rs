//! Operations that dispatch requests through a `Transport`.
//!
//! # Design
//! `BillingApi` pairs the stateless `BillingClient` with a transport. Each
//! resource gets a borrowed operation set (`invoices()`, `invoice_payments()`,
//! `custom_fields(&r)`, `tags(&r)`).
//!
//! Every fallible operation comes in two forms. `try_*` returns the full
//! `ApiError`. The plain form is the degrading boundary: API and transport
//! failures are logged once and turned into `None`, while a `UsageError`
//! (missing identifier on the resource) is still returned to the caller.
//! Nested requests inside a multi-step operation always use the `try_*`
//! form so a failure is logged exactly once.

mod custom_fields;
mod invoice_payments;
mod invoices;
mod tags;

pub use custom_fields::CustomFields;
pub use invoice_payments::InvoicePayments;
pub use invoices::Invoices;
pub use tags::Tags;

use tracing::{debug, error};

use crate::capability::{CustomFieldCapable, Taggable};
use crate::client::BillingClient;
use crate::config::ClientConfig;
use crate::error::{ApiError, UsageError};
use crate::http::{HttpRequest, HttpResponse};
use crate::mapper::check_status;
use crate::transport::{Transport, UreqTransport};

/// Billing API bound to a transport.
#[derive(Debug, Clone)]
pub struct BillingApi<T: Transport> {
    client: BillingClient,
    transport: T,
}

impl BillingApi<UreqTransport> {
    /// Validate `config` and connect through a blocking `ureq` agent.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        Ok(Self::new(
            BillingClient::from_config(config),
            UreqTransport::new(config),
        ))
    }
}

impl<T: Transport> BillingApi<T> {
    pub fn new(client: BillingClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &BillingClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn invoices(&self) -> Invoices<'_, T> {
        Invoices::new(self)
    }

    pub fn invoice_payments(&self) -> InvoicePayments<'_, T> {
        InvoicePayments::new(self)
    }

    pub fn custom_fields<'a, R: CustomFieldCapable>(&'a self, resource: &'a R) -> CustomFields<'a, T, R> {
        CustomFields::new(self, resource)
    }

    pub fn tags<'a, R: Taggable>(&'a self, resource: &'a R) -> Tags<'a, T, R> {
        Tags::new(self, resource)
    }

    /// Execute one request.
    pub fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), url = %request.url, "sending billing request");
        let response = self.transport.execute(request)?;
        debug!(status = response.status, "billing response received");
        Ok(response)
    }

    /// Decode the result of a creation endpoint.
    ///
    /// When the response carries a `Location` header the resource is fetched
    /// from there (forwarding `headers`) and the follow-up body is decoded with
    /// `map`. Otherwise the creation body itself is decoded.
    pub fn map_created<R>(
        &self,
        response: &HttpResponse,
        headers: &[(String, String)],
        map: fn(&HttpResponse) -> Result<R, ApiError>,
    ) -> Result<R, ApiError> {
        check_status(response)?;
        if let Some(location) = response.header("Location") {
            let follow = self.client.build_follow_location(location, headers);
            let fetched = self.send(&follow)?;
            return map(&fetched);
        }
        if response.body.trim().is_empty() {
            return Err(ApiError::MissingLocation);
        }
        map(response)
    }
}

/// Log a failed operation and collapse it to `None`.
pub(crate) fn absent_on_error<R>(operation: &'static str, result: Result<R, ApiError>) -> Option<R> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            error!(operation, error = %err, "billing API call failed");
            None
        }
    }
}

/// Like `absent_on_error`, but a `UsageError` is handed back to the caller.
pub(crate) fn degrade<R>(
    operation: &'static str,
    result: Result<R, ApiError>,
) -> Result<Option<R>, UsageError> {
    match result {
        Err(ApiError::Usage(err)) => Err(err),
        other => Ok(absent_on_error(operation, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{map_many, map_single};
    use crate::transport::RecordingTransport;
    use crate::types::{CustomField, Invoice};

    const BASE: &str = "http://localhost:8080/1.0/kb";

    fn api(transport: &RecordingTransport) -> BillingApi<&RecordingTransport> {
        BillingApi::new(BillingClient::new(BASE), transport)
    }

    #[test]
    fn map_created_follows_location_with_headers() {
        let transport = RecordingTransport::new();
        transport.respond(200, r#"{"invoiceId":"inv-9"}"#);
        let created = HttpResponse {
            status: 201,
            headers: vec![("Location".to_string(), "/1.0/kb/invoices/inv-9".to_string())],
            body: String::new(),
        };
        let headers = vec![("X-Request-Id".to_string(), "r-1".to_string())];

        let invoice: Invoice = api(&transport).map_created(&created, &headers, map_single).unwrap();
        assert_eq!(invoice.invoice_id.as_deref(), Some("inv-9"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, format!("{BASE}/invoices/inv-9"));
        assert_eq!(requests[0].header("X-Request-Id"), Some("r-1"));
    }

    #[test]
    fn map_created_decodes_body_without_location() {
        let transport = RecordingTransport::new();
        let created = HttpResponse {
            status: 201,
            headers: Vec::new(),
            body: r#"[{"name":"tier","value":"gold"}]"#.to_string(),
        };
        let fields: Vec<CustomField> = api(&transport).map_created(&created, &[], map_many).unwrap();
        assert_eq!(fields, vec![CustomField::new("tier", "gold")]);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn map_created_without_location_or_body_fails() {
        let transport = RecordingTransport::new();
        let created = HttpResponse {
            status: 201,
            headers: Vec::new(),
            body: String::new(),
        };
        let err = api(&transport)
            .map_created::<Invoice>(&created, &[], map_single)
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingLocation));
    }

    #[test]
    fn map_created_propagates_error_status() {
        let transport = RecordingTransport::new();
        let created = HttpResponse {
            status: 400,
            headers: vec![("Location".to_string(), "/invoices/x".to_string())],
            body: "bad request".to_string(),
        };
        let err = api(&transport)
            .map_created::<Invoice>(&created, &[], map_single)
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 400, .. }));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn degrade_keeps_usage_errors() {
        let result: Result<u8, ApiError> = Err(UsageError::MissingField("accountId").into());
        assert_eq!(
            degrade("test", result),
            Err(UsageError::MissingField("accountId"))
        );
        assert_eq!(degrade("test", Err::<u8, _>(ApiError::NotFound)), Ok(None));
        assert_eq!(degrade("test", Ok::<u8, ApiError>(7)), Ok(Some(7)));
    }

    #[test]
    fn from_config_rejects_invalid_config() {
        let config = ClientConfig {
            timeout_secs: 0,
            ..ClientConfig::default()
        };
        assert!(matches!(BillingApi::from_config(&config), Err(ApiError::Config(_))));
    }
}
