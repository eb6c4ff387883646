//! Stateless HTTP request builder and response parser for the billing API.
//!
//! # Design
//! `BillingClient` holds only a base URL and the headers every request
//! carries. Each endpoint is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Dispatch, multi-step flows and error degradation live in `api`.

use chrono::NaiveDate;
use serde::Serialize;

use crate::audit::AuditInfo;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::mapper::{check_status, map_many, map_single};
use crate::query::QueryParams;
use crate::types::{CustomField, Invoice, InvoiceItem, InvoicePayment, Tag};

pub const PATH_INVOICES: &str = "/invoices";
pub const SUB_PATH_PAYMENTS: &str = "/payments";
pub const SUB_PATH_HTML: &str = "/html";
pub const SUB_PATH_CHARGES: &str = "/charges";
pub const SUB_PATH_CUSTOM_FIELDS: &str = "/customFields";
pub const SUB_PATH_TAGS: &str = "/tags";

/// Optional parameters of the charge endpoint. Everything defaults to "not sent".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChargeOptions {
    pub requested_date: Option<NaiveDate>,
    pub pay_invoice: bool,
    pub plugin_property: Vec<String>,
    pub auto_commit: bool,
    pub payment_external_key: Option<String>,
    pub transaction_external_key: Option<String>,
}

/// Optional parameters of the invoice payment creation endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentOptions {
    pub external_payment: bool,
    pub plugin_property: Vec<String>,
}

/// Synchronous, stateless request builder for the billing API.
#[derive(Debug, Clone)]
pub struct BillingClient {
    base_url: String,
    default_headers: Vec<(String, String)>,
}

impl BillingClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_headers: Vec::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            default_headers: config.default_headers.clone(),
            ..Self::new(&config.base_url)
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Scheme and authority of the base URL, without its path.
    fn origin(&self) -> &str {
        let authority_start = self.base_url.find("://").map_or(0, |i| i + 3);
        match self.base_url[authority_start..].find('/') {
            Some(i) => &self.base_url[..authority_start + i],
            None => &self.base_url,
        }
    }

    /// Turn a `Location` value into an absolute URL. Absolute values are kept.
    /// A root-relative path resolves against the server origin, any other path
    /// against the base URL.
    pub fn resolve(&self, location: &str) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            location.to_string()
        } else if location.starts_with('/') {
            format!("{}{location}", self.origin())
        } else {
            format!("{}/{location}", self.base_url)
        }
    }

    /// Plain GET on a location returned by a creation endpoint.
    pub fn build_follow_location(&self, location: &str, headers: &[(String, String)]) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.resolve(location),
            headers: self.headers(None, headers, false),
            body: None,
        }
    }

    // --- invoices ---

    pub fn build_get_invoice(
        &self,
        invoice_id: &str,
        with_items: bool,
        headers: &[(String, String)],
    ) -> HttpRequest {
        let mut query = QueryParams::new();
        query.flag("withItems", with_items);
        self.request(HttpMethod::Get, &invoice_path(invoice_id), &query, None, headers, None)
    }

    pub fn build_create_invoice(
        &self,
        account_id: &str,
        target_date: Option<NaiveDate>,
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> HttpRequest {
        let mut query = QueryParams::new();
        query
            .push("accountId", account_id)
            .optional("targetDate", target_date);
        self.request(HttpMethod::Post, PATH_INVOICES, &query, Some(audit), headers, None)
    }

    pub fn build_get_invoice_payments(
        &self,
        invoice_id: &str,
        with_plugin_info: bool,
        with_attempts: bool,
        headers: &[(String, String)],
    ) -> HttpRequest {
        let mut query = QueryParams::new();
        query
            .flag("withAttempts", with_attempts)
            .flag("withPluginInfos", with_plugin_info);
        let path = format!("{}{SUB_PATH_PAYMENTS}", invoice_path(invoice_id));
        self.request(HttpMethod::Get, &path, &query, None, headers, None)
    }

    pub fn build_get_invoice_html(&self, invoice_id: &str, headers: &[(String, String)]) -> HttpRequest {
        let path = format!("{}{SUB_PATH_HTML}", invoice_path(invoice_id));
        self.request(HttpMethod::Get, &path, &QueryParams::new(), None, headers, None)
    }

    pub fn build_charge(
        &self,
        account_id: &str,
        items: &[InvoiceItem],
        options: &ChargeOptions,
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> Result<HttpRequest, ApiError> {
        let mut query = QueryParams::new();
        query
            .optional("requestedDate", options.requested_date)
            .flag("payInvoice", options.pay_invoice)
            .plugin_properties(&options.plugin_property)
            .flag("autoCommit", options.auto_commit)
            .optional("paymentExternalKey", options.payment_external_key.as_deref())
            .optional("transactionExternalKey", options.transaction_external_key.as_deref());
        let path = format!(
            "{PATH_INVOICES}{SUB_PATH_CHARGES}/{}",
            urlencoding::encode(account_id)
        );
        let body = to_json(items)?;
        Ok(self.request(HttpMethod::Post, &path, &query, Some(audit), headers, Some(body)))
    }

    pub fn build_create_invoice_payment(
        &self,
        target_invoice_id: &str,
        payment: &InvoicePayment,
        options: &PaymentOptions,
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> Result<HttpRequest, ApiError> {
        let mut query = QueryParams::new();
        query
            .flag("externalPayment", options.external_payment)
            .plugin_properties(&options.plugin_property);
        let path = format!("{}{SUB_PATH_PAYMENTS}", invoice_path(target_invoice_id));
        let body = to_json(payment)?;
        Ok(self.request(HttpMethod::Post, &path, &query, Some(audit), headers, Some(body)))
    }

    pub fn parse_invoice(&self, response: &HttpResponse) -> Result<Invoice, ApiError> {
        map_single(response)
    }

    pub fn parse_invoice_payments(&self, response: &HttpResponse) -> Result<Vec<InvoicePayment>, ApiError> {
        map_many(response)
    }

    pub fn parse_invoice_payment(&self, response: &HttpResponse) -> Result<InvoicePayment, ApiError> {
        map_single(response)
    }

    /// The HTML rendition is returned verbatim, whatever the status.
    pub fn parse_invoice_html(&self, response: HttpResponse) -> String {
        response.body
    }

    pub fn parse_charge(&self, response: &HttpResponse) -> Result<Vec<InvoiceItem>, ApiError> {
        map_many(response)
    }

    // --- custom fields ---

    pub fn build_get_custom_fields(&self, base_path: &str, headers: &[(String, String)]) -> HttpRequest {
        let path = format!("{base_path}{SUB_PATH_CUSTOM_FIELDS}");
        self.request(HttpMethod::Get, &path, &QueryParams::new(), None, headers, None)
    }

    pub fn build_add_custom_fields(
        &self,
        base_path: &str,
        fields: &[CustomField],
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> Result<HttpRequest, ApiError> {
        let path = format!("{base_path}{SUB_PATH_CUSTOM_FIELDS}");
        let body = to_json(fields)?;
        Ok(self.request(HttpMethod::Post, &path, &QueryParams::new(), Some(audit), headers, Some(body)))
    }

    pub fn build_delete_custom_fields<S: AsRef<str>>(
        &self,
        base_path: &str,
        custom_field_ids: &[S],
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> HttpRequest {
        let mut query = QueryParams::new();
        query.joined("customField", custom_field_ids, ",");
        let path = format!("{base_path}{SUB_PATH_CUSTOM_FIELDS}");
        self.request(HttpMethod::Delete, &path, &query, Some(audit), headers, None)
    }

    pub fn parse_custom_fields(&self, response: &HttpResponse) -> Result<Vec<CustomField>, ApiError> {
        map_many(response)
    }

    // --- tags ---

    pub fn build_get_tags(
        &self,
        base_path: &str,
        included_deleted: bool,
        headers: &[(String, String)],
    ) -> HttpRequest {
        let mut query = QueryParams::new();
        query.flag("includedDeleted", included_deleted);
        let path = format!("{base_path}{SUB_PATH_TAGS}");
        self.request(HttpMethod::Get, &path, &query, None, headers, None)
    }

    pub fn build_add_tags<S: AsRef<str>>(
        &self,
        base_path: &str,
        tag_definition_ids: &[S],
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> HttpRequest {
        let mut query = QueryParams::new();
        query.joined("tagDef", tag_definition_ids, ",");
        let path = format!("{base_path}{SUB_PATH_TAGS}");
        self.request(HttpMethod::Post, &path, &query, Some(audit), headers, None)
    }

    pub fn build_delete_tags<S: AsRef<str>>(
        &self,
        base_path: &str,
        tag_definition_ids: &[S],
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> HttpRequest {
        let mut query = QueryParams::new();
        query.joined("tagDef", tag_definition_ids, ",");
        let path = format!("{base_path}{SUB_PATH_TAGS}");
        self.request(HttpMethod::Delete, &path, &query, Some(audit), headers, None)
    }

    pub fn parse_tags(&self, response: &HttpResponse) -> Result<Vec<Tag>, ApiError> {
        map_many(response)
    }

    /// Deletions answer with an empty 2xx.
    pub fn parse_delete(&self, response: &HttpResponse) -> Result<(), ApiError> {
        check_status(response)
    }

    fn request(
        &self,
        method: HttpMethod,
        path: &str,
        query: &QueryParams,
        audit: Option<&AuditInfo>,
        headers: &[(String, String)],
        body: Option<String>,
    ) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("{}{path}{}", self.base_url, query.to_query_string()),
            headers: self.headers(audit, headers, body.is_some()),
            body,
        }
    }

    /// Default headers, then audit headers, then the caller's headers.
    fn headers(
        &self,
        audit: Option<&AuditInfo>,
        extra: &[(String, String)],
        has_body: bool,
    ) -> Vec<(String, String)> {
        let mut headers = self.default_headers.clone();
        if let Some(audit) = audit {
            headers.extend(audit.headers());
        }
        headers.extend(extra.iter().cloned());
        if has_body {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        headers
    }
}

/// `/invoices/{invoiceId}`
pub fn invoice_path(invoice_id: &str) -> String {
    format!("{PATH_INVOICES}/{}", urlencoding::encode(invoice_id))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::SerializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{COMMENT_HEADER, CREATED_BY_HEADER, REASON_HEADER};

    fn client() -> BillingClient {
        BillingClient::new("http://localhost:8080/1.0/kb")
    }

    fn no_headers() -> Vec<(String, String)> {
        Vec::new()
    }

    #[test]
    fn get_invoice_with_items() {
        let req = client().build_get_invoice("abc-1", true, &no_headers());
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8080/1.0/kb/invoices/abc-1?withItems=true");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn get_invoice_without_items_has_no_query() {
        let req = client().build_get_invoice("abc-1", false, &no_headers());
        assert_eq!(req.url, "http://localhost:8080/1.0/kb/invoices/abc-1");
    }

    #[test]
    fn create_invoice_always_sends_account_id() {
        let req = client().build_create_invoice("acc-1", None, &AuditInfo::by("admin"), &no_headers());
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8080/1.0/kb/invoices?accountId=acc-1");
        assert_eq!(req.header(CREATED_BY_HEADER), Some("admin"));
        assert!(req.body.is_none());
    }

    #[test]
    fn create_invoice_with_target_date() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 31);
        let req = client().build_create_invoice("acc-1", date, &AuditInfo::default(), &no_headers());
        assert_eq!(
            req.url,
            "http://localhost:8080/1.0/kb/invoices?accountId=acc-1&targetDate=2024-05-31"
        );
    }

    #[test]
    fn invoice_payments_query_order() {
        let req = client().build_get_invoice_payments("abc-1", true, true, &no_headers());
        assert_eq!(
            req.url,
            "http://localhost:8080/1.0/kb/invoices/abc-1/payments?withAttempts=true&withPluginInfos=true"
        );
        let req = client().build_get_invoice_payments("abc-1", false, false, &no_headers());
        assert_eq!(req.url, "http://localhost:8080/1.0/kb/invoices/abc-1/payments");
    }

    #[test]
    fn invoice_html_path() {
        let req = client().build_get_invoice_html("abc-1", &no_headers());
        assert_eq!(req.url, "http://localhost:8080/1.0/kb/invoices/abc-1/html");
    }

    #[test]
    fn charge_with_defaults_sends_no_query() {
        let req = client()
            .build_charge("acc-1", &[], &ChargeOptions::default(), &AuditInfo::default(), &no_headers())
            .unwrap();
        assert_eq!(req.url, "http://localhost:8080/1.0/kb/invoices/charges/acc-1");
        assert_eq!(req.body.as_deref(), Some("[]"));
        assert_eq!(req.header("content-type"), Some("application/json"));
    }

    #[test]
    fn charge_with_every_option() {
        let options = ChargeOptions {
            requested_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            pay_invoice: true,
            plugin_property: vec!["a".to_string(), "b".to_string()],
            auto_commit: true,
            payment_external_key: Some("pek".to_string()),
            transaction_external_key: Some("tek".to_string()),
        };
        let items = vec![InvoiceItem {
            account_id: Some("acc-1".to_string()),
            description: Some("one-off".to_string()),
            ..InvoiceItem::default()
        }];
        let audit = AuditInfo::by("admin").with_reason("support").with_comment("goodwill");
        let req = client()
            .build_charge("acc-1", &items, &options, &audit, &no_headers())
            .unwrap();
        assert_eq!(
            req.url,
            "http://localhost:8080/1.0/kb/invoices/charges/acc-1?requestedDate=2024-01-15&payInvoice=true&pluginProperty=a%5Cnb&autoCommit=true&paymentExternalKey=pek&transactionExternalKey=tek"
        );
        assert_eq!(req.header(REASON_HEADER), Some("support"));
        assert_eq!(req.header(COMMENT_HEADER), Some("goodwill"));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body[0]["description"], "one-off");
    }

    #[test]
    fn create_invoice_payment_request() {
        let payment = InvoicePayment::new("inv-1", "acc-1");
        let options = PaymentOptions {
            external_payment: true,
            plugin_property: vec!["k=v".to_string()],
        };
        let req = client()
            .build_create_invoice_payment("inv-1", &payment, &options, &AuditInfo::by("admin"), &no_headers())
            .unwrap();
        assert_eq!(
            req.url,
            "http://localhost:8080/1.0/kb/invoices/inv-1/payments?externalPayment=true&pluginProperty=k%3Dv"
        );
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["targetInvoiceId"], "inv-1");
        assert_eq!(body["accountId"], "acc-1");
    }

    #[test]
    fn header_order_is_default_audit_extra() {
        let config = ClientConfig::new("http://localhost:8080/").with_header("X-Killbill-ApiKey", "bob");
        let extra = vec![("X-Request-Id".to_string(), "r-1".to_string())];
        let req = BillingClient::from_config(&config).build_create_invoice(
            "acc-1",
            None,
            &AuditInfo::by("admin"),
            &extra,
        );
        let names: Vec<_> = req.headers.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["X-Killbill-ApiKey", CREATED_BY_HEADER, "X-Request-Id"]);
        assert!(req.url.starts_with("http://localhost:8080/invoices"));
    }

    #[test]
    fn resolve_handles_relative_and_absolute_locations() {
        let c = client();
        assert_eq!(c.resolve("/invoices/x"), "http://localhost:8080/invoices/x");
        assert_eq!(c.resolve("invoices/x"), "http://localhost:8080/1.0/kb/invoices/x");
        assert_eq!(c.resolve("https://other/invoices/x"), "https://other/invoices/x");
    }

    #[test]
    fn resolve_does_not_repeat_base_path() {
        let c = BillingClient::new("http://h/1.0/kb");
        assert_eq!(c.resolve("/1.0/kb/invoices/x"), "http://h/1.0/kb/invoices/x");
    }

    #[test]
    fn resolve_against_base_without_path() {
        let c = BillingClient::new("http://127.0.0.1:9000/");
        assert_eq!(c.resolve("/invoices/x"), "http://127.0.0.1:9000/invoices/x");
    }

    #[test]
    fn custom_field_and_tag_requests() {
        let c = client();
        let base = invoice_path("inv-1");

        let req = c.build_get_custom_fields(&base, &no_headers());
        assert_eq!(req.url, "http://localhost:8080/1.0/kb/invoices/inv-1/customFields");

        let req = c.build_delete_custom_fields(&base, &["cf-1", "cf-2"], &AuditInfo::default(), &no_headers());
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(
            req.url,
            "http://localhost:8080/1.0/kb/invoices/inv-1/customFields?customField=cf-1%2Ccf-2"
        );

        let req = c.build_get_tags(&base, true, &no_headers());
        assert_eq!(req.url, "http://localhost:8080/1.0/kb/invoices/inv-1/tags?includedDeleted=true");

        let req = c.build_add_tags(&base, &["td-1"], &AuditInfo::by("admin"), &no_headers());
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8080/1.0/kb/invoices/inv-1/tags?tagDef=td-1");
    }

    #[test]
    fn parse_invoice_html_is_verbatim() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: "<html><body>Invoice</body></html>".to_string(),
        };
        assert_eq!(
            client().parse_invoice_html(response),
            "<html><body>Invoice</body></html>"
        );
    }

    #[test]
    fn parse_invoice_html_keeps_error_body() {
        let response = HttpResponse {
            status: 404,
            headers: Vec::new(),
            body: "<html>No such invoice</html>".to_string(),
        };
        assert_eq!(client().parse_invoice_html(response), "<html>No such invoice</html>");
    }

    #[test]
    fn parse_delete_rejects_error_status() {
        let response = HttpResponse {
            status: 400,
            headers: Vec::new(),
            body: "bad".to_string(),
        };
        assert!(matches!(
            client().parse_delete(&response),
            Err(ApiError::HttpError { status: 400, .. })
        ));
    }
}
