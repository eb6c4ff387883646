//! Synchronous client binding for the billing platform's invoice API.
//!
//! # Overview
//! `BillingClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network. `BillingApi` pairs it with a
//! `Transport` and exposes the invoice, invoice payment, custom field and tag
//! operations.
//!
//! # Design
//! - Resources are plain serde structs (`types`); operations live in `api`
//!   and borrow the resource they act on.
//! - Every operation is one blocking round-trip, except creations that
//!   answer with a `Location` and `charge`, which re-fetches the charged
//!   invoice.
//! - Plain operations log API failures through `tracing` and return `None`;
//!   `try_*` variants return the `ApiError` instead. A missing identifier is
//!   a `UsageError` in both forms.

pub mod api;
pub mod audit;
pub mod capability;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod mapper;
pub mod query;
pub mod transport;
pub mod types;

pub use api::{BillingApi, CustomFields, InvoicePayments, Invoices, Tags};
pub use audit::AuditInfo;
pub use capability::{CustomFieldCapable, ObjectResource, Taggable};
pub use client::{BillingClient, ChargeOptions, PaymentOptions};
pub use config::ClientConfig;
pub use error::{ApiError, UsageError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use query::QueryParams;
pub use transport::{RecordingTransport, Transport, UreqTransport};
pub use types::{CustomField, Invoice, InvoiceItem, InvoicePayment, PaymentTransaction, Tag};
