use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const CREATED_BY_HEADER: &str = "x-killbill-createdby";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_id: String,
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<String>,
    pub status: String,
    pub currency: String,
    pub amount: f64,
    pub balance: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<InvoiceItem>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePayment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_invoice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchased_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Default)]
pub struct Store {
    invoices: HashMap<String, Invoice>,
    payments: HashMap<String, InvoicePayment>,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceQuery {
    pub account_id: String,
    pub target_date: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetInvoiceQuery {
    #[serde(default)]
    pub with_items: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeQuery {
    #[serde(default)]
    pub auto_commit: bool,
    pub requested_date: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQuery {
    #[serde(default)]
    pub external_payment: bool,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/invoices", post(create_invoice))
        .route("/invoices/{id}", get(get_invoice))
        .route("/invoices/{id}/html", get(get_invoice_html))
        .route(
            "/invoices/{id}/payments",
            get(list_invoice_payments).post(create_invoice_payment),
        )
        .route("/invoices/charges/{account_id}", post(charge))
        .route("/invoicePayments/{payment_id}", get(get_invoice_payment))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn require_audit(headers: &HeaderMap) -> Result<(), Response> {
    if headers.contains_key(CREATED_BY_HEADER) {
        return Ok(());
    }
    Err((StatusCode::BAD_REQUEST, "X-Killbill-CreatedBy header is required").into_response())
}

fn created(location: String) -> Response {
    (StatusCode::CREATED, [(header::LOCATION, location)]).into_response()
}

async fn create_invoice(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<CreateInvoiceQuery>,
) -> Response {
    if let Err(rejection) = require_audit(&headers) {
        return rejection;
    }
    let invoice = Invoice {
        invoice_id: Uuid::new_v4().to_string(),
        account_id: query.account_id,
        target_date: query.target_date,
        status: "COMMITTED".to_string(),
        currency: "USD".to_string(),
        ..Invoice::default()
    };
    let location = format!("/invoices/{}", invoice.invoice_id);
    tracing::info!(invoice_id = %invoice.invoice_id, "invoice created");
    db.write().await.invoices.insert(invoice.invoice_id.clone(), invoice);
    created(location)
}

async fn get_invoice(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(query): Query<GetInvoiceQuery>,
) -> Result<Json<Invoice>, StatusCode> {
    let store = db.read().await;
    let mut invoice = store.invoices.get(&id).cloned().ok_or(StatusCode::NOT_FOUND)?;
    if !query.with_items {
        invoice.items.clear();
    }
    Ok(Json(invoice))
}

async fn get_invoice_html(State(db): State<Db>, Path(id): Path<String>) -> Result<Html<String>, StatusCode> {
    let store = db.read().await;
    let invoice = store.invoices.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Html(format!(
        "<html><body><h1>Invoice {}</h1><p>Amount: {:.2} {}</p></body></html>",
        invoice.invoice_id, invoice.amount, invoice.currency
    )))
}

async fn list_invoice_payments(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Vec<InvoicePayment>>, StatusCode> {
    let store = db.read().await;
    if !store.invoices.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let mut payments: Vec<InvoicePayment> = store
        .payments
        .values()
        .filter(|p| p.target_invoice_id.as_deref() == Some(id.as_str()))
        .cloned()
        .collect();
    payments.sort_by(|a, b| a.payment_id.cmp(&b.payment_id));
    Ok(Json(payments))
}

async fn create_invoice_payment(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<PaymentQuery>,
    Json(input): Json<InvoicePayment>,
) -> Response {
    if let Err(rejection) = require_audit(&headers) {
        return rejection;
    }
    if !query.external_payment {
        // No payment plugin behind the mock: only external payments succeed.
        return (StatusCode::PAYMENT_REQUIRED, "no payment method configured").into_response();
    }
    let mut store = db.write().await;
    let Some(invoice) = store.invoices.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let amount = input.purchased_amount.unwrap_or(invoice.balance);
    invoice.balance -= amount;
    let payment = InvoicePayment {
        payment_id: Some(Uuid::new_v4().to_string()),
        target_invoice_id: Some(id),
        account_id: input.account_id.or_else(|| Some(invoice.account_id.clone())),
        purchased_amount: Some(amount),
        currency: input.currency.or_else(|| Some(invoice.currency.clone())),
    };
    let payment_id = payment.payment_id.clone().unwrap_or_default();
    store.payments.insert(payment_id.clone(), payment);
    created(format!("/invoicePayments/{payment_id}"))
}

async fn get_invoice_payment(
    State(db): State<Db>,
    Path(payment_id): Path<String>,
) -> Result<Json<InvoicePayment>, StatusCode> {
    let store = db.read().await;
    store.payments.get(&payment_id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn charge(
    State(db): State<Db>,
    Path(account_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<ChargeQuery>,
    Json(items): Json<Vec<InvoiceItem>>,
) -> Response {
    if let Err(rejection) = require_audit(&headers) {
        return rejection;
    }
    if items.is_empty() {
        return (StatusCode::BAD_REQUEST, "at least one item is required").into_response();
    }
    let invoice_id = Uuid::new_v4().to_string();
    let items: Vec<InvoiceItem> = items
        .into_iter()
        .map(|item| InvoiceItem {
            invoice_item_id: Some(Uuid::new_v4().to_string()),
            invoice_id: Some(invoice_id.clone()),
            account_id: Some(account_id.clone()),
            currency: item.currency.or_else(|| Some("USD".to_string())),
            ..item
        })
        .collect();
    let amount: f64 = items.iter().map(|i| i.amount).sum();
    let invoice = Invoice {
        invoice_id: invoice_id.clone(),
        account_id,
        target_date: query.requested_date,
        status: if query.auto_commit { "COMMITTED" } else { "DRAFT" }.to_string(),
        currency: "USD".to_string(),
        amount,
        balance: amount,
        items: items.clone(),
    };
    db.write().await.invoices.insert(invoice_id, invoice);
    (StatusCode::CREATED, Json(items)).into_response()
}
