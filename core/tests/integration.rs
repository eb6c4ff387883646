//! Invoice lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every invoice and
//! invoice payment operation over real HTTP through `UreqTransport`.

use billing_core::{
    ApiError, AuditInfo, BillingApi, ChargeOptions, ClientConfig, Invoice, InvoiceItem, InvoicePayment,
    PaymentOptions, UsageError,
};
use rust_decimal_macros::dec;

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn invoice_lifecycle() {
    let api = BillingApi::from_config(&ClientConfig::new(start_server())).unwrap();
    let audit = AuditInfo::by("integration-test").with_reason("lifecycle");

    // Step 1: unknown invoice degrades to None, try_get exposes NotFound.
    assert!(api.invoices().get("does-not-exist", false, &[]).is_none());
    let err = api.invoices().try_get("does-not-exist", false, &[]).unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // Step 2: charge without an account is refused before any request.
    let err = api
        .invoices()
        .charge(&Invoice::default(), &ChargeOptions::default(), &audit, &[])
        .unwrap_err();
    assert_eq!(err, UsageError::MissingField("accountId"));

    // Step 3: charge two items and receive the re-fetched invoice with items.
    let mut invoice = Invoice::for_account("acc-1");
    invoice.items = vec![
        InvoiceItem {
            description: Some("seat".to_string()),
            amount: Some(dec!(10)),
            ..InvoiceItem::default()
        },
        InvoiceItem {
            description: Some("setup".to_string()),
            amount: Some(dec!(5)),
            ..InvoiceItem::default()
        },
    ];
    let options = ChargeOptions {
        auto_commit: true,
        ..ChargeOptions::default()
    };
    let charged = api
        .invoices()
        .charge(&invoice, &options, &audit, &[])
        .unwrap()
        .expect("charge should succeed");
    let invoice_id = charged.invoice_id.clone().unwrap();
    assert_eq!(charged.account_id.as_deref(), Some("acc-1"));
    assert_eq!(charged.status.as_deref(), Some("COMMITTED"));
    assert_eq!(charged.amount, Some(dec!(15)));
    assert_eq!(charged.items.len(), 2);

    // Step 4: get without items.
    let fetched = api.invoices().get(&invoice_id, false, &[]).unwrap();
    assert!(fetched.items.is_empty());
    assert_eq!(fetched.balance, Some(dec!(15)));

    // Step 5: HTML rendition.
    let html = api.invoices().get_invoice_as_html(&invoice_id, &[]).unwrap();
    assert!(html.contains(&invoice_id));

    // Step 6: no payments yet.
    let payments = api.invoices().get_payments(&invoice_id, false, false, &[]).unwrap();
    assert!(payments.is_empty());

    // Step 7: external payment, resolved through its Location.
    let payment = InvoicePayment::new(invoice_id.clone(), "acc-1");
    let payment_options = PaymentOptions {
        external_payment: true,
        ..PaymentOptions::default()
    };
    let created = api
        .invoice_payments()
        .create(&payment, &payment_options, &audit, &[])
        .unwrap()
        .expect("payment should be created");
    assert!(created.payment_id.is_some());
    assert_eq!(created.purchased_amount, Some(dec!(15)));

    // Step 8: non-external payment is refused by the server and degrades.
    let refused = api
        .invoice_payments()
        .create(&payment, &PaymentOptions::default(), &audit, &[])
        .unwrap();
    assert!(refused.is_none());

    // Step 9: payments list and settled balance.
    let payments = api.invoices().get_payments(&invoice_id, true, true, &[]).unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].payment_id, created.payment_id);
    let settled = api.invoices().get(&invoice_id, false, &[]).unwrap();
    assert_eq!(settled.balance, Some(dec!(0)));

    // Step 10: invoice generation for an account, resolved through Location.
    let generated = api
        .invoices()
        .create("acc-2", chrono::NaiveDate::from_ymd_opt(2024, 6, 1), &audit, &[])
        .expect("invoice should be created");
    assert_eq!(generated.account_id.as_deref(), Some("acc-2"));
    assert_eq!(generated.target_date, chrono::NaiveDate::from_ymd_opt(2024, 6, 1));

    // Step 11: the server requires audit headers on creation.
    assert!(api
        .invoices()
        .create("acc-2", None, &AuditInfo::default(), &[])
        .is_none());
}
