mod common;

use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate};
use common::TestApp;
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;
use workshop_api::{
    errors::ServiceError,
    models::{work_order, InvoiceStatus, PaymentMethod, WorkOrderStatus},
    services::{
        invoicing::{CreateInvoiceRequest, UpdateInvoiceRequest},
        payments::RecordPaymentRequest,
        work_orders::{AddServiceLineRequest, WorkOrderStatusRequest},
    },
};

async fn billable_work_order(app: &TestApp, amount: Decimal) -> work_order::Model {
    let order = app.seed_work_order().await;
    let service = app.seed_service("Brake service", amount).await;
    app.state
        .services
        .work_orders
        .add_service_line(
            order.id,
            AddServiceLineRequest {
                service_id: service.id,
                quantity: 1,
                unit_price: None,
                notes: None,
            },
        )
        .await
        .expect("add service line")
        .work_order
}

fn invoice_request(work_order_id: Uuid) -> CreateInvoiceRequest {
    CreateInvoiceRequest {
        work_order_id,
        tax_amount: None,
        tax_rate: None,
        discount_amount: Decimal::ZERO,
        issue_date: None,
        due_date: None,
        notes: None,
    }
}

fn payment(amount: Decimal) -> RecordPaymentRequest {
    RecordPaymentRequest {
        amount,
        payment_method: PaymentMethod::Cash,
        payment_date: None,
        reference: None,
        notes: None,
    }
}

#[tokio::test]
async fn payments_reconcile_balance_and_status() {
    let app = TestApp::new().await;
    let order = billable_work_order(&app, dec!(100.00)).await;
    assert_eq!(order.total_cost, dec!(100.00));

    let invoice = app
        .state
        .services
        .invoices
        .create_invoice(CreateInvoiceRequest {
            tax_amount: Some(dec!(10.00)),
            discount_amount: dec!(5.00),
            ..invoice_request(order.id)
        })
        .await
        .expect("create invoice");
    assert_eq!(invoice.subtotal, dec!(100.00));
    assert_eq!(invoice.total_amount, dec!(105.00));
    assert_eq!(invoice.balance_due, dec!(105.00));
    assert_eq!(invoice.status, InvoiceStatus::Unpaid);
    assert_eq!(invoice.invoice_number, "INV-2026-00001");
    assert_eq!(
        invoice.due_date,
        Some(NaiveDate::from_ymd_opt(2026, 4, 14).unwrap())
    );

    let payments = app.state.services.payments.clone();
    let first = payments
        .record_payment(invoice.id, payment(dec!(50.00)))
        .await
        .expect("partial payment");
    assert_eq!(first.invoice.amount_paid, dec!(50.00));
    assert_eq!(first.invoice.balance_due, dec!(55.00));
    assert_eq!(first.invoice.status, InvoiceStatus::PartiallyPaid);

    let err = payments
        .record_payment(invoice.id, payment(dec!(60.00)))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError { .. });

    let settled = payments
        .record_payment(invoice.id, payment(dec!(55.00)))
        .await
        .expect("final payment");
    assert_eq!(settled.invoice.balance_due, Decimal::ZERO);
    assert_eq!(settled.invoice.status, InvoiceStatus::Paid);

    let reverted = payments
        .delete_payment(settled.payment.id)
        .await
        .expect("delete payment");
    assert_eq!(reverted.amount_paid, dec!(50.00));
    assert_eq!(reverted.balance_due, dec!(55.00));
    assert_eq!(reverted.status, InvoiceStatus::PartiallyPaid);

    let listed = payments.list_payments(invoice.id).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn tax_rate_and_default_rate_are_applied_to_the_subtotal() {
    let app = TestApp::with_config(|cfg| cfg.default_tax_rate = 0.10).await;

    let explicit = billable_work_order(&app, dec!(200.00)).await;
    let invoice = app
        .state
        .services
        .invoices
        .create_invoice(CreateInvoiceRequest {
            tax_rate: Some(dec!(0.08)),
            ..invoice_request(explicit.id)
        })
        .await
        .unwrap();
    assert_eq!(invoice.tax_amount, dec!(16.00));
    assert_eq!(invoice.total_amount, dec!(216.00));

    let defaulted = billable_work_order(&app, dec!(80.00)).await;
    let invoice = app
        .state
        .services
        .invoices
        .create_invoice(invoice_request(defaulted.id))
        .await
        .unwrap();
    assert_eq!(invoice.tax_amount, dec!(8.00));
    assert_eq!(invoice.total_amount, dec!(88.00));
}

#[tokio::test]
async fn invoice_creation_rules() {
    let app = TestApp::new().await;
    let order = billable_work_order(&app, dec!(100.00)).await;
    let invoices = app.state.services.invoices.clone();

    let err = invoices
        .create_invoice(CreateInvoiceRequest {
            tax_amount: Some(dec!(1.00)),
            tax_rate: Some(dec!(0.10)),
            ..invoice_request(order.id)
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError { .. });

    let err = invoices
        .create_invoice(CreateInvoiceRequest {
            discount_amount: dec!(150.00),
            ..invoice_request(order.id)
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError { .. });

    invoices.create_invoice(invoice_request(order.id)).await.unwrap();
    let err = invoices
        .create_invoice(invoice_request(order.id))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    let err = invoices
        .create_invoice(invoice_request(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn cancelled_work_order_cannot_be_invoiced() {
    let app = TestApp::new().await;
    let order = billable_work_order(&app, dec!(40.00)).await;
    app.state
        .services
        .work_orders
        .update_status(
            order.id,
            WorkOrderStatusRequest {
                status: WorkOrderStatus::Cancelled,
            },
            None,
        )
        .await
        .unwrap();

    let err = app
        .state
        .services
        .invoices
        .create_invoice(invoice_request(order.id))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError { .. });
}

#[tokio::test]
async fn zero_total_invoice_is_paid_immediately() {
    let app = TestApp::new().await;
    let order = app.seed_work_order().await;

    let invoice = app
        .state
        .services
        .invoices
        .create_invoice(invoice_request(order.id))
        .await
        .unwrap();
    assert_eq!(invoice.total_amount, Decimal::ZERO);
    assert_eq!(invoice.status, InvoiceStatus::Paid);
}

#[tokio::test]
async fn open_invoices_turn_overdue_once_the_clock_passes_the_due_date() {
    let app = TestApp::new().await;
    let order = billable_work_order(&app, dec!(100.00)).await;
    let invoices = app.state.services.invoices.clone();
    let invoice = invoices
        .create_invoice(CreateInvoiceRequest {
            due_date: Some(NaiveDate::from_ymd_opt(2026, 3, 20).unwrap()),
            ..invoice_request(order.id)
        })
        .await
        .unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Unpaid);

    app.clock.advance(Duration::days(10));
    let reread = invoices.get_invoice(invoice.id).await.unwrap();
    assert_eq!(reread.status, InvoiceStatus::Overdue);

    // Settling an overdue invoice still makes it PAID.
    let receipt = app
        .state
        .services
        .payments
        .record_payment(invoice.id, payment(dec!(100.00)))
        .await
        .unwrap();
    assert_eq!(receipt.invoice.status, InvoiceStatus::Paid);
}

#[tokio::test]
async fn updating_discount_recomputes_totals_but_status_cannot_be_set() {
    let app = TestApp::new().await;
    let order = billable_work_order(&app, dec!(100.00)).await;
    let invoices = app.state.services.invoices.clone();
    let invoice = invoices.create_invoice(invoice_request(order.id)).await.unwrap();

    app.state
        .services
        .payments
        .record_payment(invoice.id, payment(dec!(90.00)))
        .await
        .unwrap();

    let updated = invoices
        .update_invoice(
            invoice.id,
            UpdateInvoiceRequest {
                discount_amount: Some(dec!(10.00)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.total_amount, dec!(90.00));
    assert_eq!(updated.balance_due, Decimal::ZERO);
    assert_eq!(updated.status, InvoiceStatus::Paid);

    let err = invoices
        .update_invoice(
            invoice.id,
            UpdateInvoiceRequest {
                discount_amount: Some(dec!(20.00)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError { .. });

    let err = invoices
        .update_invoice(
            invoice.id,
            UpdateInvoiceRequest {
                status: Some(serde_json::json!("PAID")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError { .. });
}

#[tokio::test]
async fn invoice_with_payments_cannot_be_deleted() {
    let app = TestApp::new().await;
    let order = billable_work_order(&app, dec!(100.00)).await;
    let invoices = app.state.services.invoices.clone();
    let invoice = invoices.create_invoice(invoice_request(order.id)).await.unwrap();
    let receipt = app
        .state
        .services
        .payments
        .record_payment(invoice.id, payment(dec!(10.00)))
        .await
        .unwrap();

    let err = invoices.delete_invoice(invoice.id).await.unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    app.state
        .services
        .payments
        .delete_payment(receipt.payment.id)
        .await
        .unwrap();
    invoices.delete_invoice(invoice.id).await.unwrap();
    assert_matches!(
        invoices.get_invoice(invoice.id).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn concurrent_payments_never_exceed_the_total() {
    let app = TestApp::new().await;
    let order = billable_work_order(&app, dec!(100.00)).await;
    let invoice = app
        .state
        .services
        .invoices
        .create_invoice(invoice_request(order.id))
        .await
        .expect("create invoice");
    let payments = app.state.services.payments.clone();
    let invoice_id = invoice.id;

    let tasks = (0..8).map(|_| {
        let service = payments.clone();
        tokio::spawn(async move { service.record_payment(invoice_id, payment(dec!(30.00))).await })
    });
    let mut accepted = Decimal::ZERO;
    for joined in join_all(tasks).await {
        match joined.unwrap() {
            Ok(receipt) => accepted += receipt.payment.amount,
            Err(err) => assert_matches!(
                err,
                ServiceError::ValidationError { .. } | ServiceError::ConcurrentModification(_)
            ),
        }
    }

    assert!(accepted > Decimal::ZERO);
    assert!(accepted <= invoice.total_amount);
    let stored = app.state.services.invoices.get_invoice(invoice.id).await.unwrap();
    assert_eq!(stored.amount_paid, accepted);
    assert_eq!(stored.balance_due, invoice.total_amount - accepted);
    let recorded: Decimal = payments
        .list_payments(invoice.id)
        .await
        .unwrap()
        .iter()
        .map(|p| p.amount)
        .sum();
    assert_eq!(recorded, accepted);
}
