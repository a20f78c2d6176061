mod common;

use chrono::{TimeZone, Utc};
use common::TestApp;
use futures::future::join_all;
use std::collections::HashSet;
use workshop_api::services::{
    invoicing::CreateInvoiceRequest,
    procurement::CreatePurchaseOrderRequest,
    sequences::{self, INVOICE_PREFIX},
    work_orders::CreateWorkOrderRequest,
};

fn invoice_for(work_order_id: uuid::Uuid) -> CreateInvoiceRequest {
    CreateInvoiceRequest {
        work_order_id,
        tax_amount: None,
        tax_rate: None,
        discount_amount: Default::default(),
        issue_date: None,
        due_date: None,
        notes: None,
    }
}

#[tokio::test]
async fn invoice_numbers_are_sequential_and_restart_each_year() {
    let app = TestApp::new().await;
    let invoices = app.state.services.invoices.clone();

    let mut numbers = Vec::new();
    for _ in 0..3 {
        let order = app.seed_work_order().await;
        numbers.push(
            invoices
                .create_invoice(invoice_for(order.id))
                .await
                .unwrap()
                .invoice_number,
        );
    }
    assert_eq!(
        numbers,
        vec!["INV-2026-00001", "INV-2026-00002", "INV-2026-00003"]
    );

    app.clock
        .set(Utc.with_ymd_and_hms(2027, 1, 2, 9, 0, 0).unwrap());
    let order = app.seed_work_order().await;
    assert_eq!(order.work_order_number, "WO-2027-00001");
    let invoice = invoices.create_invoice(invoice_for(order.id)).await.unwrap();
    assert_eq!(invoice.invoice_number, "INV-2027-00001");
}

#[tokio::test]
async fn each_document_kind_has_its_own_counter() {
    let app = TestApp::new().await;
    let order = app.seed_work_order().await;
    assert_eq!(order.work_order_number, "WO-2026-00001");

    let supplier = app.seed_supplier("Parts Direct").await;
    let po = app
        .state
        .services
        .procurement
        .create_purchase_order(CreatePurchaseOrderRequest {
            supplier_id: supplier.id,
            expected_date: None,
            notes: None,
            items: vec![],
        })
        .await
        .unwrap();
    assert_eq!(po.purchase_order.po_number, "PO-2026-00001");

    let invoice = app
        .state
        .services
        .invoices
        .create_invoice(invoice_for(order.id))
        .await
        .unwrap();
    assert_eq!(invoice.invoice_number, "INV-2026-00001");
}

#[tokio::test]
async fn concurrent_work_orders_get_distinct_numbers() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Okafor").await;
    let vehicle = app.seed_vehicle(customer.id).await;

    let tasks = (0..8).map(|_| {
        let service = app.state.services.work_orders.clone();
        let request = CreateWorkOrderRequest {
            customer_id: customer.id,
            vehicle_id: vehicle.id,
            assigned_mechanic_id: None,
            priority: Default::default(),
            description: None,
            diagnosis: None,
            mileage_in: None,
        };
        tokio::spawn(async move { service.create_work_order(request).await })
    });

    let numbers: HashSet<String> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().work_order_number)
        .collect();
    assert_eq!(numbers.len(), 8);
    for n in 1..=8 {
        assert!(numbers.contains(&format!("WO-2026-{:05}", n)));
    }
}

#[tokio::test]
async fn rolled_back_allocation_releases_the_number() {
    let app = TestApp::new().await;
    let db = app.state.db.clone();

    {
        let txn = workshop_api::db::begin(&db, "test_rollback").await.unwrap();
        let number = sequences::next_number(&txn, INVOICE_PREFIX, 2026).await.unwrap();
        assert_eq!(number, "INV-2026-00001");
        // dropped without commit
    }

    let txn = workshop_api::db::begin(&db, "test_commit").await.unwrap();
    let number = sequences::next_number(&txn, INVOICE_PREFIX, 2026).await.unwrap();
    workshop_api::db::commit(txn, "test_commit").await.unwrap();
    assert_eq!(number, "INV-2026-00001");
}
