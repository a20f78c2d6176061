mod common;

use assert_matches::assert_matches;
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use workshop_api::{
    errors::ServiceError,
    models::{AdjustmentType, WorkOrderStatus},
    services::{
        invoicing::CreateInvoiceRequest,
        work_orders::{
            AddPartLineRequest, AddServiceLineRequest, AssignMechanicRequest,
            CreateWorkOrderRequest, WorkOrderStatusRequest,
        },
    },
};

fn status(status: WorkOrderStatus) -> WorkOrderStatusRequest {
    WorkOrderStatusRequest { status }
}

#[tokio::test]
async fn lines_drive_totals_and_stock() {
    let app = TestApp::new().await;
    let order = app.seed_work_order().await;
    let service = app.seed_service("Pad replacement", dec!(80.00)).await;
    let part = app.seed_part("PAD-F", 10, dec!(35.25)).await;
    let work_orders = app.state.services.work_orders.clone();

    let detail = work_orders
        .add_service_line(
            order.id,
            AddServiceLineRequest {
                service_id: service.id,
                quantity: 1,
                unit_price: None,
                notes: Some("front axle".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(detail.work_order.total_labor_cost, dec!(80.00));

    let detail = work_orders
        .add_part_line(
            order.id,
            AddPartLineRequest {
                part_id: part.id,
                quantity: 2,
                unit_price: None,
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(detail.work_order.total_parts_cost, dec!(70.50));
    assert_eq!(detail.work_order.total_cost, dec!(150.50));
    assert_eq!(detail.part_lines.len(), 1);
    assert_eq!(detail.service_lines.len(), 1);

    let inventory = app.state.services.inventory.clone();
    assert_eq!(inventory.get_part(part.id).await.unwrap().quantity_in_stock, 8);
    let drawn = inventory
        .list_adjustments(part.id)
        .await
        .unwrap()
        .into_iter()
        .find(|a| a.adjustment_type == AdjustmentType::Remove)
        .expect("draw recorded");
    assert_eq!(drawn.reference_type.as_deref(), Some("work_order"));
    assert_eq!(drawn.reference_id, Some(order.id));

    let line_id = detail.part_lines[0].id;
    let detail = work_orders
        .remove_part_line(order.id, line_id, None)
        .await
        .unwrap();
    assert_eq!(detail.work_order.total_parts_cost, Decimal::ZERO);
    assert_eq!(detail.work_order.total_cost, dec!(80.00));
    assert_eq!(inventory.get_part(part.id).await.unwrap().quantity_in_stock, 10);

    let service_line = detail.service_lines[0].id;
    let detail = work_orders
        .remove_service_line(order.id, service_line)
        .await
        .unwrap();
    assert_eq!(detail.work_order.total_cost, Decimal::ZERO);
}

#[tokio::test]
async fn part_line_needs_enough_stock() {
    let app = TestApp::new().await;
    let order = app.seed_work_order().await;
    let part = app.seed_part("BELT-1", 1, dec!(20.00)).await;

    let err = app
        .state
        .services
        .work_orders
        .add_part_line(
            order.id,
            AddPartLineRequest {
                part_id: part.id,
                quantity: 2,
                unit_price: None,
            },
            None,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError { .. });

    let detail = app
        .state
        .services
        .work_orders
        .get_work_order(order.id)
        .await
        .unwrap();
    assert!(detail.part_lines.is_empty());
    assert_eq!(
        app.state.services.inventory.get_part(part.id).await.unwrap().quantity_in_stock,
        1
    );
}

#[tokio::test]
async fn status_follows_the_lifecycle_and_stamps_dates() {
    let app = TestApp::new().await;
    let order = app.seed_work_order().await;
    let work_orders = app.state.services.work_orders.clone();

    let err = work_orders
        .update_status(order.id, status(WorkOrderStatus::Completed), None)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition { .. });

    let started = work_orders
        .update_status(order.id, status(WorkOrderStatus::InProgress), None)
        .await
        .unwrap();
    assert_eq!(started.start_date, Some(common::start_instant()));

    let same = work_orders
        .update_status(order.id, status(WorkOrderStatus::InProgress), None)
        .await
        .unwrap();
    assert_eq!(same.status, WorkOrderStatus::InProgress);

    app.clock.advance(chrono::Duration::hours(3));
    let done = work_orders
        .update_status(order.id, status(WorkOrderStatus::Completed), None)
        .await
        .unwrap();
    assert_eq!(
        done.completion_date,
        Some(common::start_instant() + chrono::Duration::hours(3))
    );

    let err = work_orders
        .update_status(order.id, status(WorkOrderStatus::Cancelled), None)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition { .. });

    let service = app.seed_service("Alignment", dec!(60.00)).await;
    let err = work_orders
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
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError { .. });
}

#[tokio::test]
async fn cancelling_returns_drawn_parts() {
    let app = TestApp::new().await;
    let order = app.seed_work_order().await;
    let part = app.seed_part("PLUG-4", 8, dec!(9.00)).await;
    let work_orders = app.state.services.work_orders.clone();
    work_orders
        .add_part_line(
            order.id,
            AddPartLineRequest {
                part_id: part.id,
                quantity: 4,
                unit_price: Some(dec!(8.00)),
            },
            None,
        )
        .await
        .unwrap();

    let cancelled = work_orders
        .update_status(order.id, status(WorkOrderStatus::Cancelled), None)
        .await
        .unwrap();
    assert_eq!(cancelled.status, WorkOrderStatus::Cancelled);
    assert_eq!(
        app.state.services.inventory.get_part(part.id).await.unwrap().quantity_in_stock,
        8
    );
}

#[tokio::test]
async fn only_active_mechanics_can_be_assigned() {
    let app = TestApp::new().await;
    let order = app.seed_work_order().await;
    let mechanic = app.seed_mechanic("Nguyen", dec!(45.00)).await;
    let work_orders = app.state.services.work_orders.clone();

    let assigned = work_orders
        .assign_mechanic(
            order.id,
            AssignMechanicRequest {
                mechanic_id: mechanic.id,
            },
        )
        .await
        .unwrap();
    assert_eq!(assigned.assigned_mechanic_id, Some(mechanic.id));

    app.state
        .services
        .employees
        .deactivate_employee(mechanic.id)
        .await
        .unwrap();
    let err = work_orders
        .assign_mechanic(
            order.id,
            AssignMechanicRequest {
                mechanic_id: mechanic.id,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError { .. });
}

#[tokio::test]
async fn vehicle_must_belong_to_the_customer() {
    let app = TestApp::new().await;
    let owner = app.seed_customer("Owner").await;
    let other = app.seed_customer("Other").await;
    let vehicle = app.seed_vehicle(owner.id).await;

    let err = app
        .state
        .services
        .work_orders
        .create_work_order(CreateWorkOrderRequest {
            customer_id: other.id,
            vehicle_id: vehicle.id,
            assigned_mechanic_id: None,
            priority: Default::default(),
            description: None,
            diagnosis: None,
            mileage_in: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError { .. });
}

#[tokio::test]
async fn invoiced_work_orders_cannot_be_deleted() {
    let app = TestApp::new().await;
    let work_orders = app.state.services.work_orders.clone();

    let loose = app.seed_work_order().await;
    let part = app.seed_part("CLIP-2", 5, dec!(1.50)).await;
    work_orders
        .add_part_line(
            loose.id,
            AddPartLineRequest {
                part_id: part.id,
                quantity: 3,
                unit_price: None,
            },
            None,
        )
        .await
        .unwrap();
    work_orders.delete_work_order(loose.id, None).await.unwrap();
    assert_matches!(
        work_orders.get_work_order(loose.id).await,
        Err(ServiceError::NotFound(_))
    );
    assert_eq!(
        app.state.services.inventory.get_part(part.id).await.unwrap().quantity_in_stock,
        5
    );

    let billed = app.seed_work_order().await;
    app.state
        .services
        .invoices
        .create_invoice(CreateInvoiceRequest {
            work_order_id: billed.id,
            tax_amount: None,
            tax_rate: None,
            discount_amount: Decimal::ZERO,
            issue_date: None,
            due_date: None,
            notes: None,
        })
        .await
        .unwrap();
    let err = work_orders.delete_work_order(billed.id, None).await.unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn oversized_line_amounts_are_rejected_without_side_effects() {
    let app = TestApp::new().await;
    let order = app.seed_work_order().await;
    let service = app.seed_service("Engine rebuild", dec!(900.00)).await;
    let part = app.seed_part("CRANK-1", 5, dec!(250.00)).await;
    let work_orders = app.state.services.work_orders.clone();

    let err = work_orders
        .add_service_line(
            order.id,
            AddServiceLineRequest {
                service_id: service.id,
                quantity: 2,
                unit_price: Some(Decimal::MAX),
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError { .. });

    let err = work_orders
        .add_part_line(
            order.id,
            AddPartLineRequest {
                part_id: part.id,
                quantity: 2,
                unit_price: Some(workshop_api::services::MAX_MONEY),
            },
            None,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError { .. });

    let detail = work_orders.get_work_order(order.id).await.unwrap();
    assert!(detail.service_lines.is_empty());
    assert!(detail.part_lines.is_empty());
    assert_eq!(detail.work_order.total_cost, Decimal::ZERO);
    assert_eq!(
        app.state.services.inventory.get_part(part.id).await.unwrap().quantity_in_stock,
        5
    );
}
