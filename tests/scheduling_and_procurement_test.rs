mod common;

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use common::TestApp;
use futures::future::join_all;
use rust_decimal_macros::dec;
use workshop_api::{
    errors::ServiceError,
    models::{AdjustmentType, AppointmentStatus, PurchaseOrderStatus, WorkOrderPriority, WorkOrderStatus},
    services::{
        appointments::{AppointmentStatusRequest, ConvertAppointmentRequest, CreateAppointmentRequest},
        procurement::{
            CreatePurchaseOrderRequest, PurchaseOrderItemRequest, PurchaseOrderStatusRequest,
        },
    },
};

#[tokio::test]
async fn appointment_converts_once_into_a_pending_work_order() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Haddad").await;
    let vehicle = app.seed_vehicle(customer.id).await;
    let mechanic = app.seed_mechanic("Kowalski", dec!(50.00)).await;
    let appointments = app.state.services.appointments.clone();

    let start = Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap();
    let booked = appointments
        .create_appointment(CreateAppointmentRequest {
            customer_id: customer.id,
            vehicle_id: Some(vehicle.id),
            assigned_mechanic_id: Some(mechanic.id),
            scheduled_start: start,
            scheduled_end: start + Duration::hours(2),
            service_description: Some("Annual service".to_string()),
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(booked.status, AppointmentStatus::Scheduled);

    let confirmed = appointments
        .update_status(
            booked.id,
            AppointmentStatusRequest {
                status: AppointmentStatus::Confirmed,
            },
        )
        .await
        .unwrap();
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

    let conversion = appointments
        .convert_to_work_order(
            booked.id,
            ConvertAppointmentRequest {
                priority: WorkOrderPriority::High,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let order = &conversion.work_order;
    assert_eq!(order.status, WorkOrderStatus::Pending);
    assert_eq!(order.customer_id, customer.id);
    assert_eq!(order.vehicle_id, vehicle.id);
    assert_eq!(order.assigned_mechanic_id, Some(mechanic.id));
    assert_eq!(order.appointment_id, Some(booked.id));
    assert_eq!(order.description.as_deref(), Some("Annual service"));
    assert_eq!(conversion.appointment.work_order_id, Some(order.id));
    assert_eq!(conversion.appointment.status, AppointmentStatus::Confirmed);

    let err = appointments
        .convert_to_work_order(booked.id, ConvertAppointmentRequest::default())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn appointment_without_vehicle_or_in_terminal_state_cannot_convert() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Lindqvist").await;
    let appointments = app.state.services.appointments.clone();
    let start = Utc.with_ymd_and_hms(2026, 3, 17, 14, 0, 0).unwrap();

    let request = CreateAppointmentRequest {
        customer_id: customer.id,
        vehicle_id: None,
        assigned_mechanic_id: None,
        scheduled_start: start,
        scheduled_end: start + Duration::minutes(30),
        service_description: None,
        notes: None,
    };
    let no_vehicle = appointments.create_appointment(request.clone()).await.unwrap();
    let err = appointments
        .convert_to_work_order(no_vehicle.id, ConvertAppointmentRequest::default())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError { .. });

    let cancelled = appointments.create_appointment(request).await.unwrap();
    appointments
        .update_status(
            cancelled.id,
            AppointmentStatusRequest {
                status: AppointmentStatus::Cancelled,
            },
        )
        .await
        .unwrap();
    let err = appointments
        .update_status(
            cancelled.id,
            AppointmentStatusRequest {
                status: AppointmentStatus::Confirmed,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition { .. });
    let err = appointments
        .convert_to_work_order(cancelled.id, ConvertAppointmentRequest::default())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError { .. });
}

#[tokio::test]
async fn concurrent_status_changes_settle_on_one_terminal_state() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Okafor").await;
    let appointments = app.state.services.appointments.clone();
    let start = Utc.with_ymd_and_hms(2026, 3, 18, 8, 0, 0).unwrap();
    let booked = appointments
        .create_appointment(CreateAppointmentRequest {
            customer_id: customer.id,
            vehicle_id: None,
            assigned_mechanic_id: None,
            scheduled_start: start,
            scheduled_end: start + Duration::hours(1),
            service_description: None,
            notes: None,
        })
        .await
        .unwrap();
    let id = booked.id;

    let tasks = (0..8).map(|i| {
        let service = appointments.clone();
        let status = if i % 2 == 0 {
            AppointmentStatus::Cancelled
        } else {
            AppointmentStatus::NoShow
        };
        tokio::spawn(async move {
            service
                .update_status(id, AppointmentStatusRequest { status })
                .await
        })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let stored = appointments.get_appointment(booked.id).await.unwrap();
    let mut refused = 0;
    for result in results {
        match result {
            Ok(appointment) => assert_eq!(appointment.status, stored.status),
            Err(err) => {
                assert_matches!(err, ServiceError::InvalidTransition { .. });
                refused += 1;
            }
        }
    }
    assert!(matches!(
        stored.status,
        AppointmentStatus::Cancelled | AppointmentStatus::NoShow
    ));
    assert_eq!(refused, 4);
}

#[tokio::test]
async fn calendar_returns_appointments_starting_in_range() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Moreau").await;
    let appointments = app.state.services.appointments.clone();

    for day in [16, 18, 25] {
        let start = Utc.with_ymd_and_hms(2026, 3, day, 8, 0, 0).unwrap();
        appointments
            .create_appointment(CreateAppointmentRequest {
                customer_id: customer.id,
                vehicle_id: None,
                assigned_mechanic_id: None,
                scheduled_start: start,
                scheduled_end: start + Duration::hours(1),
                service_description: None,
                notes: None,
            })
            .await
            .unwrap();
    }

    let week = appointments
        .list_in_range(
            Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 22, 23, 59, 59).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(week.len(), 2);
    assert!(week[0].scheduled_start < week[1].scheduled_start);
}

#[tokio::test]
async fn receiving_a_purchase_order_adds_stock() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Brake World").await;
    let pads = app.seed_part("PAD-R", 2, dec!(30.00)).await;
    let discs = app.seed_part("DISC-R", 0, dec!(60.00)).await;
    let procurement = app.state.services.procurement.clone();

    let draft = procurement
        .create_purchase_order(CreatePurchaseOrderRequest {
            supplier_id: supplier.id,
            expected_date: None,
            notes: None,
            items: vec![
                PurchaseOrderItemRequest {
                    part_id: pads.id,
                    quantity: 10,
                    unit_cost: Some(dec!(14.00)),
                },
                PurchaseOrderItemRequest {
                    part_id: discs.id,
                    quantity: 4,
                    unit_cost: None,
                },
            ],
        })
        .await
        .unwrap();
    let po = &draft.purchase_order;
    assert_eq!(po.status, PurchaseOrderStatus::Draft);
    assert_eq!(po.total_amount, dec!(260.00));

    let ordered = procurement
        .update_status(
            po.id,
            PurchaseOrderStatusRequest {
                status: PurchaseOrderStatus::Ordered,
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(
        ordered.purchase_order.order_date,
        Some(common::start_instant().date_naive())
    );

    let received = procurement.receive(po.id, None).await.unwrap();
    assert_eq!(received.purchase_order.status, PurchaseOrderStatus::Received);
    assert!(received.purchase_order.received_date.is_some());

    let inventory = app.state.services.inventory.clone();
    assert_eq!(inventory.get_part(pads.id).await.unwrap().quantity_in_stock, 12);
    assert_eq!(inventory.get_part(discs.id).await.unwrap().quantity_in_stock, 4);
    let audit = inventory.list_adjustments(discs.id).await.unwrap();
    assert!(audit.iter().any(|a| a.adjustment_type == AdjustmentType::Add
        && a.reference_type.as_deref() == Some("purchase_order")
        && a.reference_id == Some(po.id)));

    let err = procurement.receive(po.id, None).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition { .. });
    let err = procurement.delete_purchase_order(po.id).await.unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn empty_purchase_order_cannot_be_ordered() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Filters Inc").await;
    let procurement = app.state.services.procurement.clone();
    let draft = procurement
        .create_purchase_order(CreatePurchaseOrderRequest {
            supplier_id: supplier.id,
            expected_date: None,
            notes: None,
            items: vec![],
        })
        .await
        .unwrap();

    let err = procurement
        .update_status(
            draft.purchase_order.id,
            PurchaseOrderStatusRequest {
                status: PurchaseOrderStatus::Ordered,
            },
            None,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError { .. });

    procurement
        .delete_purchase_order(draft.purchase_order.id)
        .await
        .unwrap();
}
