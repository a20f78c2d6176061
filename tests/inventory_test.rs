mod common;

use assert_matches::assert_matches;
use chrono::Duration;
use common::TestApp;
use futures::future::join_all;
use rust_decimal_macros::dec;
use workshop_api::{
    errors::ServiceError,
    models::AdjustmentType,
    services::inventory::{CreatePartRequest, PartFilter, StockAdjustmentRequest},
    services::PageRequest,
};

fn adjustment(adjustment_type: AdjustmentType, quantity: i32, reason: &str) -> StockAdjustmentRequest {
    StockAdjustmentRequest {
        adjustment_type,
        quantity,
        reason: reason.to_string(),
    }
}

#[tokio::test]
async fn opening_stock_is_recorded_as_an_adjustment() {
    let app = TestApp::new().await;
    let part = app.seed_part("bp-100", 12, dec!(45.00)).await;
    assert_eq!(part.part_number, "BP-100");
    assert_eq!(part.quantity_in_stock, 12);

    let audit = app
        .state
        .services
        .inventory
        .list_adjustments(part.id)
        .await
        .unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].adjustment_type, AdjustmentType::Add);
    assert_eq!(audit[0].previous_quantity, 0);
    assert_eq!(audit[0].new_quantity, 12);
    assert_eq!(audit[0].reason, "Opening stock");
}

#[tokio::test]
async fn add_remove_and_set_write_an_audit_trail() {
    let app = TestApp::new().await;
    let (admin, _) = app
        .user_with_role("storeman@workshop.test", workshop_api::models::UserRole::Staff)
        .await;
    let part = app.seed_part("OF-1", 10, dec!(8.50)).await;
    let inventory = app.state.services.inventory.clone();

    app.clock.advance(Duration::seconds(1));
    let added = inventory
        .adjust_stock(part.id, adjustment(AdjustmentType::Add, 5, "Delivery"), Some(admin.id))
        .await
        .unwrap();
    assert_eq!(added.part.quantity_in_stock, 15);
    assert_eq!(added.adjustment.previous_quantity, 10);
    assert_eq!(added.adjustment.created_by, Some(admin.id));

    app.clock.advance(Duration::seconds(1));
    let removed = inventory
        .adjust_stock(part.id, adjustment(AdjustmentType::Remove, 4, "Damaged"), None)
        .await
        .unwrap();
    assert_eq!(removed.part.quantity_in_stock, 11);

    app.clock.advance(Duration::seconds(1));
    let counted = inventory
        .adjust_stock(part.id, adjustment(AdjustmentType::Set, 7, "Stock take"), None)
        .await
        .unwrap();
    assert_eq!(counted.adjustment.previous_quantity, 11);
    assert_eq!(counted.adjustment.new_quantity, 7);

    let audit = inventory.list_adjustments(part.id).await.unwrap();
    let reasons: Vec<_> = audit.iter().map(|a| a.reason.as_str()).collect();
    assert_eq!(reasons, vec!["Stock take", "Damaged", "Delivery", "Opening stock"]);
    assert_eq!(inventory.get_part(part.id).await.unwrap().quantity_in_stock, 7);
}

#[tokio::test]
async fn removing_more_than_on_hand_is_rejected_without_side_effects() {
    let app = TestApp::new().await;
    let part = app.seed_part("SP-4", 3, dec!(6.00)).await;
    let inventory = app.state.services.inventory.clone();

    let err = inventory
        .adjust_stock(part.id, adjustment(AdjustmentType::Remove, 4, "Too many"), None)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError { .. });

    let err = inventory
        .adjust_stock(part.id, adjustment(AdjustmentType::Add, 1, "   "), None)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError { .. });

    assert_eq!(inventory.get_part(part.id).await.unwrap().quantity_in_stock, 3);
    assert_eq!(inventory.list_adjustments(part.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_part_numbers_conflict() {
    let app = TestApp::new().await;
    app.seed_part("AF-9", 1, dec!(12.00)).await;

    let err = app
        .state
        .services
        .inventory
        .create_part(
            CreatePartRequest {
                part_number: "af-9".to_string(),
                name: "Air filter".to_string(),
                description: None,
                supplier_id: None,
                quantity_in_stock: 0,
                reorder_level: 0,
                unit_cost: dec!(5.00),
                selling_price: dec!(12.00),
            },
            None,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn low_stock_lists_parts_at_or_below_reorder_level() {
    let app = TestApp::new().await;
    let low = app.seed_part("LOW-1", 2, dec!(10.00)).await;
    app.seed_part("OK-1", 20, dec!(10.00)).await;
    let inventory = app.state.services.inventory.clone();

    let listed = inventory.list_low_stock().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, low.id);

    let filtered = inventory
        .list_parts(
            PartFilter {
                low_stock_only: true,
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(filtered.total, 1);

    inventory.deactivate_part(low.id).await.unwrap();
    assert!(inventory.list_low_stock().await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_removals_never_drive_stock_negative() {
    let app = TestApp::new().await;
    let part = app.seed_part("BRK-9", 10, dec!(22.00)).await;
    let inventory = app.state.services.inventory.clone();
    let part_id = part.id;

    let tasks = (0..12).map(|_| {
        let service = inventory.clone();
        tokio::spawn(async move {
            service
                .adjust_stock(part_id, adjustment(AdjustmentType::Remove, 3, "Workshop use"), None)
                .await
        })
    });
    let mut removed = 0;
    for joined in join_all(tasks).await {
        match joined.unwrap() {
            Ok(result) => {
                assert!(result.part.quantity_in_stock >= 0);
                removed += 1;
            }
            Err(err) => assert_matches!(
                err,
                ServiceError::ValidationError { .. } | ServiceError::ConcurrentModification(_)
            ),
        }
    }

    assert!((1..=3).contains(&removed));
    let stored = inventory.get_part(part.id).await.unwrap();
    assert_eq!(stored.quantity_in_stock, 10 - 3 * removed);
    assert_eq!(inventory.list_adjustments(part.id).await.unwrap().len() as i32, 1 + removed);
}
