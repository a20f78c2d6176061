//! Purchase orders to suppliers and their receipt into stock.

use crate::{
    clock::Clock,
    db::{self, DbPool},
    errors::ServiceError,
    events::{Event, EventSender},
    lifecycle::{apply_transition, Transition},
    models::{
        part::Entity as Part,
        purchase_order::{self, Entity as PurchaseOrder},
        purchase_order_item::{self, Entity as PurchaseOrderItem},
        supplier::Entity as Supplier,
        AdjustmentType, PurchaseOrderStatus,
    },
    services::{
        checked_money, fetch_page,
        inventory::{adjust_stock_in_txn, publish_adjustments, AdjustmentReference, StockAdjustmentResult},
        round_money, search_term,
        sequences::{self, PURCHASE_ORDER_PREFIX},
        trimmed, validate_amount,
        work_orders::line_total,
        Page, PageRequest,
    },
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

const REFERENCE_TYPE: &str = "purchase_order";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PurchaseOrderItemRequest {
    pub part_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    /// Defaults to the part's unit cost
    #[validate(custom = "validate_amount")]
    pub unit_cost: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseOrderRequest {
    pub supplier_id: Uuid,
    pub expected_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[validate]
    #[serde(default)]
    pub items: Vec<PurchaseOrderItemRequest>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePurchaseOrderRequest {
    pub expected_date: Option<NaiveDate>,
    pub notes: Option<String>,
    /// Replaces every item; only allowed while DRAFT
    #[validate]
    pub items: Option<Vec<PurchaseOrderItemRequest>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PurchaseOrderStatusRequest {
    pub status: PurchaseOrderStatus,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PurchaseOrderFilter {
    pub status: Option<PurchaseOrderStatus>,
    pub supplier_id: Option<Uuid>,
    /// Matches the PO number
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurchaseOrderDetail {
    #[schema(value_type = purchase_order::Model)]
    pub purchase_order: purchase_order::Model,
    #[schema(value_type = Vec<purchase_order_item::Model>)]
    pub items: Vec<purchase_order_item::Model>,
}

/// Replaces the items of a purchase order and returns the new total.
async fn write_items<C>(
    conn: &C,
    purchase_order_id: Uuid,
    items: Vec<PurchaseOrderItemRequest>,
) -> Result<Decimal, ServiceError>
where
    C: ConnectionTrait,
{
    PurchaseOrderItem::delete_many()
        .filter(purchase_order_item::Column::PurchaseOrderId.eq(purchase_order_id))
        .exec(conn)
        .await?;

    let mut total = Decimal::ZERO;
    for item in items {
        let part = Part::find_by_id(item.part_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Part", item.part_id))?;
        if !part.is_active {
            return Err(ServiceError::invalid_field("items", format!(
                "Part {} is inactive",
                part.part_number
            )));
        }
        let unit_cost = round_money(item.unit_cost.unwrap_or(part.unit_cost));
        let line_cost = line_total(unit_cost, item.quantity)?;
        total = checked_money("items", total.checked_add(line_cost))?;

        purchase_order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            purchase_order_id: Set(purchase_order_id),
            part_id: Set(part.id),
            quantity: Set(item.quantity),
            unit_cost: Set(unit_cost),
            total_cost: Set(line_cost),
        }
        .insert(conn)
        .await?;
    }
    Ok(round_money(total))
}

async fn load_items<C>(
    conn: &C,
    purchase_order_id: Uuid,
) -> Result<Vec<purchase_order_item::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(PurchaseOrderItem::find()
        .filter(purchase_order_item::Column::PurchaseOrderId.eq(purchase_order_id))
        .all(conn)
        .await?)
}

/// Adds every item's quantity to stock, attributed to the purchase order.
async fn receive_items<C>(
    conn: &C,
    order: &purchase_order::Model,
    actor: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<Vec<StockAdjustmentResult>, ServiceError>
where
    C: ConnectionTrait,
{
    let reason = format!("Received on purchase order {}", order.po_number);
    let items = load_items(conn, order.id).await?;
    let mut results = Vec::with_capacity(items.len());
    for item in items {
        results.push(
            adjust_stock_in_txn(
                conn,
                item.part_id,
                AdjustmentType::Add,
                item.quantity,
                &reason,
                Some(AdjustmentReference {
                    reference_type: REFERENCE_TYPE,
                    reference_id: order.id,
                }),
                actor,
                now,
            )
            .await?,
        );
    }
    Ok(results)
}

pub struct ProcurementService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    clock: Arc<dyn Clock>,
}

impl ProcurementService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            event_sender,
            clock,
        }
    }

    #[instrument(skip(self, request), fields(supplier_id = %request.supplier_id, items = request.items.len()))]
    pub async fn create_purchase_order(
        &self,
        request: CreatePurchaseOrderRequest,
    ) -> Result<PurchaseOrderDetail, ServiceError> {
        request.validate()?;
        let now = self.clock.now();
        let txn = db::begin(&self.db, "create_purchase_order").await?;

        let supplier = Supplier::find_by_id(request.supplier_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Supplier", request.supplier_id))?;
        if !supplier.is_active {
            return Err(ServiceError::invalid_field("supplier_id", "Supplier is inactive"));
        }

        let po_number = sequences::next_number(&txn, PURCHASE_ORDER_PREFIX, now.year()).await?;
        let order = purchase_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            po_number: Set(po_number),
            supplier_id: Set(supplier.id),
            status: Set(PurchaseOrderStatus::Draft),
            order_date: Set(None),
            expected_date: Set(request.expected_date),
            received_date: Set(None),
            notes: Set(trimmed(request.notes)),
            total_amount: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::from_db(e, "Purchase order number already in use"))?;

        let total = write_items(&txn, order.id, request.items).await?;
        let mut active: purchase_order::ActiveModel = order.into();
        active.total_amount = Set(total);
        let order = active.update(&txn).await?;
        let items = load_items(&txn, order.id).await?;

        db::commit(txn, "create_purchase_order").await?;
        info!(purchase_order_id = %order.id, number = %order.po_number, "purchase order created");
        Ok(PurchaseOrderDetail {
            purchase_order: order,
            items,
        })
    }

    pub async fn get_purchase_order(&self, id: Uuid) -> Result<PurchaseOrderDetail, ServiceError> {
        let order = PurchaseOrder::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Purchase order", id))?;
        let items = load_items(&*self.db, id).await?;
        Ok(PurchaseOrderDetail {
            purchase_order: order,
            items,
        })
    }

    pub async fn list_purchase_orders(
        &self,
        filter: PurchaseOrderFilter,
        page: PageRequest,
    ) -> Result<Page<purchase_order::Model>, ServiceError> {
        let mut query = PurchaseOrder::find();
        if let Some(status) = filter.status {
            query = query.filter(purchase_order::Column::Status.eq(status));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(purchase_order::Column::SupplierId.eq(supplier_id));
        }
        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(purchase_order::Column::PoNumber.contains(term.to_uppercase()));
        }
        fetch_page(
            query.order_by_desc(purchase_order::Column::CreatedAt),
            &*self.db,
            page,
        )
        .await
    }

    #[instrument(skip(self, request))]
    pub async fn update_purchase_order(
        &self,
        id: Uuid,
        request: UpdatePurchaseOrderRequest,
    ) -> Result<PurchaseOrderDetail, ServiceError> {
        request.validate()?;
        let now = self.clock.now();
        let txn = db::begin(&self.db, "update_purchase_order").await?;
        let order = self.lock(&txn, id).await?;

        let mut active: purchase_order::ActiveModel = order.clone().into();
        if let Some(items) = request.items {
            if order.status != PurchaseOrderStatus::Draft {
                return Err(ServiceError::validation(format!(
                    "Items of a {} purchase order cannot be changed",
                    order.status
                )));
            }
            active.total_amount = Set(write_items(&txn, id, items).await?);
        }
        if request.expected_date.is_some() {
            active.expected_date = Set(request.expected_date);
        }
        if request.notes.is_some() {
            active.notes = Set(trimmed(request.notes));
        }
        active.updated_at = Set(now);
        let order = active.update(&txn).await?;
        let items = load_items(&txn, id).await?;

        db::commit(txn, "update_purchase_order").await?;
        Ok(PurchaseOrderDetail {
            purchase_order: order,
            items,
        })
    }

    /// Moves the order through its lifecycle.
    ///
    /// ORDERED stamps `order_date`; RECEIVED stamps `received_date` and adds
    /// every item to stock in the same transaction.
    #[instrument(skip(self, request), fields(status = %request.status))]
    pub async fn update_status(
        &self,
        id: Uuid,
        request: PurchaseOrderStatusRequest,
        actor: Option<Uuid>,
    ) -> Result<PurchaseOrderDetail, ServiceError> {
        let now = self.clock.now();
        let txn = db::begin(&self.db, "purchase_order_status").await?;
        let order = self.lock(&txn, id).await?;

        let (from, to) = match apply_transition(order.status, request.status)? {
            Transition::Unchanged(_) => {
                let items = load_items(&txn, id).await?;
                db::commit(txn, "purchase_order_status").await?;
                return Ok(PurchaseOrderDetail {
                    purchase_order: order,
                    items,
                });
            }
            Transition::Changed { from, to } => (from, to),
        };

        let today = now.date_naive();
        let mut received = Vec::new();
        let mut active: purchase_order::ActiveModel = order.clone().into();
        match to {
            PurchaseOrderStatus::Ordered => {
                if load_items(&txn, id).await?.is_empty() {
                    return Err(ServiceError::validation(
                        "A purchase order needs at least one item before it is ordered",
                    ));
                }
                if order.order_date.is_none() {
                    active.order_date = Set(Some(today));
                }
            }
            PurchaseOrderStatus::Received => {
                received = receive_items(&txn, &order, actor, now).await?;
                active.received_date = Set(Some(today));
            }
            PurchaseOrderStatus::Draft | PurchaseOrderStatus::Cancelled => {}
        }
        active.status = Set(to);
        active.updated_at = Set(now);
        let order = active.update(&txn).await?;
        let items = load_items(&txn, id).await?;
        db::commit(txn, "purchase_order_status").await?;

        info!(purchase_order_id = %id, %from, %to, "purchase order status changed");
        self.event_sender
            .send(Event::PurchaseOrderStatusChanged {
                purchase_order_id: id,
                old_status: from.to_string(),
                new_status: to.to_string(),
            })
            .await;
        if to == PurchaseOrderStatus::Received {
            self.event_sender
                .send(Event::PurchaseOrderReceived {
                    purchase_order_id: id,
                    po_number: order.po_number.clone(),
                    items: received.len(),
                })
                .await;
            publish_adjustments(&self.event_sender, &received).await;
        }

        Ok(PurchaseOrderDetail {
            purchase_order: order,
            items,
        })
    }

    /// Shorthand for moving an ORDERED purchase order to RECEIVED.
    pub async fn receive(
        &self,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<PurchaseOrderDetail, ServiceError> {
        let current = PurchaseOrder::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Purchase order", id))?;
        if current.status == PurchaseOrderStatus::Received {
            return Err(ServiceError::InvalidTransition {
                entity: "purchase order",
                from: current.status.to_string(),
                to: PurchaseOrderStatus::Received.to_string(),
            });
        }
        self.update_status(
            id,
            PurchaseOrderStatusRequest {
                status: PurchaseOrderStatus::Received,
            },
            actor,
        )
        .await
    }

    /// Hard delete, only for orders that never reached a supplier or were cancelled.
    #[instrument(skip(self))]
    pub async fn delete_purchase_order(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = db::begin(&self.db, "delete_purchase_order").await?;
        let order = self.lock(&txn, id).await?;
        if !matches!(
            order.status,
            PurchaseOrderStatus::Draft | PurchaseOrderStatus::Cancelled
        ) {
            return Err(ServiceError::Conflict(format!(
                "Purchase order {} is {} and cannot be deleted",
                order.po_number, order.status
            )));
        }
        PurchaseOrderItem::delete_many()
            .filter(purchase_order_item::Column::PurchaseOrderId.eq(id))
            .exec(&txn)
            .await?;
        order.delete(&txn).await?;
        db::commit(txn, "delete_purchase_order").await?;
        info!(purchase_order_id = %id, "purchase order deleted");
        Ok(())
    }

    async fn lock<C>(&self, conn: &C, id: Uuid) -> Result<purchase_order::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        PurchaseOrder::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Purchase order", id))
    }
}
