//! Parts and stock levels.
//!
//! `quantity_in_stock` only ever changes through [`adjust_stock_in_txn`], which
//! writes a `stock_adjustments` row for every change. The part row is locked
//! for the duration of the transaction and the update carries an optimistic
//! guard on the previous quantity, so a lost race surfaces as a conflict
//! instead of a silently overwritten count.

use crate::{
    clock::Clock,
    db::{self, DbPool},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        part::{self, Entity as Part},
        stock_adjustment::{self, Entity as StockAdjustment},
        supplier::Entity as Supplier,
        AdjustmentType,
    },
    services::{
        fetch_page, round_money, search_term, trimmed, validate_amount,
        validate_not_blank, Page, PageRequest,
    },
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePartRequest {
    #[validate(length(min = 1, max = 64))]
    pub part_number: String,
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    pub description: Option<String>,
    pub supplier_id: Option<Uuid>,
    /// Opening stock, recorded as an ADD adjustment
    #[validate(range(min = 0))]
    #[serde(default)]
    pub quantity_in_stock: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub reorder_level: i32,
    #[validate(custom = "validate_amount")]
    pub unit_cost: Decimal,
    #[validate(custom = "validate_amount")]
    pub selling_price: Decimal,
}

/// Stock is not editable here; use a stock adjustment.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePartRequest {
    #[validate(length(min = 1, max = 64))]
    pub part_number: Option<String>,
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub supplier_id: Option<Uuid>,
    #[validate(range(min = 0))]
    pub reorder_level: Option<i32>,
    #[validate(custom = "validate_amount")]
    pub unit_cost: Option<Decimal>,
    #[validate(custom = "validate_amount")]
    pub selling_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PartFilter {
    /// Matches part number or name
    pub search: Option<String>,
    pub supplier_id: Option<Uuid>,
    #[serde(default)]
    pub low_stock_only: bool,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StockAdjustmentRequest {
    pub adjustment_type: AdjustmentType,
    /// Amount to add or remove, or the new absolute level for SET
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[validate(custom = "validate_not_blank", length(max = 500))]
    pub reason: String,
}

/// Source document recorded on an adjustment.
#[derive(Debug, Clone, Copy)]
pub struct AdjustmentReference {
    pub reference_type: &'static str,
    pub reference_id: Uuid,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StockAdjustmentResult {
    #[schema(value_type = part::Model)]
    pub part: part::Model,
    #[schema(value_type = stock_adjustment::Model)]
    pub adjustment: stock_adjustment::Model,
}

/// Computes the stock level after an adjustment.
///
/// ADD and REMOVE take a strictly positive delta; SET takes any non-negative
/// level. A REMOVE that would go below zero is rejected, never clamped.
pub fn apply_adjustment(
    current: i32,
    adjustment_type: AdjustmentType,
    quantity: i32,
) -> Result<i32, ServiceError> {
    match adjustment_type {
        AdjustmentType::Add | AdjustmentType::Remove if quantity <= 0 => Err(
            ServiceError::invalid_field("quantity", "Quantity must be greater than zero"),
        ),
        AdjustmentType::Set if quantity < 0 => Err(ServiceError::invalid_field(
            "quantity",
            "Stock level cannot be negative",
        )),
        AdjustmentType::Add => current.checked_add(quantity).ok_or_else(|| {
            ServiceError::invalid_field("quantity", "Resulting stock level is too large")
        }),
        AdjustmentType::Remove => {
            if quantity > current {
                Err(ServiceError::invalid_field(
                    "quantity",
                    format!(
                        "Cannot remove {} units; only {} in stock",
                        quantity, current
                    ),
                ))
            } else {
                Ok(current - quantity)
            }
        }
        AdjustmentType::Set => Ok(quantity),
    }
}

/// Applies one stock adjustment inside the caller's transaction.
#[instrument(skip_all, fields(%part_id, %adjustment_type, quantity))]
#[allow(clippy::too_many_arguments)]
pub(crate) async fn adjust_stock_in_txn<C>(
    conn: &C,
    part_id: Uuid,
    adjustment_type: AdjustmentType,
    quantity: i32,
    reason: &str,
    reference: Option<AdjustmentReference>,
    actor: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<StockAdjustmentResult, ServiceError>
where
    C: ConnectionTrait,
{
    if reason.trim().is_empty() {
        return Err(ServiceError::invalid_field("reason", "Reason is required"));
    }

    let part = Part::find_by_id(part_id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Part", part_id))?;

    let previous = part.quantity_in_stock;
    let new_quantity = apply_adjustment(previous, adjustment_type, quantity)?;

    let updated = Part::update_many()
        .col_expr(part::Column::QuantityInStock, Expr::value(new_quantity))
        .col_expr(part::Column::UpdatedAt, Expr::value(now))
        .filter(part::Column::Id.eq(part_id))
        .filter(part::Column::QuantityInStock.eq(previous))
        .exec(conn)
        .await?;
    if updated.rows_affected != 1 {
        warn!(%part_id, previous, "stock changed underneath adjustment");
        return Err(ServiceError::ConcurrentModification(part_id));
    }

    let adjustment = stock_adjustment::ActiveModel {
        id: Set(Uuid::new_v4()),
        part_id: Set(part_id),
        adjustment_type: Set(adjustment_type),
        quantity: Set(quantity),
        previous_quantity: Set(previous),
        new_quantity: Set(new_quantity),
        reason: Set(reason.trim().to_string()),
        reference_type: Set(reference.map(|r| r.reference_type.to_string())),
        reference_id: Set(reference.map(|r| r.reference_id)),
        created_by: Set(actor),
        created_at: Set(now),
    }
    .insert(conn)
    .await?;

    let part = part::Model {
        quantity_in_stock: new_quantity,
        updated_at: now,
        ..part
    };
    Ok(StockAdjustmentResult { part, adjustment })
}

/// Publishes the events for committed adjustments.
pub(crate) async fn publish_adjustments(
    event_sender: &EventSender,
    results: &[StockAdjustmentResult],
) {
    for result in results {
        event_sender
            .send(Event::StockAdjusted {
                part_id: result.part.id,
                adjustment_type: result.adjustment.adjustment_type.to_string(),
                previous_quantity: result.adjustment.previous_quantity,
                new_quantity: result.adjustment.new_quantity,
            })
            .await;
        if result.part.is_active && result.part.is_low_stock() {
            event_sender
                .send(Event::LowStock {
                    part_id: result.part.id,
                    part_number: result.part.part_number.clone(),
                    quantity_in_stock: result.part.quantity_in_stock,
                    reorder_level: result.part.reorder_level,
                })
                .await;
        }
    }
}

pub struct InventoryService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    clock: Arc<dyn Clock>,
}

impl InventoryService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            event_sender,
            clock,
        }
    }

    #[instrument(skip(self, request), fields(part_number = %request.part_number))]
    pub async fn create_part(
        &self,
        request: CreatePartRequest,
        actor: Option<Uuid>,
    ) -> Result<part::Model, ServiceError> {
        request.validate()?;
        if let Some(supplier_id) = request.supplier_id {
            Supplier::find_by_id(supplier_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::not_found("Supplier", supplier_id))?;
        }
        let now = self.clock.now();
        let txn = db::begin(&self.db, "create_part").await?;

        let mut created = part::ActiveModel {
            id: Set(Uuid::new_v4()),
            part_number: Set(request.part_number.trim().to_uppercase()),
            name: Set(request.name.trim().to_string()),
            description: Set(trimmed(request.description)),
            supplier_id: Set(request.supplier_id),
            quantity_in_stock: Set(0),
            reorder_level: Set(request.reorder_level),
            unit_cost: Set(round_money(request.unit_cost)),
            selling_price: Set(round_money(request.selling_price)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::from_db(e, "A part with this part number already exists"))?;

        if request.quantity_in_stock > 0 {
            let opening = adjust_stock_in_txn(
                &txn,
                created.id,
                AdjustmentType::Add,
                request.quantity_in_stock,
                "Opening stock",
                None,
                actor,
                now,
            )
            .await?;
            created = opening.part;
        }

        db::commit(txn, "create_part").await?;
        info!(part_id = %created.id, "part created");
        Ok(created)
    }

    pub async fn get_part(&self, id: Uuid) -> Result<part::Model, ServiceError> {
        Part::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Part", id))
    }

    pub async fn list_parts(
        &self,
        filter: PartFilter,
        page: PageRequest,
    ) -> Result<Page<part::Model>, ServiceError> {
        let mut query = Part::find();
        if !filter.include_inactive {
            query = query.filter(part::Column::IsActive.eq(true));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(part::Column::SupplierId.eq(supplier_id));
        }
        if filter.low_stock_only {
            query = query.filter(
                Expr::col(part::Column::QuantityInStock).lte(Expr::col(part::Column::ReorderLevel)),
            );
        }
        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(
                Condition::any()
                    .add(part::Column::PartNumber.contains(term.to_uppercase()))
                    .add(part::Column::Name.contains(&term)),
            );
        }
        fetch_page(
            query.order_by_asc(part::Column::PartNumber),
            &*self.db,
            page,
        )
        .await
    }

    /// Active parts at or below their reorder level.
    pub async fn list_low_stock(&self) -> Result<Vec<part::Model>, ServiceError> {
        Ok(Part::find()
            .filter(part::Column::IsActive.eq(true))
            .filter(
                Expr::col(part::Column::QuantityInStock).lte(Expr::col(part::Column::ReorderLevel)),
            )
            .order_by_asc(part::Column::QuantityInStock)
            .order_by_asc(part::Column::PartNumber)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update_part(
        &self,
        id: Uuid,
        request: UpdatePartRequest,
    ) -> Result<part::Model, ServiceError> {
        request.validate()?;
        let mut active: part::ActiveModel = self.get_part(id).await?.into();

        if let Some(part_number) = request.part_number {
            active.part_number = Set(part_number.trim().to_uppercase());
        }
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if request.description.is_some() {
            active.description = Set(trimmed(request.description));
        }
        if let Some(supplier_id) = request.supplier_id {
            Supplier::find_by_id(supplier_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::not_found("Supplier", supplier_id))?;
            active.supplier_id = Set(Some(supplier_id));
        }
        if let Some(level) = request.reorder_level {
            active.reorder_level = Set(level);
        }
        if let Some(cost) = request.unit_cost {
            active.unit_cost = Set(round_money(cost));
        }
        if let Some(price) = request.selling_price {
            active.selling_price = Set(round_money(price));
        }
        active.updated_at = Set(self.clock.now());

        active
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "A part with this part number already exists"))
    }

    #[instrument(skip(self))]
    pub async fn deactivate_part(&self, id: Uuid) -> Result<part::Model, ServiceError> {
        let mut active: part::ActiveModel = self.get_part(id).await?.into();
        active.is_active = Set(false);
        active.updated_at = Set(self.clock.now());
        let updated = active.update(&*self.db).await?;
        info!(part_id = %id, "part deactivated");
        Ok(updated)
    }

    /// Manual stock adjustment (stock take, damage, correction).
    #[instrument(skip(self, request), fields(adjustment_type = %request.adjustment_type, quantity = request.quantity))]
    pub async fn adjust_stock(
        &self,
        part_id: Uuid,
        request: StockAdjustmentRequest,
        actor: Option<Uuid>,
    ) -> Result<StockAdjustmentResult, ServiceError> {
        request.validate()?;
        let txn = db::begin(&self.db, "adjust_stock").await?;

        let result = adjust_stock_in_txn(
            &txn,
            part_id,
            request.adjustment_type,
            request.quantity,
            &request.reason,
            None,
            actor,
            self.clock.now(),
        )
        .await?;

        db::commit(txn, "adjust_stock").await?;
        info!(
            %part_id,
            previous = result.adjustment.previous_quantity,
            new = result.adjustment.new_quantity,
            "stock adjusted"
        );
        publish_adjustments(&self.event_sender, std::slice::from_ref(&result)).await;
        Ok(result)
    }

    /// Audit trail for a part, newest first.
    pub async fn list_adjustments(
        &self,
        part_id: Uuid,
    ) -> Result<Vec<stock_adjustment::Model>, ServiceError> {
        self.get_part(part_id).await?;
        Ok(StockAdjustment::find()
            .filter(stock_adjustment::Column::PartId.eq(part_id))
            .order_by_desc(stock_adjustment::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }
}
