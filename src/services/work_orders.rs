//! Work orders and their service and part lines.
//!
//! Totals on the work order are always a function of its lines and are
//! recomputed in the same transaction as any line change. Part lines draw
//! stock through inventory adjustments; cancelling or deleting an unfinished
//! job puts that stock back.

use crate::{
    clock::Clock,
    db::{self, DbPool},
    errors::ServiceError,
    events::{Event, EventSender},
    lifecycle::{apply_transition, LifecycleStatus, Transition},
    models::{
        customer::Entity as Customer,
        invoice::{self, Entity as Invoice},
        part::Entity as Part,
        service::Entity as Service,
        vehicle::Entity as Vehicle,
        work_order::{self, Entity as WorkOrder},
        work_order_part::{self, Entity as PartLine},
        work_order_service::{self, Entity as ServiceLine},
        appointment::{self, Entity as Appointment},
        AdjustmentType, WorkOrderPriority, WorkOrderStatus,
    },
    services::{
        employees::require_mechanic,
        fetch_page,
        inventory::{adjust_stock_in_txn, publish_adjustments, AdjustmentReference, StockAdjustmentResult},
        checked_money, round_money, search_term,
        sequences::{self, WORK_ORDER_PREFIX},
        trimmed, validate_amount, Page, PageRequest,
    },
};
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

const REFERENCE_TYPE: &str = "work_order";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateWorkOrderRequest {
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub assigned_mechanic_id: Option<Uuid>,
    #[serde(default)]
    pub priority: WorkOrderPriority,
    pub description: Option<String>,
    pub diagnosis: Option<String>,
    #[validate(range(min = 0))]
    pub mileage_in: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateWorkOrderRequest {
    pub priority: Option<WorkOrderPriority>,
    pub description: Option<String>,
    pub diagnosis: Option<String>,
    #[validate(range(min = 0))]
    pub mileage_in: Option<i32>,
    #[validate(custom = "validate_amount")]
    pub actual_hours: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WorkOrderStatusRequest {
    pub status: WorkOrderStatus,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignMechanicRequest {
    pub mechanic_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddServiceLineRequest {
    pub service_id: Uuid,
    #[validate(range(min = 1))]
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    /// Defaults to the service's base price
    #[validate(custom = "validate_amount")]
    pub unit_price: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddPartLineRequest {
    pub part_id: Uuid,
    #[validate(range(min = 1))]
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    /// Defaults to the part's selling price
    #[validate(custom = "validate_amount")]
    pub unit_price: Option<Decimal>,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WorkOrderFilter {
    pub status: Option<WorkOrderStatus>,
    pub priority: Option<WorkOrderPriority>,
    pub customer_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub mechanic_id: Option<Uuid>,
    /// Matches the work order number
    pub search: Option<String>,
}

/// A work order with its lines.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkOrderDetail {
    #[schema(value_type = work_order::Model)]
    pub work_order: work_order::Model,
    #[schema(value_type = Vec<work_order_service::Model>)]
    pub service_lines: Vec<work_order_service::Model>,
    #[schema(value_type = Vec<work_order_part::Model>)]
    pub part_lines: Vec<work_order_part::Model>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkOrderTotals {
    pub labor: Decimal,
    pub parts: Decimal,
    pub total: Decimal,
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Result<Decimal, ServiceError> {
    checked_money("quantity", unit_price.checked_mul(Decimal::from(quantity)))
}

fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Result<Decimal, ServiceError> {
    amounts.into_iter().try_fold(Decimal::ZERO, |acc, amount| {
        checked_money("total_cost", acc.checked_add(amount))
    })
}

pub fn sum_totals(
    service_line_totals: impl IntoIterator<Item = Decimal>,
    part_line_totals: impl IntoIterator<Item = Decimal>,
) -> Result<WorkOrderTotals, ServiceError> {
    let labor = checked_sum(service_line_totals)?;
    let parts = checked_sum(part_line_totals)?;
    Ok(WorkOrderTotals {
        labor,
        parts,
        total: checked_money("total_cost", labor.checked_add(parts))?,
    })
}

/// Fields for a new work order; shared with appointment conversion.
#[derive(Debug, Clone)]
pub(crate) struct NewWorkOrder {
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub assigned_mechanic_id: Option<Uuid>,
    pub appointment_id: Option<Uuid>,
    pub priority: WorkOrderPriority,
    pub description: Option<String>,
    pub diagnosis: Option<String>,
    pub mileage_in: Option<i32>,
}

/// Validates references and inserts a PENDING work order with a fresh number.
pub(crate) async fn insert_work_order<C>(
    conn: &C,
    draft: NewWorkOrder,
    now: DateTime<Utc>,
) -> Result<work_order::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let customer = Customer::find_by_id(draft.customer_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Customer", draft.customer_id))?;
    if !customer.is_active {
        return Err(ServiceError::invalid_field(
            "customer_id",
            "Customer is inactive",
        ));
    }

    let vehicle = Vehicle::find_by_id(draft.vehicle_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Vehicle", draft.vehicle_id))?;
    if vehicle.customer_id != customer.id {
        return Err(ServiceError::invalid_field(
            "vehicle_id",
            "Vehicle does not belong to this customer",
        ));
    }

    if let Some(mechanic_id) = draft.assigned_mechanic_id {
        require_mechanic(conn, mechanic_id, "assigned_mechanic_id").await?;
    }

    let number = sequences::next_number(conn, WORK_ORDER_PREFIX, now.year()).await?;

    let created = work_order::ActiveModel {
        id: Set(Uuid::new_v4()),
        work_order_number: Set(number),
        customer_id: Set(customer.id),
        vehicle_id: Set(vehicle.id),
        assigned_mechanic_id: Set(draft.assigned_mechanic_id),
        appointment_id: Set(draft.appointment_id),
        status: Set(WorkOrderStatus::Pending),
        priority: Set(draft.priority),
        description: Set(trimmed(draft.description)),
        diagnosis: Set(trimmed(draft.diagnosis)),
        mileage_in: Set(draft.mileage_in),
        actual_hours: Set(None),
        start_date: Set(None),
        completion_date: Set(None),
        total_labor_cost: Set(Decimal::ZERO),
        total_parts_cost: Set(Decimal::ZERO),
        total_cost: Set(Decimal::ZERO),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(|e| ServiceError::from_db(e, "Work order number already in use"))?;

    Ok(created)
}

/// Re-reads the lines and writes fresh totals onto the work order.
pub(crate) async fn recompute_totals<C>(
    conn: &C,
    work_order: work_order::Model,
    now: DateTime<Utc>,
) -> Result<work_order::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let service_lines = ServiceLine::find()
        .filter(work_order_service::Column::WorkOrderId.eq(work_order.id))
        .all(conn)
        .await?;
    let part_lines = PartLine::find()
        .filter(work_order_part::Column::WorkOrderId.eq(work_order.id))
        .all(conn)
        .await?;

    let totals = sum_totals(
        service_lines.iter().map(|l| l.total_price),
        part_lines.iter().map(|l| l.total_price),
    )?;

    if totals.labor == work_order.total_labor_cost
        && totals.parts == work_order.total_parts_cost
        && totals.total == work_order.total_cost
    {
        return Ok(work_order);
    }

    let mut active: work_order::ActiveModel = work_order.into();
    active.total_labor_cost = Set(totals.labor);
    active.total_parts_cost = Set(totals.parts);
    active.total_cost = Set(totals.total);
    active.updated_at = Set(now);
    Ok(active.update(conn).await?)
}

pub(crate) async fn lock_work_order<C>(
    conn: &C,
    id: Uuid,
) -> Result<work_order::Model, ServiceError>
where
    C: ConnectionTrait,
{
    WorkOrder::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Work order", id))
}

async fn load_detail<C>(
    conn: &C,
    work_order: work_order::Model,
) -> Result<WorkOrderDetail, ServiceError>
where
    C: ConnectionTrait,
{
    let service_lines = ServiceLine::find()
        .filter(work_order_service::Column::WorkOrderId.eq(work_order.id))
        .order_by_asc(work_order_service::Column::CreatedAt)
        .all(conn)
        .await?;
    let part_lines = PartLine::find()
        .filter(work_order_part::Column::WorkOrderId.eq(work_order.id))
        .order_by_asc(work_order_part::Column::CreatedAt)
        .all(conn)
        .await?;
    Ok(WorkOrderDetail {
        work_order,
        service_lines,
        part_lines,
    })
}

fn ensure_lines_editable(work_order: &work_order::Model) -> Result<(), ServiceError> {
    if work_order.status.allows_line_changes() {
        Ok(())
    } else {
        Err(ServiceError::validation(format!(
            "Lines of a {} work order cannot be changed",
            work_order.status
        )))
    }
}

/// Puts the stock drawn by every part line back into inventory.
async fn return_part_stock<C>(
    conn: &C,
    work_order: &work_order::Model,
    reason: &str,
    actor: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<Vec<StockAdjustmentResult>, ServiceError>
where
    C: ConnectionTrait,
{
    let part_lines = PartLine::find()
        .filter(work_order_part::Column::WorkOrderId.eq(work_order.id))
        .all(conn)
        .await?;

    let mut results = Vec::with_capacity(part_lines.len());
    for line in part_lines {
        results.push(
            adjust_stock_in_txn(
                conn,
                line.part_id,
                AdjustmentType::Add,
                line.quantity,
                reason,
                Some(AdjustmentReference {
                    reference_type: REFERENCE_TYPE,
                    reference_id: work_order.id,
                }),
                actor,
                now,
            )
            .await?,
        );
    }
    Ok(results)
}

pub struct WorkOrderService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    clock: Arc<dyn Clock>,
}

impl WorkOrderService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            event_sender,
            clock,
        }
    }

    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, vehicle_id = %request.vehicle_id))]
    pub async fn create_work_order(
        &self,
        request: CreateWorkOrderRequest,
    ) -> Result<work_order::Model, ServiceError> {
        request.validate()?;
        let now = self.clock.now();
        let txn = db::begin(&self.db, "create_work_order").await?;

        let created = insert_work_order(
            &txn,
            NewWorkOrder {
                customer_id: request.customer_id,
                vehicle_id: request.vehicle_id,
                assigned_mechanic_id: request.assigned_mechanic_id,
                appointment_id: None,
                priority: request.priority,
                description: request.description,
                diagnosis: request.diagnosis,
                mileage_in: request.mileage_in,
            },
            now,
        )
        .await?;

        db::commit(txn, "create_work_order").await?;
        info!(work_order_id = %created.id, number = %created.work_order_number, "work order created");
        self.event_sender
            .send(Event::WorkOrderCreated {
                work_order_id: created.id,
                work_order_number: created.work_order_number.clone(),
            })
            .await;
        Ok(created)
    }

    pub async fn get_work_order(&self, id: Uuid) -> Result<WorkOrderDetail, ServiceError> {
        let work_order = WorkOrder::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Work order", id))?;
        load_detail(&*self.db, work_order).await
    }

    pub async fn list_work_orders(
        &self,
        filter: WorkOrderFilter,
        page: PageRequest,
    ) -> Result<Page<work_order::Model>, ServiceError> {
        let mut query = WorkOrder::find();
        if let Some(status) = filter.status {
            query = query.filter(work_order::Column::Status.eq(status));
        }
        if let Some(priority) = filter.priority {
            query = query.filter(work_order::Column::Priority.eq(priority));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(work_order::Column::CustomerId.eq(customer_id));
        }
        if let Some(vehicle_id) = filter.vehicle_id {
            query = query.filter(work_order::Column::VehicleId.eq(vehicle_id));
        }
        if let Some(mechanic_id) = filter.mechanic_id {
            query = query.filter(work_order::Column::AssignedMechanicId.eq(mechanic_id));
        }
        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(work_order::Column::WorkOrderNumber.contains(term.to_uppercase()));
        }
        fetch_page(
            query.order_by_desc(work_order::Column::CreatedAt),
            &*self.db,
            page,
        )
        .await
    }

    #[instrument(skip(self, request))]
    pub async fn update_work_order(
        &self,
        id: Uuid,
        request: UpdateWorkOrderRequest,
    ) -> Result<work_order::Model, ServiceError> {
        request.validate()?;
        let existing = WorkOrder::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Work order", id))?;
        let mut active: work_order::ActiveModel = existing.into();

        if let Some(priority) = request.priority {
            active.priority = Set(priority);
        }
        if request.description.is_some() {
            active.description = Set(trimmed(request.description));
        }
        if request.diagnosis.is_some() {
            active.diagnosis = Set(trimmed(request.diagnosis));
        }
        if let Some(mileage) = request.mileage_in {
            active.mileage_in = Set(Some(mileage));
        }
        if let Some(hours) = request.actual_hours {
            active.actual_hours = Set(Some(hours.round_dp(2)));
        }
        active.updated_at = Set(self.clock.now());

        Ok(active.update(&*self.db).await?)
    }

    /// Moves the work order through its lifecycle.
    ///
    /// IN_PROGRESS stamps `start_date` and COMPLETED stamps `completion_date`
    /// when unset. CANCELLED returns drawn parts to stock.
    #[instrument(skip(self, request), fields(status = %request.status))]
    pub async fn update_status(
        &self,
        id: Uuid,
        request: WorkOrderStatusRequest,
        actor: Option<Uuid>,
    ) -> Result<work_order::Model, ServiceError> {
        let now = self.clock.now();
        let txn = db::begin(&self.db, "work_order_status").await?;
        let current = lock_work_order(&txn, id).await?;

        let (from, to) = match apply_transition(current.status, request.status)? {
            Transition::Unchanged(_) => return Ok(current),
            Transition::Changed { from, to } => (from, to),
        };

        let mut returned = Vec::new();
        if to == WorkOrderStatus::Cancelled {
            let reason = format!(
                "Returned from cancelled work order {}",
                current.work_order_number
            );
            returned = return_part_stock(&txn, &current, &reason, actor, now).await?;
        }

        let mut active: work_order::ActiveModel = current.clone().into();
        active.status = Set(to);
        if to == WorkOrderStatus::InProgress && current.start_date.is_none() {
            active.start_date = Set(Some(now));
        }
        if to == WorkOrderStatus::Completed && current.completion_date.is_none() {
            active.completion_date = Set(Some(now));
        }
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        db::commit(txn, "work_order_status").await?;
        info!(work_order_id = %id, %from, %to, "work order status changed");
        self.event_sender
            .send(Event::WorkOrderStatusChanged {
                work_order_id: id,
                old_status: from.to_string(),
                new_status: to.to_string(),
            })
            .await;
        publish_adjustments(&self.event_sender, &returned).await;
        Ok(updated)
    }

    #[instrument(skip(self, request), fields(mechanic_id = %request.mechanic_id))]
    pub async fn assign_mechanic(
        &self,
        id: Uuid,
        request: AssignMechanicRequest,
    ) -> Result<work_order::Model, ServiceError> {
        let txn = db::begin(&self.db, "assign_mechanic").await?;
        let current = lock_work_order(&txn, id).await?;
        if current.status.is_terminal() {
            return Err(ServiceError::validation(format!(
                "Cannot assign a mechanic to a {} work order",
                current.status
            )));
        }
        require_mechanic(&txn, request.mechanic_id, "mechanic_id").await?;

        let mut active: work_order::ActiveModel = current.into();
        active.assigned_mechanic_id = Set(Some(request.mechanic_id));
        active.updated_at = Set(self.clock.now());
        let updated = active.update(&txn).await?;
        db::commit(txn, "assign_mechanic").await?;

        self.event_sender
            .send(Event::MechanicAssigned {
                work_order_id: id,
                mechanic_id: request.mechanic_id,
            })
            .await;
        Ok(updated)
    }

    #[instrument(skip(self, request), fields(service_id = %request.service_id))]
    pub async fn add_service_line(
        &self,
        id: Uuid,
        request: AddServiceLineRequest,
    ) -> Result<WorkOrderDetail, ServiceError> {
        request.validate()?;
        let now = self.clock.now();
        let txn = db::begin(&self.db, "add_service_line").await?;
        let work_order = lock_work_order(&txn, id).await?;
        ensure_lines_editable(&work_order)?;

        let service = Service::find_by_id(request.service_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service", request.service_id))?;
        if !service.is_active {
            return Err(ServiceError::invalid_field("service_id", "Service is inactive"));
        }

        let unit_price = round_money(request.unit_price.unwrap_or(service.base_price));
        work_order_service::ActiveModel {
            id: Set(Uuid::new_v4()),
            work_order_id: Set(work_order.id),
            service_id: Set(service.id),
            quantity: Set(request.quantity),
            unit_price: Set(unit_price),
            total_price: Set(line_total(unit_price, request.quantity)?),
            notes: Set(trimmed(request.notes)),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let work_order = recompute_totals(&txn, work_order, now).await?;
        let detail = load_detail(&txn, work_order).await?;
        db::commit(txn, "add_service_line").await?;
        Ok(detail)
    }

    #[instrument(skip(self))]
    pub async fn remove_service_line(
        &self,
        id: Uuid,
        line_id: Uuid,
    ) -> Result<WorkOrderDetail, ServiceError> {
        let now = self.clock.now();
        let txn = db::begin(&self.db, "remove_service_line").await?;
        let work_order = lock_work_order(&txn, id).await?;
        ensure_lines_editable(&work_order)?;

        let line = ServiceLine::find_by_id(line_id)
            .filter(work_order_service::Column::WorkOrderId.eq(id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service line", line_id))?;
        line.delete(&txn).await?;

        let work_order = recompute_totals(&txn, work_order, now).await?;
        let detail = load_detail(&txn, work_order).await?;
        db::commit(txn, "remove_service_line").await?;
        Ok(detail)
    }

    /// Adds a part line, drawing the quantity from stock.
    #[instrument(skip(self, request), fields(part_id = %request.part_id, quantity = request.quantity))]
    pub async fn add_part_line(
        &self,
        id: Uuid,
        request: AddPartLineRequest,
        actor: Option<Uuid>,
    ) -> Result<WorkOrderDetail, ServiceError> {
        request.validate()?;
        let now = self.clock.now();
        let txn = db::begin(&self.db, "add_part_line").await?;
        let work_order = lock_work_order(&txn, id).await?;
        ensure_lines_editable(&work_order)?;

        let part = Part::find_by_id(request.part_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Part", request.part_id))?;
        if !part.is_active {
            return Err(ServiceError::invalid_field("part_id", "Part is inactive"));
        }

        let unit_price = round_money(request.unit_price.unwrap_or(part.selling_price));
        let total_price = line_total(unit_price, request.quantity)?;

        let drawn = adjust_stock_in_txn(
            &txn,
            part.id,
            AdjustmentType::Remove,
            request.quantity,
            &format!("Used on work order {}", work_order.work_order_number),
            Some(AdjustmentReference {
                reference_type: REFERENCE_TYPE,
                reference_id: work_order.id,
            }),
            actor,
            now,
        )
        .await?;

        work_order_part::ActiveModel {
            id: Set(Uuid::new_v4()),
            work_order_id: Set(work_order.id),
            part_id: Set(part.id),
            quantity: Set(request.quantity),
            unit_price: Set(unit_price),
            total_price: Set(total_price),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let work_order = recompute_totals(&txn, work_order, now).await?;
        let detail = load_detail(&txn, work_order).await?;
        db::commit(txn, "add_part_line").await?;
        publish_adjustments(&self.event_sender, std::slice::from_ref(&drawn)).await;
        Ok(detail)
    }

    /// Removes a part line and returns its quantity to stock.
    #[instrument(skip(self))]
    pub async fn remove_part_line(
        &self,
        id: Uuid,
        line_id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<WorkOrderDetail, ServiceError> {
        let now = self.clock.now();
        let txn = db::begin(&self.db, "remove_part_line").await?;
        let work_order = lock_work_order(&txn, id).await?;
        ensure_lines_editable(&work_order)?;

        let line = PartLine::find_by_id(line_id)
            .filter(work_order_part::Column::WorkOrderId.eq(id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Part line", line_id))?;

        let returned = adjust_stock_in_txn(
            &txn,
            line.part_id,
            AdjustmentType::Add,
            line.quantity,
            &format!("Removed from work order {}", work_order.work_order_number),
            Some(AdjustmentReference {
                reference_type: REFERENCE_TYPE,
                reference_id: work_order.id,
            }),
            actor,
            now,
        )
        .await?;
        line.delete(&txn).await?;

        let work_order = recompute_totals(&txn, work_order, now).await?;
        let detail = load_detail(&txn, work_order).await?;
        db::commit(txn, "remove_part_line").await?;
        publish_adjustments(&self.event_sender, std::slice::from_ref(&returned)).await;
        Ok(detail)
    }

    /// Hard delete, refused once an invoice exists.
    #[instrument(skip(self))]
    pub async fn delete_work_order(&self, id: Uuid, actor: Option<Uuid>) -> Result<(), ServiceError> {
        let now = self.clock.now();
        let txn = db::begin(&self.db, "delete_work_order").await?;
        let work_order = lock_work_order(&txn, id).await?;

        let invoiced = Invoice::find()
            .filter(invoice::Column::WorkOrderId.eq(id))
            .one(&txn)
            .await?;
        if let Some(invoice) = invoiced {
            return Err(ServiceError::Conflict(format!(
                "Work order {} is invoiced on {} and cannot be deleted",
                work_order.work_order_number, invoice.invoice_number
            )));
        }

        let mut returned = Vec::new();
        if work_order.status.allows_line_changes() {
            let reason = format!(
                "Returned from deleted work order {}",
                work_order.work_order_number
            );
            returned = return_part_stock(&txn, &work_order, &reason, actor, now).await?;
        }

        Appointment::update_many()
            .col_expr(
                appointment::Column::WorkOrderId,
                Expr::value(Option::<Uuid>::None),
            )
            .col_expr(appointment::Column::UpdatedAt, Expr::value(now))
            .filter(appointment::Column::WorkOrderId.eq(id))
            .exec(&txn)
            .await?;

        ServiceLine::delete_many()
            .filter(work_order_service::Column::WorkOrderId.eq(id))
            .exec(&txn)
            .await?;
        PartLine::delete_many()
            .filter(work_order_part::Column::WorkOrderId.eq(id))
            .exec(&txn)
            .await?;
        work_order.delete(&txn).await?;
        db::commit(txn, "delete_work_order").await?;
        info!(work_order_id = %id, "work order deleted");
        publish_adjustments(&self.event_sender, &returned).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[test]
    fn line_total_multiplies_and_rounds() {
        assert_eq!(line_total(dec!(49.995), 2).unwrap(), dec!(99.99));
        assert_eq!(line_total(dec!(12.50), 4).unwrap(), dec!(50.00));
    }

    #[test]
    fn oversized_lines_are_rejected_instead_of_overflowing() {
        assert_matches!(
            line_total(Decimal::MAX, 2),
            Err(ServiceError::ValidationError { .. })
        );
        assert_matches!(
            line_total(dec!(9999999999.99), 2),
            Err(ServiceError::ValidationError { .. })
        );
        assert_matches!(
            sum_totals(vec![Decimal::MAX, Decimal::MAX], Vec::new()),
            Err(ServiceError::ValidationError { .. })
        );
    }

    #[test]
    fn totals_sum_both_kinds_of_line() {
        let totals = sum_totals(vec![dec!(80), dec!(20.50)], vec![dec!(35.25)]).unwrap();
        assert_eq!(
            totals,
            WorkOrderTotals {
                labor: dec!(100.50),
                parts: dec!(35.25),
                total: dec!(135.75),
            }
        );
    }

    #[test]
    fn no_lines_means_zero_totals() {
        let totals = sum_totals(Vec::new(), Vec::new()).unwrap();
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn priority_accepts_medium_alias() {
        let request: CreateWorkOrderRequest = serde_json::from_value(serde_json::json!({
            "customer_id": Uuid::new_v4(),
            "vehicle_id": Uuid::new_v4(),
            "priority": "MEDIUM"
        }))
        .unwrap();
        assert_eq!(request.priority, WorkOrderPriority::Normal);
    }
}
