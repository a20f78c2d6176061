//! Invoices and the rules that keep their money fields consistent.
//!
//! `total_amount`, `amount_paid`, `balance_due` and `status` are never taken
//! from a request. They are recomputed from the invoice's own inputs and its
//! payments whenever either changes, inside the writing transaction.

use crate::{
    clock::Clock,
    config::AppConfig,
    db::{self, DbPool},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        invoice::{self, Entity as Invoice},
        payment::{self, Entity as Payment},
        InvoiceStatus, WorkOrderStatus,
    },
    services::{
        checked_money, fetch_page, round_money, search_term,
        sequences::{self, INVOICE_PREFIX},
        trimmed, validate_amount,
        work_orders::{lock_work_order, recompute_totals},
        Page, PageRequest,
    },
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// `subtotal + tax - discount`, rounded to cents.
pub fn compute_totals(
    subtotal: Decimal,
    tax: Decimal,
    discount: Decimal,
) -> Result<Decimal, ServiceError> {
    if subtotal < Decimal::ZERO {
        return Err(ServiceError::invalid_field("subtotal", "Subtotal cannot be negative"));
    }
    if tax < Decimal::ZERO {
        return Err(ServiceError::invalid_field("tax_amount", "Tax cannot be negative"));
    }
    if discount < Decimal::ZERO {
        return Err(ServiceError::invalid_field(
            "discount_amount",
            "Discount cannot be negative",
        ));
    }
    let gross = checked_money("tax_amount", subtotal.checked_add(tax))?;
    if discount > gross {
        return Err(ServiceError::invalid_field(
            "discount_amount",
            "Discount cannot exceed subtotal plus tax",
        ));
    }
    checked_money("discount_amount", gross.checked_sub(discount))
}

/// Status as a function of the money fields and the current date.
///
/// A settled invoice is PAID even past its due date; OVERDUE only applies to
/// an open balance.
pub fn derive_status(
    total: Decimal,
    paid: Decimal,
    due_date: Option<NaiveDate>,
    today: NaiveDate,
) -> InvoiceStatus {
    let balance = total - paid;
    if balance <= Decimal::ZERO {
        InvoiceStatus::Paid
    } else if due_date.is_some_and(|due| due < today) {
        InvoiceStatus::Overdue
    } else if paid > Decimal::ZERO {
        InvoiceStatus::PartiallyPaid
    } else {
        InvoiceStatus::Unpaid
    }
}

/// Resolves the tax for a new invoice from either an explicit amount or a rate.
pub fn resolve_tax(
    subtotal: Decimal,
    tax_amount: Option<Decimal>,
    tax_rate: Option<Decimal>,
    default_rate: Decimal,
) -> Result<Decimal, ServiceError> {
    match (tax_amount, tax_rate) {
        (Some(_), Some(_)) => Err(ServiceError::invalid_field(
            "tax_rate",
            "Provide either tax_amount or tax_rate, not both",
        )),
        (Some(amount), None) => checked_money("tax_amount", Some(amount)),
        (None, rate) => checked_money(
            "tax_rate",
            subtotal.checked_mul(rate.unwrap_or(default_rate)),
        ),
    }
}

fn validate_tax_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if rate.is_sign_negative() || *rate > Decimal::ONE {
        return Err(ValidationError::new("tax_rate_out_of_range"));
    }
    Ok(())
}

/// Invoice defaults taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct InvoiceSettings {
    pub default_tax_rate: Decimal,
    pub due_days: u32,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            default_tax_rate: Decimal::ZERO,
            due_days: 30,
        }
    }
}

impl From<&AppConfig> for InvoiceSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_tax_rate: config.tax_rate(),
            due_days: config.invoice_due_days,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateInvoiceRequest {
    pub work_order_id: Uuid,
    /// Absolute tax; mutually exclusive with `tax_rate`
    #[validate(custom = "validate_amount")]
    pub tax_amount: Option<Decimal>,
    /// Fraction of the subtotal, e.g. `0.08`
    #[validate(custom = "validate_tax_rate")]
    pub tax_rate: Option<Decimal>,
    #[validate(custom = "validate_amount")]
    #[serde(default)]
    pub discount_amount: Decimal,
    /// Defaults to today
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateInvoiceRequest {
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[validate(custom = "validate_amount")]
    pub tax_amount: Option<Decimal>,
    #[validate(custom = "validate_amount")]
    pub discount_amount: Option<Decimal>,
    /// Rejected when present: invoice status is derived.
    #[schema(value_type = Option<String>)]
    pub status: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<Uuid>,
    pub work_order_id: Option<Uuid>,
    /// Matches the invoice number
    pub search: Option<String>,
    /// Issue date lower bound, inclusive
    pub from: Option<NaiveDate>,
    /// Issue date upper bound, inclusive
    pub to: Option<NaiveDate>,
}

pub(crate) async fn lock_invoice<C>(conn: &C, id: Uuid) -> Result<invoice::Model, ServiceError>
where
    C: ConnectionTrait,
{
    Invoice::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Invoice", id))
}

/// Recomputes paid amount, balance and status from the invoice's payments.
pub(crate) async fn reconcile_invoice<C>(
    conn: &C,
    invoice: invoice::Model,
    now: DateTime<Utc>,
) -> Result<invoice::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let payments = Payment::find()
        .filter(payment::Column::InvoiceId.eq(invoice.id))
        .all(conn)
        .await?;
    let total = round_money(invoice.total_amount);
    let paid = round_money(payments.iter().map(|p| p.amount).sum());
    let balance = total - paid;
    let status = derive_status(total, paid, invoice.due_date, now.date_naive());

    if paid == invoice.amount_paid && balance == invoice.balance_due && status == invoice.status {
        return Ok(invoice);
    }

    let mut active: invoice::ActiveModel = invoice.into();
    active.amount_paid = Set(paid);
    active.balance_due = Set(balance);
    active.status = Set(status);
    active.updated_at = Set(now);
    Ok(active.update(conn).await?)
}

/// Marks open invoices whose due date has passed as OVERDUE.
pub(crate) async fn sweep_overdue<C>(conn: &C, now: DateTime<Utc>) -> Result<u64, ServiceError>
where
    C: ConnectionTrait,
{
    let result = Invoice::update_many()
        .col_expr(invoice::Column::Status, Expr::value(InvoiceStatus::Overdue))
        .col_expr(invoice::Column::UpdatedAt, Expr::value(now))
        .filter(
            invoice::Column::Status.is_in([InvoiceStatus::Unpaid, InvoiceStatus::PartiallyPaid]),
        )
        .filter(invoice::Column::DueDate.lt(now.date_naive()))
        .exec(conn)
        .await?;
    if result.rows_affected > 0 {
        debug!(count = result.rows_affected, "invoices marked overdue");
    }
    Ok(result.rows_affected)
}

pub struct InvoiceService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    clock: Arc<dyn Clock>,
    settings: InvoiceSettings,
}

impl InvoiceService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        clock: Arc<dyn Clock>,
        settings: InvoiceSettings,
    ) -> Self {
        Self {
            db,
            event_sender,
            clock,
            settings,
        }
    }

    /// Bills a work order. The subtotal is the work order's line total.
    #[instrument(skip(self, request), fields(work_order_id = %request.work_order_id))]
    pub async fn create_invoice(
        &self,
        request: CreateInvoiceRequest,
    ) -> Result<invoice::Model, ServiceError> {
        request.validate()?;
        let now = self.clock.now();
        let issue_date = request.issue_date.unwrap_or_else(|| now.date_naive());
        let due_date = match request.due_date {
            Some(due) if due < issue_date => {
                return Err(ServiceError::invalid_field(
                    "due_date",
                    "Due date cannot be before the issue date",
                ))
            }
            Some(due) => due,
            None => issue_date + Duration::days(i64::from(self.settings.due_days)),
        };

        let txn = db::begin(&self.db, "create_invoice").await?;
        let work_order = lock_work_order(&txn, request.work_order_id).await?;
        if work_order.status == WorkOrderStatus::Cancelled {
            return Err(ServiceError::invalid_field(
                "work_order_id",
                "A cancelled work order cannot be invoiced",
            ));
        }
        let existing = Invoice::find()
            .filter(invoice::Column::WorkOrderId.eq(work_order.id))
            .one(&txn)
            .await?;
        if let Some(existing) = existing {
            return Err(ServiceError::Conflict(format!(
                "Work order {} is already invoiced on {}",
                work_order.work_order_number, existing.invoice_number
            )));
        }

        let work_order = recompute_totals(&txn, work_order, now).await?;
        let subtotal = work_order.total_cost;
        let tax = resolve_tax(
            subtotal,
            request.tax_amount,
            request.tax_rate,
            self.settings.default_tax_rate,
        )?;
        let discount = round_money(request.discount_amount);
        let total = compute_totals(subtotal, tax, discount)?;
        let status = derive_status(total, Decimal::ZERO, Some(due_date), now.date_naive());

        let number = sequences::next_number(&txn, INVOICE_PREFIX, now.year()).await?;
        let created = invoice::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_number: Set(number),
            work_order_id: Set(work_order.id),
            customer_id: Set(work_order.customer_id),
            subtotal: Set(subtotal),
            tax_amount: Set(tax),
            discount_amount: Set(discount),
            total_amount: Set(total),
            amount_paid: Set(Decimal::ZERO),
            balance_due: Set(total),
            status: Set(status),
            issue_date: Set(issue_date),
            due_date: Set(Some(due_date)),
            notes: Set(trimmed(request.notes)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::from_db(e, "Invoice already exists for this work order"))?;

        db::commit(txn, "create_invoice").await?;
        info!(invoice_id = %created.id, number = %created.invoice_number, total = %created.total_amount, "invoice created");
        self.event_sender
            .send(Event::InvoiceCreated {
                invoice_id: created.id,
                invoice_number: created.invoice_number.clone(),
                total_amount: created.total_amount,
            })
            .await;
        Ok(created)
    }

    pub async fn get_invoice(&self, id: Uuid) -> Result<invoice::Model, ServiceError> {
        sweep_overdue(&*self.db, self.clock.now()).await?;
        Invoice::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Invoice", id))
    }

    pub async fn list_invoices(
        &self,
        filter: InvoiceFilter,
        page: PageRequest,
    ) -> Result<Page<invoice::Model>, ServiceError> {
        sweep_overdue(&*self.db, self.clock.now()).await?;

        let mut query = Invoice::find();
        if let Some(status) = filter.status {
            query = query.filter(invoice::Column::Status.eq(status));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(invoice::Column::CustomerId.eq(customer_id));
        }
        if let Some(work_order_id) = filter.work_order_id {
            query = query.filter(invoice::Column::WorkOrderId.eq(work_order_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(invoice::Column::IssueDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(invoice::Column::IssueDate.lte(to));
        }
        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(invoice::Column::InvoiceNumber.contains(term.to_uppercase()));
        }
        fetch_page(
            query.order_by_desc(invoice::Column::CreatedAt),
            &*self.db,
            page,
        )
        .await
    }

    /// Edits the adjustable inputs and recomputes the derived fields.
    #[instrument(skip(self, request))]
    pub async fn update_invoice(
        &self,
        id: Uuid,
        request: UpdateInvoiceRequest,
    ) -> Result<invoice::Model, ServiceError> {
        if request.status.is_some() {
            return Err(ServiceError::invalid_field(
                "status",
                "Invoice status is derived from payments and cannot be set",
            ));
        }
        request.validate()?;
        let now = self.clock.now();

        let txn = db::begin(&self.db, "update_invoice").await?;
        let current = lock_invoice(&txn, id).await?;
        let previous_status = current.status;

        let due_date = request.due_date.or(current.due_date);
        if let Some(due) = request.due_date {
            if due < current.issue_date {
                return Err(ServiceError::invalid_field(
                    "due_date",
                    "Due date cannot be before the issue date",
                ));
            }
        }
        let tax = request.tax_amount.map(round_money).unwrap_or(current.tax_amount);
        let discount = request
            .discount_amount
            .map(round_money)
            .unwrap_or(current.discount_amount);
        let total = compute_totals(current.subtotal, tax, discount)?;
        if total < current.amount_paid {
            return Err(ServiceError::invalid_field(
                "discount_amount",
                format!(
                    "New total {} is below the {} already paid",
                    total, current.amount_paid
                ),
            ));
        }

        let mut active: invoice::ActiveModel = current.into();
        active.due_date = Set(due_date);
        if request.notes.is_some() {
            active.notes = Set(trimmed(request.notes));
        }
        active.tax_amount = Set(tax);
        active.discount_amount = Set(discount);
        active.total_amount = Set(total);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;
        let updated = reconcile_invoice(&txn, updated, now).await?;

        db::commit(txn, "update_invoice").await?;
        publish_status_change(&self.event_sender, &updated, previous_status).await;
        Ok(updated)
    }

    /// Hard delete, refused once any payment has been recorded.
    #[instrument(skip(self))]
    pub async fn delete_invoice(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = db::begin(&self.db, "delete_invoice").await?;
        let current = lock_invoice(&txn, id).await?;
        let payments = Payment::find()
            .filter(payment::Column::InvoiceId.eq(id))
            .count(&txn)
            .await?;
        if payments > 0 {
            return Err(ServiceError::Conflict(format!(
                "Invoice {} has {} payment(s) and cannot be deleted",
                current.invoice_number, payments
            )));
        }
        current.delete(&txn).await?;
        db::commit(txn, "delete_invoice").await?;
        info!(invoice_id = %id, "invoice deleted");
        Ok(())
    }
}

pub(crate) async fn publish_status_change(
    events: &EventSender,
    invoice: &invoice::Model,
    previous: InvoiceStatus,
) {
    if invoice.status != previous {
        events
            .send(Event::InvoiceStatusChanged {
                invoice_id: invoice.id,
                old_status: previous.to_string(),
                new_status: invoice.status.to_string(),
            })
            .await;
    }
}
