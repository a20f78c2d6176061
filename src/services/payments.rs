use crate::{
    clock::Clock,
    db::{self, DbPool},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        invoice::{self, Entity as Invoice},
        payment::{self, Entity as Payment},
        PaymentMethod,
    },
    services::{
        invoicing::{lock_invoice, publish_status_change, reconcile_invoice},
        round_money, trimmed, validate_positive_amount,
    },
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RecordPaymentRequest {
    #[validate(custom = "validate_positive_amount")]
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    /// Defaults to today
    pub payment_date: Option<NaiveDate>,
    #[validate(length(max = 100))]
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// The stored payment and the invoice as reconciled after it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentReceipt {
    #[schema(value_type = payment::Model)]
    pub payment: payment::Model,
    #[schema(value_type = invoice::Model)]
    pub invoice: invoice::Model,
}

pub struct PaymentService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    clock: Arc<dyn Clock>,
}

impl PaymentService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            event_sender,
            clock,
        }
    }

    /// Records a payment against an invoice.
    ///
    /// The invoice row is locked and reconciled from its stored payments
    /// before the amount is checked against the balance, so two concurrent
    /// payments can never together exceed it.
    #[instrument(skip(self, request), fields(amount = %request.amount, method = %request.payment_method))]
    pub async fn record_payment(
        &self,
        invoice_id: Uuid,
        request: RecordPaymentRequest,
    ) -> Result<PaymentReceipt, ServiceError> {
        request.validate()?;
        let amount = round_money(request.amount);
        if amount <= Decimal::ZERO {
            return Err(ServiceError::invalid_field(
                "amount",
                "Payment amount must be greater than zero",
            ));
        }
        let now = self.clock.now();

        let txn = db::begin(&self.db, "record_payment").await?;
        let invoice = lock_invoice(&txn, invoice_id).await?;
        let previous_status = invoice.status;
        let invoice = reconcile_invoice(&txn, invoice, now).await?;

        if amount > invoice.balance_due {
            return Err(ServiceError::invalid_field(
                "amount",
                format!(
                    "Payment of {} exceeds the balance due of {}",
                    amount, invoice.balance_due
                ),
            ));
        }

        let payment = payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice.id),
            amount: Set(amount),
            payment_method: Set(request.payment_method),
            payment_date: Set(request.payment_date.unwrap_or_else(|| now.date_naive())),
            reference: Set(trimmed(request.reference)),
            notes: Set(trimmed(request.notes)),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let invoice = reconcile_invoice(&txn, invoice, now).await?;
        db::commit(txn, "record_payment").await?;

        info!(
            payment_id = %payment.id,
            %invoice_id,
            balance_due = %invoice.balance_due,
            status = %invoice.status,
            "payment recorded"
        );
        self.event_sender
            .send(Event::PaymentRecorded {
                payment_id: payment.id,
                invoice_id,
                amount,
                balance_due: invoice.balance_due,
            })
            .await;
        publish_status_change(&self.event_sender, &invoice, previous_status).await;

        Ok(PaymentReceipt { payment, invoice })
    }

    pub async fn list_payments(&self, invoice_id: Uuid) -> Result<Vec<payment::Model>, ServiceError> {
        Invoice::find_by_id(invoice_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Invoice", invoice_id))?;

        Ok(Payment::find()
            .filter(payment::Column::InvoiceId.eq(invoice_id))
            .order_by_asc(payment::Column::PaymentDate)
            .order_by_asc(payment::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_payment(&self, id: Uuid) -> Result<payment::Model, ServiceError> {
        Payment::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Payment", id))
    }

    /// Deletes a payment and reconciles its invoice, restoring the balance.
    #[instrument(skip(self))]
    pub async fn delete_payment(&self, id: Uuid) -> Result<invoice::Model, ServiceError> {
        let now = self.clock.now();
        let txn = db::begin(&self.db, "delete_payment").await?;

        let payment = Payment::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Payment", id))?;
        let invoice = lock_invoice(&txn, payment.invoice_id).await?;
        let previous_status = invoice.status;
        let amount = payment.amount;
        let invoice_id = payment.invoice_id;

        payment.delete(&txn).await?;
        let invoice = reconcile_invoice(&txn, invoice, now).await?;
        db::commit(txn, "delete_payment").await?;

        info!(payment_id = %id, %invoice_id, balance_due = %invoice.balance_due, "payment deleted");
        self.event_sender
            .send(Event::PaymentDeleted {
                payment_id: id,
                invoice_id,
                amount,
            })
            .await;
        publish_status_change(&self.event_sender, &invoice, previous_status).await;
        Ok(invoice)
    }
}
