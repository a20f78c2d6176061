use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events published after a write has committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Work order events
    WorkOrderCreated {
        work_order_id: Uuid,
        work_order_number: String,
    },
    WorkOrderStatusChanged {
        work_order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    MechanicAssigned {
        work_order_id: Uuid,
        mechanic_id: Uuid,
    },

    // Billing events
    InvoiceCreated {
        invoice_id: Uuid,
        invoice_number: String,
        total_amount: Decimal,
    },
    InvoiceStatusChanged {
        invoice_id: Uuid,
        old_status: String,
        new_status: String,
    },
    PaymentRecorded {
        payment_id: Uuid,
        invoice_id: Uuid,
        amount: Decimal,
        balance_due: Decimal,
    },
    PaymentDeleted {
        payment_id: Uuid,
        invoice_id: Uuid,
        amount: Decimal,
    },

    // Inventory events
    StockAdjusted {
        part_id: Uuid,
        adjustment_type: String,
        previous_quantity: i32,
        new_quantity: i32,
    },
    LowStock {
        part_id: Uuid,
        part_number: String,
        quantity_in_stock: i32,
        reorder_level: i32,
    },
    PurchaseOrderStatusChanged {
        purchase_order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    PurchaseOrderReceived {
        purchase_order_id: Uuid,
        po_number: String,
        items: usize,
    },

    // Appointment events
    AppointmentStatusChanged {
        appointment_id: Uuid,
        old_status: String,
        new_status: String,
    },
    AppointmentConverted {
        appointment_id: Uuid,
        work_order_id: Uuid,
    },
}

impl Event {
    /// Short stable name used as a metrics label.
    pub fn name(&self) -> &'static str {
        match self {
            Event::WorkOrderCreated { .. } => "work_order_created",
            Event::WorkOrderStatusChanged { .. } => "work_order_status_changed",
            Event::MechanicAssigned { .. } => "mechanic_assigned",
            Event::InvoiceCreated { .. } => "invoice_created",
            Event::InvoiceStatusChanged { .. } => "invoice_status_changed",
            Event::PaymentRecorded { .. } => "payment_recorded",
            Event::PaymentDeleted { .. } => "payment_deleted",
            Event::StockAdjusted { .. } => "stock_adjusted",
            Event::LowStock { .. } => "low_stock",
            Event::PurchaseOrderStatusChanged { .. } => "purchase_order_status_changed",
            Event::PurchaseOrderReceived { .. } => "purchase_order_received",
            Event::AppointmentStatusChanged { .. } => "appointment_status_changed",
            Event::AppointmentConverted { .. } => "appointment_converted",
        }
    }
}

/// An event together with the time it was published.
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub event: Event,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<EventEnvelope>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<EventEnvelope>) -> Self {
        Self { sender }
    }

    /// Creates a sender and the receiver that [`process_events`] drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EventEnvelope>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Publishes an event without waiting for channel capacity. The write it
    /// describes has already committed, so a full or closed channel drops the
    /// event with a warning.
    pub async fn send(&self, event: Event) {
        let name = event.name();
        let envelope = EventEnvelope {
            event,
            published_at: Utc::now(),
        };
        let reason = match self.sender.try_send(envelope) {
            Ok(()) => return,
            Err(TrySendError::Full(_)) => "full",
            Err(TrySendError::Closed(_)) => "closed",
        };
        warn!(event = name, reason, "dropped domain event");
        counter!("workshop_events.dropped", 1, "event" => name, "reason" => reason);
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<EventEnvelope>) {
    info!("Starting event processing loop");

    while let Some(EventEnvelope {
        event,
        published_at,
    }) = rx.recv().await
    {
        counter!("workshop_events.processed", 1, "event" => event.name());

        match &event {
            Event::LowStock {
                part_id,
                part_number,
                quantity_in_stock,
                reorder_level,
            } => {
                warn!(
                    %part_id,
                    %part_number,
                    quantity_in_stock,
                    reorder_level,
                    "part at or below reorder level"
                );
            }
            Event::InvoiceStatusChanged {
                invoice_id,
                old_status,
                new_status,
            } => {
                info!(%invoice_id, %old_status, %new_status, "invoice status changed");
            }
            other => {
                info!(event = other.name(), %published_at, payload = ?other, "domain event");
            }
        }
    }

    info!("Event channel closed, event processing stopped");
}
