//! Appointment booking and conversion into work orders.

use crate::{
    clock::Clock,
    db::{self, DbPool},
    errors::ServiceError,
    events::{Event, EventSender},
    lifecycle::{apply_transition, LifecycleStatus, Transition},
    models::{
        appointment::{self, Entity as Appointment},
        customer::Entity as Customer,
        vehicle::Entity as Vehicle,
        work_order, AppointmentStatus, WorkOrderPriority,
    },
    services::{
        employees::require_mechanic,
        fetch_page, trimmed,
        work_orders::{insert_work_order, NewWorkOrder},
        Page, PageRequest,
    },
};
use chrono::{DateTime, Utc};
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

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAppointmentRequest {
    pub customer_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub assigned_mechanic_id: Option<Uuid>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    #[validate(length(max = 500))]
    pub service_description: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAppointmentRequest {
    pub vehicle_id: Option<Uuid>,
    pub assigned_mechanic_id: Option<Uuid>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    #[validate(length(max = 500))]
    pub service_description: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AppointmentStatusRequest {
    pub status: AppointmentStatus,
}

/// Optional overrides for the work order created from an appointment.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ConvertAppointmentRequest {
    #[serde(default)]
    pub priority: WorkOrderPriority,
    /// Defaults to the appointment's service description
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub mileage_in: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub customer_id: Option<Uuid>,
    pub mechanic_id: Option<Uuid>,
    /// Appointments starting at or after this instant
    pub from: Option<DateTime<Utc>>,
    /// Appointments starting at or before this instant
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AppointmentConversion {
    #[schema(value_type = appointment::Model)]
    pub appointment: appointment::Model,
    #[schema(value_type = work_order::Model)]
    pub work_order: work_order::Model,
}

fn ensure_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ServiceError> {
    if end <= start {
        return Err(ServiceError::invalid_field(
            "scheduled_end",
            "Appointment must end after it starts",
        ));
    }
    Ok(())
}

/// Checks that the vehicle exists and belongs to the customer.
async fn require_customer_vehicle<C>(
    conn: &C,
    customer_id: Uuid,
    vehicle_id: Uuid,
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let vehicle = Vehicle::find_by_id(vehicle_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Vehicle", vehicle_id))?;
    if vehicle.customer_id != customer_id {
        return Err(ServiceError::invalid_field(
            "vehicle_id",
            "Vehicle does not belong to this customer",
        ));
    }
    Ok(())
}

pub struct AppointmentService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    clock: Arc<dyn Clock>,
}

impl AppointmentService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            event_sender,
            clock,
        }
    }

    #[instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<appointment::Model, ServiceError> {
        request.validate()?;
        ensure_window(request.scheduled_start, request.scheduled_end)?;

        let conn = &*self.db;
        let customer = Customer::find_by_id(request.customer_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", request.customer_id))?;
        if !customer.is_active {
            return Err(ServiceError::invalid_field("customer_id", "Customer is inactive"));
        }
        if let Some(vehicle_id) = request.vehicle_id {
            require_customer_vehicle(conn, customer.id, vehicle_id).await?;
        }
        if let Some(mechanic_id) = request.assigned_mechanic_id {
            require_mechanic(conn, mechanic_id, "assigned_mechanic_id").await?;
        }

        let now = self.clock.now();
        let created = appointment::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer.id),
            vehicle_id: Set(request.vehicle_id),
            assigned_mechanic_id: Set(request.assigned_mechanic_id),
            scheduled_start: Set(request.scheduled_start),
            scheduled_end: Set(request.scheduled_end),
            service_description: Set(trimmed(request.service_description)),
            notes: Set(trimmed(request.notes)),
            status: Set(AppointmentStatus::Scheduled),
            work_order_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await?;

        info!(appointment_id = %created.id, start = %created.scheduled_start, "appointment booked");
        Ok(created)
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<appointment::Model, ServiceError> {
        Appointment::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Appointment", id))
    }

    pub async fn list_appointments(
        &self,
        filter: AppointmentFilter,
        page: PageRequest,
    ) -> Result<Page<appointment::Model>, ServiceError> {
        let mut query = Appointment::find();
        if let Some(status) = filter.status {
            query = query.filter(appointment::Column::Status.eq(status));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(appointment::Column::CustomerId.eq(customer_id));
        }
        if let Some(mechanic_id) = filter.mechanic_id {
            query = query.filter(appointment::Column::AssignedMechanicId.eq(mechanic_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(appointment::Column::ScheduledStart.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(appointment::Column::ScheduledStart.lte(to));
        }
        fetch_page(
            query.order_by_asc(appointment::Column::ScheduledStart),
            &*self.db,
            page,
        )
        .await
    }

    /// Appointments starting inside `[start, end]`, for calendar views.
    pub async fn list_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<appointment::Model>, ServiceError> {
        if start > end {
            return Ok(Vec::new());
        }
        Ok(Appointment::find()
            .filter(appointment::Column::ScheduledStart.gte(start))
            .filter(appointment::Column::ScheduledStart.lte(end))
            .order_by_asc(appointment::Column::ScheduledStart)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update_appointment(
        &self,
        id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> Result<appointment::Model, ServiceError> {
        request.validate()?;
        let conn = &*self.db;
        let current = self.get_appointment(id).await?;
        if current.status.is_terminal() {
            return Err(ServiceError::validation(format!(
                "A {} appointment cannot be edited",
                current.status
            )));
        }

        let start = request.scheduled_start.unwrap_or(current.scheduled_start);
        let end = request.scheduled_end.unwrap_or(current.scheduled_end);
        ensure_window(start, end)?;
        if let Some(vehicle_id) = request.vehicle_id {
            require_customer_vehicle(conn, current.customer_id, vehicle_id).await?;
        }
        if let Some(mechanic_id) = request.assigned_mechanic_id {
            require_mechanic(conn, mechanic_id, "assigned_mechanic_id").await?;
        }

        let mut active: appointment::ActiveModel = current.into();
        active.scheduled_start = Set(start);
        active.scheduled_end = Set(end);
        if let Some(vehicle_id) = request.vehicle_id {
            active.vehicle_id = Set(Some(vehicle_id));
        }
        if let Some(mechanic_id) = request.assigned_mechanic_id {
            active.assigned_mechanic_id = Set(Some(mechanic_id));
        }
        if request.service_description.is_some() {
            active.service_description = Set(trimmed(request.service_description));
        }
        if request.notes.is_some() {
            active.notes = Set(trimmed(request.notes));
        }
        active.updated_at = Set(self.clock.now());

        Ok(active.update(conn).await?)
    }

    #[instrument(skip(self, request), fields(status = %request.status))]
    pub async fn update_status(
        &self,
        id: Uuid,
        request: AppointmentStatusRequest,
    ) -> Result<appointment::Model, ServiceError> {
        let txn = db::begin(&self.db, "appointment_status").await?;
        let current = Appointment::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Appointment", id))?;
        let (from, to) = match apply_transition(current.status, request.status)? {
            Transition::Unchanged(_) => {
                db::commit(txn, "appointment_status").await?;
                return Ok(current);
            }
            Transition::Changed { from, to } => (from, to),
        };

        let mut active: appointment::ActiveModel = current.into();
        active.status = Set(to);
        active.updated_at = Set(self.clock.now());
        let updated = active.update(&txn).await?;
        db::commit(txn, "appointment_status").await?;

        info!(appointment_id = %id, %from, %to, "appointment status changed");
        self.event_sender
            .send(Event::AppointmentStatusChanged {
                appointment_id: id,
                old_status: from.to_string(),
                new_status: to.to_string(),
            })
            .await;
        Ok(updated)
    }

    /// Opens a PENDING work order for the appointment and links the two.
    ///
    /// The appointment keeps its status; it is moved along separately.
    #[instrument(skip(self, request))]
    pub async fn convert_to_work_order(
        &self,
        id: Uuid,
        request: ConvertAppointmentRequest,
    ) -> Result<AppointmentConversion, ServiceError> {
        request.validate()?;
        let now = self.clock.now();
        let txn = db::begin(&self.db, "convert_appointment").await?;

        let appointment = Appointment::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Appointment", id))?;
        if let Some(work_order_id) = appointment.work_order_id {
            return Err(ServiceError::Conflict(format!(
                "Appointment {} was already converted to work order {}",
                id, work_order_id
            )));
        }
        if !appointment.status.can_convert_to_work_order() {
            return Err(ServiceError::validation(format!(
                "A {} appointment cannot be converted to a work order",
                appointment.status
            )));
        }
        let vehicle_id = appointment.vehicle_id.ok_or_else(|| {
            ServiceError::invalid_field(
                "vehicle_id",
                "Appointment needs a vehicle before it can become a work order",
            )
        })?;

        let work_order = insert_work_order(
            &txn,
            NewWorkOrder {
                customer_id: appointment.customer_id,
                vehicle_id,
                assigned_mechanic_id: appointment.assigned_mechanic_id,
                appointment_id: Some(appointment.id),
                priority: request.priority,
                description: request
                    .description
                    .or_else(|| appointment.service_description.clone()),
                diagnosis: None,
                mileage_in: request.mileage_in,
            },
            now,
        )
        .await?;

        let mut active: appointment::ActiveModel = appointment.into();
        active.work_order_id = Set(Some(work_order.id));
        active.updated_at = Set(now);
        let appointment = active.update(&txn).await?;
        db::commit(txn, "convert_appointment").await?;

        info!(appointment_id = %id, work_order_id = %work_order.id, "appointment converted");
        self.event_sender
            .send(Event::WorkOrderCreated {
                work_order_id: work_order.id,
                work_order_number: work_order.work_order_number.clone(),
            })
            .await;
        self.event_sender
            .send(Event::AppointmentConverted {
                appointment_id: id,
                work_order_id: work_order.id,
            })
            .await;

        Ok(AppointmentConversion {
            appointment,
            work_order,
        })
    }

    #[instrument(skip(self))]
    pub async fn delete_appointment(&self, id: Uuid) -> Result<(), ServiceError> {
        let appointment = self.get_appointment(id).await?;
        appointment.delete(&*self.db).await?;
        info!(appointment_id = %id, "appointment deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};

    #[test]
    fn window_must_be_positive() {
        let start = Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap();
        assert!(ensure_window(start, start + Duration::hours(1)).is_ok());
        assert_matches!(
            ensure_window(start, start),
            Err(ServiceError::ValidationError { .. })
        );
        assert_matches!(
            ensure_window(start, start - Duration::minutes(5)),
            Err(ServiceError::ValidationError { .. })
        );
    }

    #[test]
    fn conversion_body_is_optional() {
        let request: ConvertAppointmentRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.priority, WorkOrderPriority::Normal);
        assert!(request.description.is_none());
    }
}
