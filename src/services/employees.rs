use crate::{
    clock::Clock,
    db::DbPool,
    errors::ServiceError,
    models::{
        employee::{self, Entity as Employee},
        EmployeeRole,
    },
    services::{fetch_page, search_term, trimmed, validate_amount, Page, PageRequest},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateEmployeeRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub role: EmployeeRole,
    #[validate(custom = "validate_amount")]
    #[serde(default)]
    pub hourly_rate: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEmployeeRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<EmployeeRole>,
    #[validate(custom = "validate_amount")]
    pub hourly_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeFilter {
    pub role: Option<EmployeeRole>,
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

/// Loads an employee that may be assigned work: active and a mechanic.
pub(crate) async fn require_mechanic<C>(
    conn: &C,
    mechanic_id: Uuid,
    field: &str,
) -> Result<employee::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let mechanic = Employee::find_by_id(mechanic_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Employee", mechanic_id))?;
    if !mechanic.is_available_mechanic() {
        return Err(ServiceError::invalid_field(
            field,
            "Assigned employee must be an active mechanic",
        ));
    }
    Ok(mechanic)
}

pub struct EmployeeService {
    db: Arc<DbPool>,
    clock: Arc<dyn Clock>,
}

impl EmployeeService {
    pub fn new(db: Arc<DbPool>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    #[instrument(skip(self, request), fields(role = %request.role))]
    pub async fn create_employee(
        &self,
        request: CreateEmployeeRequest,
    ) -> Result<employee::Model, ServiceError> {
        request.validate()?;
        let now = self.clock.now();

        let created = employee::ActiveModel {
            id: Set(Uuid::new_v4()),
            first_name: Set(request.first_name.trim().to_string()),
            last_name: Set(request.last_name.trim().to_string()),
            email: Set(request.email.trim().to_lowercase()),
            phone: Set(trimmed(request.phone)),
            role: Set(request.role),
            hourly_rate: Set(request.hourly_rate),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(employee_id = %created.id, "employee created");
        Ok(created)
    }

    pub async fn get_employee(&self, id: Uuid) -> Result<employee::Model, ServiceError> {
        Employee::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Employee", id))
    }

    pub async fn list_employees(
        &self,
        filter: EmployeeFilter,
        page: PageRequest,
    ) -> Result<Page<employee::Model>, ServiceError> {
        let mut query = Employee::find();
        if !filter.include_inactive {
            query = query.filter(employee::Column::IsActive.eq(true));
        }
        if let Some(role) = filter.role {
            query = query.filter(employee::Column::Role.eq(role));
        }
        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(
                Condition::any()
                    .add(employee::Column::FirstName.contains(&term))
                    .add(employee::Column::LastName.contains(&term))
                    .add(employee::Column::Email.contains(&term)),
            );
        }
        fetch_page(
            query
                .order_by_asc(employee::Column::LastName)
                .order_by_asc(employee::Column::FirstName),
            &*self.db,
            page,
        )
        .await
    }

    /// Active mechanics, for assignment pickers.
    pub async fn list_mechanics(&self) -> Result<Vec<employee::Model>, ServiceError> {
        Ok(Employee::find()
            .filter(employee::Column::IsActive.eq(true))
            .filter(employee::Column::Role.eq(EmployeeRole::Mechanic))
            .order_by_asc(employee::Column::LastName)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update_employee(
        &self,
        id: Uuid,
        request: UpdateEmployeeRequest,
    ) -> Result<employee::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_employee(id).await?;
        let mut active: employee::ActiveModel = existing.into();

        if let Some(first_name) = request.first_name {
            active.first_name = Set(first_name.trim().to_string());
        }
        if let Some(last_name) = request.last_name {
            active.last_name = Set(last_name.trim().to_string());
        }
        if let Some(email) = request.email {
            active.email = Set(email.trim().to_lowercase());
        }
        if request.phone.is_some() {
            active.phone = Set(trimmed(request.phone));
        }
        if let Some(role) = request.role {
            active.role = Set(role);
        }
        if let Some(rate) = request.hourly_rate {
            active.hourly_rate = Set(rate);
        }
        active.updated_at = Set(self.clock.now());

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn deactivate_employee(&self, id: Uuid) -> Result<employee::Model, ServiceError> {
        let existing = self.get_employee(id).await?;
        let mut active: employee::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(self.clock.now());
        let updated = active.update(&*self.db).await?;
        info!(employee_id = %id, "employee deactivated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn negative_hourly_rate_is_rejected() {
        let request = CreateEmployeeRequest {
            first_name: "Ada".into(),
            last_name: "Wrench".into(),
            email: "ada@workshop.test".into(),
            phone: None,
            role: EmployeeRole::Mechanic,
            hourly_rate: dec!(-1),
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("hourly_rate"));
    }
}
