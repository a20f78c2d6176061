use crate::{
    clock::Clock,
    db::DbPool,
    errors::ServiceError,
    models::{
        customer::{self, Entity as Customer},
        vehicle::{self, Entity as Vehicle},
    },
    services::{fetch_page, search_term, trimmed, Page, PageRequest},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 3, max = 32))]
    pub phone: String,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 3, max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerFilter {
    /// Matches first name, last name, email or phone
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateVehicleRequest {
    pub customer_id: Uuid,
    #[validate(length(min = 1, max = 64))]
    pub make: String,
    #[validate(length(min = 1, max = 64))]
    pub model: String,
    #[validate(range(min = 1900, max = 2100))]
    pub year: i32,
    #[validate(length(equal = 17, message = "VIN must be 17 characters"))]
    pub vin: Option<String>,
    #[validate(length(max = 16))]
    pub license_plate: Option<String>,
    pub color: Option<String>,
    #[validate(range(min = 0))]
    pub mileage: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 64))]
    pub make: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub model: Option<String>,
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
    #[validate(length(equal = 17, message = "VIN must be 17 characters"))]
    pub vin: Option<String>,
    #[validate(length(max = 16))]
    pub license_plate: Option<String>,
    pub color: Option<String>,
    #[validate(range(min = 0))]
    pub mileage: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VehicleFilter {
    pub customer_id: Option<Uuid>,
    /// Matches make, model, VIN or license plate
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

/// Customers and the vehicles they own.
pub struct CustomerService {
    db: Arc<DbPool>,
    clock: Arc<dyn Clock>,
}

impl CustomerService {
    pub fn new(db: Arc<DbPool>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    #[instrument(skip(self, request))]
    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<customer::Model, ServiceError> {
        request.validate()?;
        let now = self.clock.now();

        let created = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            first_name: Set(request.first_name.trim().to_string()),
            last_name: Set(request.last_name.trim().to_string()),
            email: Set(trimmed(request.email).map(|e| e.to_lowercase())),
            phone: Set(request.phone.trim().to_string()),
            address: Set(trimmed(request.address)),
            notes: Set(trimmed(request.notes)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(customer_id = %created.id, "customer created");
        Ok(created)
    }

    pub async fn get_customer(&self, id: Uuid) -> Result<customer::Model, ServiceError> {
        Customer::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", id))
    }

    pub async fn list_customers(
        &self,
        filter: CustomerFilter,
        page: PageRequest,
    ) -> Result<Page<customer::Model>, ServiceError> {
        let mut query = Customer::find();
        if !filter.include_inactive {
            query = query.filter(customer::Column::IsActive.eq(true));
        }
        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(
                Condition::any()
                    .add(customer::Column::FirstName.contains(&term))
                    .add(customer::Column::LastName.contains(&term))
                    .add(customer::Column::Email.contains(&term))
                    .add(customer::Column::Phone.contains(&term)),
            );
        }
        let query = query
            .order_by_asc(customer::Column::LastName)
            .order_by_asc(customer::Column::FirstName);
        fetch_page(query, &*self.db, page).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_customer(
        &self,
        id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<customer::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_customer(id).await?;
        let mut active: customer::ActiveModel = existing.into();

        if let Some(first_name) = request.first_name {
            active.first_name = Set(first_name.trim().to_string());
        }
        if let Some(last_name) = request.last_name {
            active.last_name = Set(last_name.trim().to_string());
        }
        if request.email.is_some() {
            active.email = Set(trimmed(request.email).map(|e| e.to_lowercase()));
        }
        if let Some(phone) = request.phone {
            active.phone = Set(phone.trim().to_string());
        }
        if request.address.is_some() {
            active.address = Set(trimmed(request.address));
        }
        if request.notes.is_some() {
            active.notes = Set(trimmed(request.notes));
        }
        active.updated_at = Set(self.clock.now());

        Ok(active.update(&*self.db).await?)
    }

    /// Soft delete; vehicles and history stay attached.
    #[instrument(skip(self))]
    pub async fn deactivate_customer(&self, id: Uuid) -> Result<customer::Model, ServiceError> {
        let existing = self.get_customer(id).await?;
        let mut active: customer::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(self.clock.now());
        let updated = active.update(&*self.db).await?;
        info!(customer_id = %id, "customer deactivated");
        Ok(updated)
    }

    pub async fn list_customer_vehicles(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<vehicle::Model>, ServiceError> {
        self.get_customer(customer_id).await?;
        Ok(Vehicle::find()
            .filter(vehicle::Column::CustomerId.eq(customer_id))
            .filter(vehicle::Column::IsActive.eq(true))
            .order_by_asc(vehicle::Column::Make)
            .order_by_asc(vehicle::Column::Model)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn create_vehicle(
        &self,
        request: CreateVehicleRequest,
    ) -> Result<vehicle::Model, ServiceError> {
        request.validate()?;
        let owner = self.get_customer(request.customer_id).await?;
        if !owner.is_active {
            return Err(ServiceError::invalid_field(
                "customer_id",
                "Customer is inactive",
            ));
        }
        let now = self.clock.now();

        let created = vehicle::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(owner.id),
            make: Set(request.make.trim().to_string()),
            model: Set(request.model.trim().to_string()),
            year: Set(request.year),
            vin: Set(normalize_vin(request.vin)),
            license_plate: Set(trimmed(request.license_plate).map(|p| p.to_uppercase())),
            color: Set(trimmed(request.color)),
            mileage: Set(request.mileage),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::from_db(e, "A vehicle with this VIN already exists"))?;

        info!(vehicle_id = %created.id, "vehicle created");
        Ok(created)
    }

    pub async fn get_vehicle(&self, id: Uuid) -> Result<vehicle::Model, ServiceError> {
        Vehicle::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Vehicle", id))
    }

    pub async fn list_vehicles(
        &self,
        filter: VehicleFilter,
        page: PageRequest,
    ) -> Result<Page<vehicle::Model>, ServiceError> {
        let mut query = Vehicle::find();
        if !filter.include_inactive {
            query = query.filter(vehicle::Column::IsActive.eq(true));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(vehicle::Column::CustomerId.eq(customer_id));
        }
        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(
                Condition::any()
                    .add(vehicle::Column::Make.contains(&term))
                    .add(vehicle::Column::Model.contains(&term))
                    .add(vehicle::Column::Vin.contains(term.to_uppercase()))
                    .add(vehicle::Column::LicensePlate.contains(term.to_uppercase())),
            );
        }
        fetch_page(
            query.order_by_desc(vehicle::Column::CreatedAt),
            &*self.db,
            page,
        )
        .await
    }

    #[instrument(skip(self, request))]
    pub async fn update_vehicle(
        &self,
        id: Uuid,
        request: UpdateVehicleRequest,
    ) -> Result<vehicle::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_vehicle(id).await?;
        let mut active: vehicle::ActiveModel = existing.into();

        if let Some(make) = request.make {
            active.make = Set(make.trim().to_string());
        }
        if let Some(model) = request.model {
            active.model = Set(model.trim().to_string());
        }
        if let Some(year) = request.year {
            active.year = Set(year);
        }
        if request.vin.is_some() {
            active.vin = Set(normalize_vin(request.vin));
        }
        if request.license_plate.is_some() {
            active.license_plate = Set(trimmed(request.license_plate).map(|p| p.to_uppercase()));
        }
        if request.color.is_some() {
            active.color = Set(trimmed(request.color));
        }
        if let Some(mileage) = request.mileage {
            active.mileage = Set(Some(mileage));
        }
        active.updated_at = Set(self.clock.now());

        active
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "A vehicle with this VIN already exists"))
    }

    #[instrument(skip(self))]
    pub async fn deactivate_vehicle(&self, id: Uuid) -> Result<vehicle::Model, ServiceError> {
        let existing = self.get_vehicle(id).await?;
        let mut active: vehicle::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(self.clock.now());
        Ok(active.update(&*self.db).await?)
    }
}

fn normalize_vin(vin: Option<String>) -> Option<String> {
    trimmed(vin).map(|v| v.to_uppercase())
}
