//! Service catalog (categories and billable services) and suppliers.

use crate::{
    clock::Clock,
    db::DbPool,
    errors::ServiceError,
    models::{
        service::{self, Entity as Service},
        service_category::{self, Entity as ServiceCategory},
        supplier::{self, Entity as Supplier},
    },
    services::{
        fetch_page, round_money, search_term, trimmed, validate_amount, Page, PageRequest,
    },
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateServiceRequest {
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom = "validate_amount")]
    pub base_price: Decimal,
    #[validate(custom = "validate_amount")]
    #[serde(default)]
    pub estimated_hours: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateServiceRequest {
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_amount")]
    pub base_price: Option<Decimal>,
    #[validate(custom = "validate_amount")]
    pub estimated_hours: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ServiceFilter {
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    pub contact_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSupplierRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    pub contact_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SupplierFilter {
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

pub struct CatalogService {
    db: Arc<DbPool>,
    clock: Arc<dyn Clock>,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    // Categories

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(
        &self,
        request: CategoryRequest,
    ) -> Result<service_category::Model, ServiceError> {
        request.validate()?;
        service_category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            description: Set(trimmed(request.description)),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::from_db(e, "A service category with this name already exists"))
    }

    pub async fn list_categories(&self) -> Result<Vec<service_category::Model>, ServiceError> {
        Ok(ServiceCategory::find()
            .order_by_asc(service_category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_category(&self, id: Uuid) -> Result<service_category::Model, ServiceError> {
        ServiceCategory::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service category", id))
    }

    pub async fn update_category(
        &self,
        id: Uuid,
        request: CategoryRequest,
    ) -> Result<service_category::Model, ServiceError> {
        request.validate()?;
        let mut active: service_category::ActiveModel = self.get_category(id).await?.into();
        active.name = Set(request.name.trim().to_string());
        active.description = Set(trimmed(request.description));
        active
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "A service category with this name already exists"))
    }

    /// Hard delete; services in the category become uncategorised.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        let category = self.get_category(id).await?;
        category.delete(&*self.db).await?;
        info!(category_id = %id, "service category deleted");
        Ok(())
    }

    // Services

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_service(
        &self,
        request: CreateServiceRequest,
    ) -> Result<service::Model, ServiceError> {
        request.validate()?;
        if let Some(category_id) = request.category_id {
            self.get_category(category_id).await?;
        }
        let now = self.clock.now();

        let created = service::ActiveModel {
            id: Set(Uuid::new_v4()),
            category_id: Set(request.category_id),
            name: Set(request.name.trim().to_string()),
            description: Set(trimmed(request.description)),
            base_price: Set(round_money(request.base_price)),
            estimated_hours: Set(request.estimated_hours.round_dp(2)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(service_id = %created.id, "service created");
        Ok(created)
    }

    pub async fn get_service(&self, id: Uuid) -> Result<service::Model, ServiceError> {
        Service::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service", id))
    }

    pub async fn list_services(
        &self,
        filter: ServiceFilter,
        page: PageRequest,
    ) -> Result<Page<service::Model>, ServiceError> {
        let mut query = Service::find();
        if !filter.include_inactive {
            query = query.filter(service::Column::IsActive.eq(true));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(service::Column::CategoryId.eq(category_id));
        }
        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(
                Condition::any()
                    .add(service::Column::Name.contains(&term))
                    .add(service::Column::Description.contains(&term)),
            );
        }
        fetch_page(
            query.order_by_asc(service::Column::Name),
            &*self.db,
            page,
        )
        .await
    }

    #[instrument(skip(self, request))]
    pub async fn update_service(
        &self,
        id: Uuid,
        request: UpdateServiceRequest,
    ) -> Result<service::Model, ServiceError> {
        request.validate()?;
        let mut active: service::ActiveModel = self.get_service(id).await?.into();

        if let Some(category_id) = request.category_id {
            self.get_category(category_id).await?;
            active.category_id = Set(Some(category_id));
        }
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if request.description.is_some() {
            active.description = Set(trimmed(request.description));
        }
        if let Some(price) = request.base_price {
            active.base_price = Set(round_money(price));
        }
        if let Some(hours) = request.estimated_hours {
            active.estimated_hours = Set(hours.round_dp(2));
        }
        active.updated_at = Set(self.clock.now());

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn deactivate_service(&self, id: Uuid) -> Result<service::Model, ServiceError> {
        let mut active: service::ActiveModel = self.get_service(id).await?.into();
        active.is_active = Set(false);
        active.updated_at = Set(self.clock.now());
        Ok(active.update(&*self.db).await?)
    }

    // Suppliers

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_supplier(
        &self,
        request: CreateSupplierRequest,
    ) -> Result<supplier::Model, ServiceError> {
        request.validate()?;
        let now = self.clock.now();

        let created = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            contact_name: Set(trimmed(request.contact_name)),
            email: Set(trimmed(request.email).map(|e| e.to_lowercase())),
            phone: Set(trimmed(request.phone)),
            address: Set(trimmed(request.address)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(supplier_id = %created.id, "supplier created");
        Ok(created)
    }

    pub async fn get_supplier(&self, id: Uuid) -> Result<supplier::Model, ServiceError> {
        Supplier::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Supplier", id))
    }

    pub async fn list_suppliers(
        &self,
        filter: SupplierFilter,
        page: PageRequest,
    ) -> Result<Page<supplier::Model>, ServiceError> {
        let mut query = Supplier::find();
        if !filter.include_inactive {
            query = query.filter(supplier::Column::IsActive.eq(true));
        }
        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(
                Condition::any()
                    .add(supplier::Column::Name.contains(&term))
                    .add(supplier::Column::ContactName.contains(&term))
                    .add(supplier::Column::Email.contains(&term)),
            );
        }
        fetch_page(
            query.order_by_asc(supplier::Column::Name),
            &*self.db,
            page,
        )
        .await
    }

    #[instrument(skip(self, request))]
    pub async fn update_supplier(
        &self,
        id: Uuid,
        request: UpdateSupplierRequest,
    ) -> Result<supplier::Model, ServiceError> {
        request.validate()?;
        let mut active: supplier::ActiveModel = self.get_supplier(id).await?.into();

        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if request.contact_name.is_some() {
            active.contact_name = Set(trimmed(request.contact_name));
        }
        if request.email.is_some() {
            active.email = Set(trimmed(request.email).map(|e| e.to_lowercase()));
        }
        if request.phone.is_some() {
            active.phone = Set(trimmed(request.phone));
        }
        if request.address.is_some() {
            active.address = Set(trimmed(request.address));
        }
        active.updated_at = Set(self.clock.now());

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn deactivate_supplier(&self, id: Uuid) -> Result<supplier::Model, ServiceError> {
        let mut active: supplier::ActiveModel = self.get_supplier(id).await?.into();
        active.is_active = Set(false);
        active.updated_at = Set(self.clock.now());
        Ok(active.update(&*self.db).await?)
    }
}
