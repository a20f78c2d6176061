//! Service categories, billable services and suppliers.

use crate::{
    errors::ErrorResponse,
    handlers::common::{
        created, deleted, ok, paginated, ApiResult, CreatedResult, PaginationParams,
    },
    handlers::extract::{ApiJson, ApiPath, ApiQuery},
    models::{service, service_category, supplier},
    services::catalog::{
        CategoryRequest, CreateServiceRequest, CreateSupplierRequest, ServiceFilter,
        SupplierFilter, UpdateServiceRequest, UpdateSupplierRequest,
    },
    AppState, ApiResponse,
};
use axum::{
    extract::State,
    routing::get,
    Router,
};
use uuid::Uuid;

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:id",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

pub fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services).post(create_service))
        .route(
            "/:id",
            get(get_service).put(update_service).delete(delete_service),
        )
}

pub fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route(
            "/:id",
            get(get_supplier)
                .put(update_supplier)
                .delete(delete_supplier),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/service-categories",
    responses(
        (status = 200, description = "Categories listed", body = ApiResponse<Vec<service_category::Model>>)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> ApiResult<Vec<service_category::Model>> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(ok(categories, "Service categories retrieved"))
}

#[utoipa::path(
    post,
    path = "/api/v1/service-categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<service_category::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Name already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn create_category(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CategoryRequest>,
) -> CreatedResult<service_category::Model> {
    let category = state.services.catalog.create_category(payload).await?;
    Ok(created(category, "Service category created"))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-categories/:id",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category fetched", body = ApiResponse<service_category::Model>),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn get_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<service_category::Model> {
    let category = state.services.catalog.get_category(id).await?;
    Ok(ok(category, "Service category retrieved"))
}

#[utoipa::path(
    put,
    path = "/api/v1/service-categories/:id",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<service_category::Model>),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn update_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<CategoryRequest>,
) -> ApiResult<service_category::Model> {
    let category = state.services.catalog.update_category(id, payload).await?;
    Ok(ok(category, "Service category updated"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/service-categories/:id",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.services.catalog.delete_category(id).await?;
    Ok(deleted("Service category deleted"))
}

#[utoipa::path(
    get,
    path = "/api/v1/services",
    params(PaginationParams, ServiceFilter),
    responses(
        (status = 200, description = "Services listed", body = ApiResponse<Vec<service::Model>>)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn list_services(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(filter): ApiQuery<ServiceFilter>,
) -> ApiResult<Vec<service::Model>> {
    let page = state
        .services
        .catalog
        .list_services(filter, pagination.resolve(&state.config))
        .await?;
    Ok(paginated(page, "Services retrieved"))
}

#[utoipa::path(
    post,
    path = "/api/v1/services",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Service created", body = ApiResponse<service::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn create_service(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateServiceRequest>,
) -> CreatedResult<service::Model> {
    let service = state.services.catalog.create_service(payload).await?;
    Ok(created(service, "Service created"))
}

#[utoipa::path(
    get,
    path = "/api/v1/services/:id",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service fetched", body = ApiResponse<service::Model>),
        (status = 404, description = "Service not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn get_service(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<service::Model> {
    let service = state.services.catalog.get_service(id).await?;
    Ok(ok(service, "Service retrieved"))
}

#[utoipa::path(
    put,
    path = "/api/v1/services/:id",
    params(("id" = Uuid, Path, description = "Service ID")),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Service updated", body = ApiResponse<service::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Service not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn update_service(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateServiceRequest>,
) -> ApiResult<service::Model> {
    let service = state.services.catalog.update_service(id, payload).await?;
    Ok(ok(service, "Service updated"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/services/:id",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service deactivated", body = ApiResponse<service::Model>),
        (status = 404, description = "Service not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn delete_service(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<service::Model> {
    let service = state.services.catalog.deactivate_service(id).await?;
    Ok(ok(service, "Service deactivated"))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers",
    params(PaginationParams, SupplierFilter),
    responses(
        (status = 200, description = "Suppliers listed", body = ApiResponse<Vec<supplier::Model>>)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(filter): ApiQuery<SupplierFilter>,
) -> ApiResult<Vec<supplier::Model>> {
    let page = state
        .services
        .catalog
        .list_suppliers(filter, pagination.resolve(&state.config))
        .await?;
    Ok(paginated(page, "Suppliers retrieved"))
}

#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    request_body = CreateSupplierRequest,
    responses(
        (status = 201, description = "Supplier created", body = ApiResponse<supplier::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateSupplierRequest>,
) -> CreatedResult<supplier::Model> {
    let supplier = state.services.catalog.create_supplier(payload).await?;
    Ok(created(supplier, "Supplier created"))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers/:id",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier fetched", body = ApiResponse<supplier::Model>),
        (status = 404, description = "Supplier not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<supplier::Model> {
    let supplier = state.services.catalog.get_supplier(id).await?;
    Ok(ok(supplier, "Supplier retrieved"))
}

#[utoipa::path(
    put,
    path = "/api/v1/suppliers/:id",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    request_body = UpdateSupplierRequest,
    responses(
        (status = 200, description = "Supplier updated", body = ApiResponse<supplier::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Supplier not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateSupplierRequest>,
) -> ApiResult<supplier::Model> {
    let supplier = state.services.catalog.update_supplier(id, payload).await?;
    Ok(ok(supplier, "Supplier updated"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/suppliers/:id",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier deactivated", body = ApiResponse<supplier::Model>),
        (status = 404, description = "Supplier not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "suppliers"
)]
pub async fn delete_supplier(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<supplier::Model> {
    let supplier = state.services.catalog.deactivate_supplier(id).await?;
    Ok(ok(supplier, "Supplier deactivated"))
}
