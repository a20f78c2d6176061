use crate::{
    errors::ErrorResponse,
    handlers::common::{created, ok, paginated, ApiResult, CreatedResult, PaginationParams},
    handlers::extract::{ApiJson, ApiPath, ApiQuery},
    models::{customer, vehicle},
    services::customers::{
        CreateCustomerRequest, CreateVehicleRequest, CustomerFilter, UpdateCustomerRequest,
        UpdateVehicleRequest, VehicleFilter,
    },
    AppState, ApiResponse,
};
use axum::{
    extract::State,
    routing::get,
    Router,
};
use uuid::Uuid;

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/:id",
            get(get_customer)
                .put(update_customer)
                .delete(delete_customer),
        )
        .route("/:id/vehicles", get(list_customer_vehicles))
}

pub fn vehicle_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route(
            "/:id",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/customers",
    params(PaginationParams, CustomerFilter),
    responses(
        (status = 200, description = "Customers listed", body = ApiResponse<Vec<customer::Model>>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(filter): ApiQuery<CustomerFilter>,
) -> ApiResult<Vec<customer::Model>> {
    let page = state
        .services
        .customers
        .list_customers(filter, pagination.resolve(&state.config))
        .await?;
    Ok(paginated(page, "Customers retrieved"))
}

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = ApiResponse<customer::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateCustomerRequest>,
) -> CreatedResult<customer::Model> {
    let customer = state.services.customers.create_customer(payload).await?;
    Ok(created(customer, "Customer created"))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/:id",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer fetched", body = ApiResponse<customer::Model>),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<customer::Model> {
    let customer = state.services.customers.get_customer(id).await?;
    Ok(ok(customer, "Customer retrieved"))
}

#[utoipa::path(
    put,
    path = "/api/v1/customers/:id",
    params(("id" = Uuid, Path, description = "Customer ID")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = ApiResponse<customer::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn update_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateCustomerRequest>,
) -> ApiResult<customer::Model> {
    let customer = state.services.customers.update_customer(id, payload).await?;
    Ok(ok(customer, "Customer updated"))
}

/// Customers are deactivated rather than removed so history stays intact.
#[utoipa::path(
    delete,
    path = "/api/v1/customers/:id",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer deactivated", body = ApiResponse<customer::Model>),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<customer::Model> {
    let customer = state.services.customers.deactivate_customer(id).await?;
    Ok(ok(customer, "Customer deactivated"))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/:id/vehicles",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Vehicles listed", body = ApiResponse<Vec<vehicle::Model>>),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn list_customer_vehicles(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<vehicle::Model>> {
    let vehicles = state.services.customers.list_customer_vehicles(id).await?;
    Ok(ok(vehicles, "Vehicles retrieved"))
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles",
    params(PaginationParams, VehicleFilter),
    responses(
        (status = 200, description = "Vehicles listed", body = ApiResponse<Vec<vehicle::Model>>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn list_vehicles(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(filter): ApiQuery<VehicleFilter>,
) -> ApiResult<Vec<vehicle::Model>> {
    let page = state
        .services
        .customers
        .list_vehicles(filter, pagination.resolve(&state.config))
        .await?;
    Ok(paginated(page, "Vehicles retrieved"))
}

#[utoipa::path(
    post,
    path = "/api/v1/vehicles",
    request_body = CreateVehicleRequest,
    responses(
        (status = 201, description = "Vehicle registered", body = ApiResponse<vehicle::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse),
        (status = 409, description = "VIN already registered", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn create_vehicle(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateVehicleRequest>,
) -> CreatedResult<vehicle::Model> {
    let vehicle = state.services.customers.create_vehicle(payload).await?;
    Ok(created(vehicle, "Vehicle registered"))
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles/:id",
    params(("id" = Uuid, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle fetched", body = ApiResponse<vehicle::Model>),
        (status = 404, description = "Vehicle not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn get_vehicle(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<vehicle::Model> {
    let vehicle = state.services.customers.get_vehicle(id).await?;
    Ok(ok(vehicle, "Vehicle retrieved"))
}

#[utoipa::path(
    put,
    path = "/api/v1/vehicles/:id",
    params(("id" = Uuid, Path, description = "Vehicle ID")),
    request_body = UpdateVehicleRequest,
    responses(
        (status = 200, description = "Vehicle updated", body = ApiResponse<vehicle::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Vehicle not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn update_vehicle(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateVehicleRequest>,
) -> ApiResult<vehicle::Model> {
    let vehicle = state.services.customers.update_vehicle(id, payload).await?;
    Ok(ok(vehicle, "Vehicle updated"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/vehicles/:id",
    params(("id" = Uuid, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle deactivated", body = ApiResponse<vehicle::Model>),
        (status = 404, description = "Vehicle not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn delete_vehicle(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<vehicle::Model> {
    let vehicle = state.services.customers.deactivate_vehicle(id).await?;
    Ok(ok(vehicle, "Vehicle deactivated"))
}
