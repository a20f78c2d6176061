use crate::{
    errors::ErrorResponse,
    handlers::common::{created, ok, paginated, ApiResult, CreatedResult, PaginationParams},
    handlers::extract::{ApiJson, ApiPath, ApiQuery},
    models::employee,
    services::employees::{CreateEmployeeRequest, EmployeeFilter, UpdateEmployeeRequest},
    AppState, ApiResponse,
};
use axum::{
    extract::State,
    routing::get,
    Router,
};
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route("/mechanics", get(list_mechanics))
        .route(
            "/:id",
            get(get_employee)
                .put(update_employee)
                .delete(delete_employee),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(PaginationParams, EmployeeFilter),
    responses(
        (status = 200, description = "Employees listed", body = ApiResponse<Vec<employee::Model>>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "employees"
)]
pub async fn list_employees(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(filter): ApiQuery<EmployeeFilter>,
) -> ApiResult<Vec<employee::Model>> {
    let page = state
        .services
        .employees
        .list_employees(filter, pagination.resolve(&state.config))
        .await?;
    Ok(paginated(page, "Employees retrieved"))
}

/// Active mechanics, for assignment pickers.
#[utoipa::path(
    get,
    path = "/api/v1/employees/mechanics",
    responses(
        (status = 200, description = "Mechanics listed", body = ApiResponse<Vec<employee::Model>>)
    ),
    security(("bearer_auth" = [])),
    tag = "employees"
)]
pub async fn list_mechanics(State(state): State<AppState>) -> ApiResult<Vec<employee::Model>> {
    let mechanics = state.services.employees.list_mechanics().await?;
    Ok(ok(mechanics, "Mechanics retrieved"))
}

#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = ApiResponse<employee::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "employees"
)]
pub async fn create_employee(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateEmployeeRequest>,
) -> CreatedResult<employee::Model> {
    let employee = state.services.employees.create_employee(payload).await?;
    Ok(created(employee, "Employee created"))
}

#[utoipa::path(
    get,
    path = "/api/v1/employees/:id",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee fetched", body = ApiResponse<employee::Model>),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "employees"
)]
pub async fn get_employee(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<employee::Model> {
    let employee = state.services.employees.get_employee(id).await?;
    Ok(ok(employee, "Employee retrieved"))
}

#[utoipa::path(
    put,
    path = "/api/v1/employees/:id",
    params(("id" = Uuid, Path, description = "Employee ID")),
    request_body = UpdateEmployeeRequest,
    responses(
        (status = 200, description = "Employee updated", body = ApiResponse<employee::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "employees"
)]
pub async fn update_employee(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateEmployeeRequest>,
) -> ApiResult<employee::Model> {
    let employee = state.services.employees.update_employee(id, payload).await?;
    Ok(ok(employee, "Employee updated"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/employees/:id",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee deactivated", body = ApiResponse<employee::Model>),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "employees"
)]
pub async fn delete_employee(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<employee::Model> {
    let employee = state.services.employees.deactivate_employee(id).await?;
    Ok(ok(employee, "Employee deactivated"))
}
