use crate::{
    auth::{AdminUser, AuthUser},
    errors::ErrorResponse,
    handlers::common::{
        created, deleted, ok, paginated, ApiResult, CreatedResult, PaginationParams,
    },
    handlers::extract::{ApiJson, ApiPath, ApiQuery},
    models::work_order,
    services::work_orders::{
        AddPartLineRequest, AddServiceLineRequest, AssignMechanicRequest, CreateWorkOrderRequest,
        UpdateWorkOrderRequest, WorkOrderDetail, WorkOrderFilter, WorkOrderStatusRequest,
    },
    AppState, ApiResponse,
};
use axum::{
    extract::State,
    routing::{delete, get, post, put},
    Router,
};
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_work_orders).post(create_work_order))
        .route(
            "/:id",
            get(get_work_order)
                .put(update_work_order)
                .delete(delete_work_order),
        )
        .route("/:id/status", put(update_status))
        .route("/:id/assign", put(assign_mechanic))
        .route("/:id/services", post(add_service_line))
        .route("/:id/services/:line_id", delete(remove_service_line))
        .route("/:id/parts", post(add_part_line))
        .route("/:id/parts/:line_id", delete(remove_part_line))
}

#[utoipa::path(
    get,
    path = "/api/v1/work-orders",
    params(PaginationParams, WorkOrderFilter),
    responses(
        (status = 200, description = "Work orders listed", body = ApiResponse<Vec<work_order::Model>>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "work-orders"
)]
pub async fn list_work_orders(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(filter): ApiQuery<WorkOrderFilter>,
) -> ApiResult<Vec<work_order::Model>> {
    let page = state
        .services
        .work_orders
        .list_work_orders(filter, pagination.resolve(&state.config))
        .await?;
    Ok(paginated(page, "Work orders retrieved"))
}

#[utoipa::path(
    post,
    path = "/api/v1/work-orders",
    request_body = CreateWorkOrderRequest,
    responses(
        (status = 201, description = "Work order created", body = ApiResponse<work_order::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Customer or vehicle not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "work-orders"
)]
pub async fn create_work_order(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateWorkOrderRequest>,
) -> CreatedResult<work_order::Model> {
    let work_order = state.services.work_orders.create_work_order(payload).await?;
    Ok(created(work_order, "Work order created"))
}

#[utoipa::path(
    get,
    path = "/api/v1/work-orders/:id",
    params(("id" = Uuid, Path, description = "Work order ID")),
    responses(
        (status = 200, description = "Work order with its lines", body = ApiResponse<WorkOrderDetail>),
        (status = 404, description = "Work order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "work-orders"
)]
pub async fn get_work_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<WorkOrderDetail> {
    let detail = state.services.work_orders.get_work_order(id).await?;
    Ok(ok(detail, "Work order retrieved"))
}

#[utoipa::path(
    put,
    path = "/api/v1/work-orders/:id",
    params(("id" = Uuid, Path, description = "Work order ID")),
    request_body = UpdateWorkOrderRequest,
    responses(
        (status = 200, description = "Work order updated", body = ApiResponse<work_order::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Work order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "work-orders"
)]
pub async fn update_work_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateWorkOrderRequest>,
) -> ApiResult<work_order::Model> {
    let work_order = state
        .services
        .work_orders
        .update_work_order(id, payload)
        .await?;
    Ok(ok(work_order, "Work order updated"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/work-orders/:id",
    params(("id" = Uuid, Path, description = "Work order ID")),
    responses(
        (status = 200, description = "Work order deleted"),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Work order not found", body = ErrorResponse),
        (status = 409, description = "Work order has been invoiced", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "work-orders"
)]
pub async fn delete_work_order(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state
        .services
        .work_orders
        .delete_work_order(id, Some(admin.user_id))
        .await?;
    Ok(deleted("Work order deleted"))
}

#[utoipa::path(
    put,
    path = "/api/v1/work-orders/:id/status",
    params(("id" = Uuid, Path, description = "Work order ID")),
    request_body = WorkOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<work_order::Model>),
        (status = 400, description = "Transition not allowed", body = ErrorResponse),
        (status = 404, description = "Work order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "work-orders"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<WorkOrderStatusRequest>,
) -> ApiResult<work_order::Model> {
    let work_order = state
        .services
        .work_orders
        .update_status(id, payload, Some(user.user_id))
        .await?;
    Ok(ok(work_order, "Work order status updated"))
}

#[utoipa::path(
    put,
    path = "/api/v1/work-orders/:id/assign",
    params(("id" = Uuid, Path, description = "Work order ID")),
    request_body = AssignMechanicRequest,
    responses(
        (status = 200, description = "Mechanic assigned", body = ApiResponse<work_order::Model>),
        (status = 400, description = "Employee is not an active mechanic", body = ErrorResponse),
        (status = 404, description = "Work order or employee not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "work-orders"
)]
pub async fn assign_mechanic(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AssignMechanicRequest>,
) -> ApiResult<work_order::Model> {
    let work_order = state.services.work_orders.assign_mechanic(id, payload).await?;
    Ok(ok(work_order, "Mechanic assigned"))
}

#[utoipa::path(
    post,
    path = "/api/v1/work-orders/:id/services",
    params(("id" = Uuid, Path, description = "Work order ID")),
    request_body = AddServiceLineRequest,
    responses(
        (status = 201, description = "Service line added", body = ApiResponse<WorkOrderDetail>),
        (status = 400, description = "Invalid request or work order locked", body = ErrorResponse),
        (status = 404, description = "Work order or service not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "work-orders"
)]
pub async fn add_service_line(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AddServiceLineRequest>,
) -> CreatedResult<WorkOrderDetail> {
    let detail = state
        .services
        .work_orders
        .add_service_line(id, payload)
        .await?;
    Ok(created(detail, "Service line added"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/work-orders/:id/services/:line_id",
    params(
        ("id" = Uuid, Path, description = "Work order ID"),
        ("line_id" = Uuid, Path, description = "Service line ID")
    ),
    responses(
        (status = 200, description = "Service line removed", body = ApiResponse<WorkOrderDetail>),
        (status = 400, description = "Work order locked", body = ErrorResponse),
        (status = 404, description = "Line not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "work-orders"
)]
pub async fn remove_service_line(
    State(state): State<AppState>,
    ApiPath((id, line_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<WorkOrderDetail> {
    let detail = state
        .services
        .work_orders
        .remove_service_line(id, line_id)
        .await?;
    Ok(ok(detail, "Service line removed"))
}

#[utoipa::path(
    post,
    path = "/api/v1/work-orders/:id/parts",
    params(("id" = Uuid, Path, description = "Work order ID")),
    request_body = AddPartLineRequest,
    responses(
        (status = 201, description = "Part line added and stock drawn", body = ApiResponse<WorkOrderDetail>),
        (status = 400, description = "Invalid request, insufficient stock or work order locked", body = ErrorResponse),
        (status = 404, description = "Work order or part not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "work-orders"
)]
pub async fn add_part_line(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AddPartLineRequest>,
) -> CreatedResult<WorkOrderDetail> {
    let detail = state
        .services
        .work_orders
        .add_part_line(id, payload, Some(user.user_id))
        .await?;
    Ok(created(detail, "Part line added"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/work-orders/:id/parts/:line_id",
    params(
        ("id" = Uuid, Path, description = "Work order ID"),
        ("line_id" = Uuid, Path, description = "Part line ID")
    ),
    responses(
        (status = 200, description = "Part line removed and stock returned", body = ApiResponse<WorkOrderDetail>),
        (status = 400, description = "Work order locked", body = ErrorResponse),
        (status = 404, description = "Line not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "work-orders"
)]
pub async fn remove_part_line(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((id, line_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<WorkOrderDetail> {
    let detail = state
        .services
        .work_orders
        .remove_part_line(id, line_id, Some(user.user_id))
        .await?;
    Ok(ok(detail, "Part line removed"))
}
