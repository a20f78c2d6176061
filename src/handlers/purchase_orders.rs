use crate::{
    auth::{AdminUser, AuthUser},
    errors::ErrorResponse,
    handlers::common::{
        created, deleted, ok, paginated, ApiResult, CreatedResult, PaginationParams,
    },
    handlers::extract::{ApiJson, ApiPath, ApiQuery},
    models::purchase_order,
    services::procurement::{
        CreatePurchaseOrderRequest, PurchaseOrderDetail, PurchaseOrderFilter,
        PurchaseOrderStatusRequest, UpdatePurchaseOrderRequest,
    },
    AppState, ApiResponse,
};
use axum::{
    extract::State,
    routing::{get, post, put},
    Router,
};
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_purchase_orders).post(create_purchase_order))
        .route(
            "/:id",
            get(get_purchase_order)
                .put(update_purchase_order)
                .delete(delete_purchase_order),
        )
        .route("/:id/status", put(update_status))
        .route("/:id/receive", post(receive_purchase_order))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders",
    params(PaginationParams, PurchaseOrderFilter),
    responses(
        (status = 200, description = "Purchase orders listed", body = ApiResponse<Vec<purchase_order::Model>>)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(filter): ApiQuery<PurchaseOrderFilter>,
) -> ApiResult<Vec<purchase_order::Model>> {
    let page = state
        .services
        .procurement
        .list_purchase_orders(filter, pagination.resolve(&state.config))
        .await?;
    Ok(paginated(page, "Purchase orders retrieved"))
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders",
    request_body = CreatePurchaseOrderRequest,
    responses(
        (status = 201, description = "Purchase order created", body = ApiResponse<PurchaseOrderDetail>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Supplier or part not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreatePurchaseOrderRequest>,
) -> CreatedResult<PurchaseOrderDetail> {
    let detail = state
        .services
        .procurement
        .create_purchase_order(payload)
        .await?;
    Ok(created(detail, "Purchase order created"))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/:id",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order with items", body = ApiResponse<PurchaseOrderDetail>),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<PurchaseOrderDetail> {
    let detail = state.services.procurement.get_purchase_order(id).await?;
    Ok(ok(detail, "Purchase order retrieved"))
}

#[utoipa::path(
    put,
    path = "/api/v1/purchase-orders/:id",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    request_body = UpdatePurchaseOrderRequest,
    responses(
        (status = 200, description = "Purchase order updated", body = ApiResponse<PurchaseOrderDetail>),
        (status = 400, description = "Invalid request or items locked", body = ErrorResponse),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn update_purchase_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdatePurchaseOrderRequest>,
) -> ApiResult<PurchaseOrderDetail> {
    let detail = state
        .services
        .procurement
        .update_purchase_order(id, payload)
        .await?;
    Ok(ok(detail, "Purchase order updated"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/purchase-orders/:id",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order deleted"),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Purchase order not found", body = ErrorResponse),
        (status = 409, description = "Only draft or cancelled orders can be deleted", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn delete_purchase_order(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.services.procurement.delete_purchase_order(id).await?;
    Ok(deleted("Purchase order deleted"))
}

#[utoipa::path(
    put,
    path = "/api/v1/purchase-orders/:id/status",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    request_body = PurchaseOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<PurchaseOrderDetail>),
        (status = 400, description = "Transition not allowed", body = ErrorResponse),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<PurchaseOrderStatusRequest>,
) -> ApiResult<PurchaseOrderDetail> {
    let detail = state
        .services
        .procurement
        .update_status(id, payload, Some(user.user_id))
        .await?;
    Ok(ok(detail, "Purchase order status updated"))
}

/// Marks the order RECEIVED and adds every item to stock.
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/:id/receive",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order received", body = ApiResponse<PurchaseOrderDetail>),
        (status = 400, description = "Order cannot be received", body = ErrorResponse),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn receive_purchase_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<PurchaseOrderDetail> {
    let detail = state
        .services
        .procurement
        .receive(id, Some(user.user_id))
        .await?;
    Ok(ok(detail, "Purchase order received"))
}
