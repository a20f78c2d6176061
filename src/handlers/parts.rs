use crate::{
    auth::AuthUser,
    errors::ErrorResponse,
    handlers::common::{created, ok, paginated, ApiResult, CreatedResult, PaginationParams},
    handlers::extract::{ApiJson, ApiPath, ApiQuery},
    models::{part, stock_adjustment},
    services::inventory::{
        CreatePartRequest, PartFilter, StockAdjustmentRequest, StockAdjustmentResult,
        UpdatePartRequest,
    },
    AppState, ApiResponse,
};
use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_parts).post(create_part))
        .route("/low-stock", get(list_low_stock))
        .route(
            "/:id",
            get(get_part).put(update_part).delete(delete_part),
        )
        .route("/:id/adjust-stock", post(adjust_stock))
        .route("/:id/adjustments", get(list_adjustments))
}

#[utoipa::path(
    get,
    path = "/api/v1/parts",
    params(PaginationParams, PartFilter),
    responses(
        (status = 200, description = "Parts listed", body = ApiResponse<Vec<part::Model>>)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn list_parts(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(filter): ApiQuery<PartFilter>,
) -> ApiResult<Vec<part::Model>> {
    let page = state
        .services
        .inventory
        .list_parts(filter, pagination.resolve(&state.config))
        .await?;
    Ok(paginated(page, "Parts retrieved"))
}

/// Active parts at or below their reorder level.
#[utoipa::path(
    get,
    path = "/api/v1/parts/low-stock",
    responses(
        (status = 200, description = "Low stock parts", body = ApiResponse<Vec<part::Model>>)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn list_low_stock(State(state): State<AppState>) -> ApiResult<Vec<part::Model>> {
    let parts = state.services.inventory.list_low_stock().await?;
    Ok(ok(parts, "Low stock parts retrieved"))
}

#[utoipa::path(
    post,
    path = "/api/v1/parts",
    request_body = CreatePartRequest,
    responses(
        (status = 201, description = "Part created", body = ApiResponse<part::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Part number already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn create_part(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreatePartRequest>,
) -> CreatedResult<part::Model> {
    let part = state
        .services
        .inventory
        .create_part(payload, Some(user.user_id))
        .await?;
    Ok(created(part, "Part created"))
}

#[utoipa::path(
    get,
    path = "/api/v1/parts/:id",
    params(("id" = Uuid, Path, description = "Part ID")),
    responses(
        (status = 200, description = "Part fetched", body = ApiResponse<part::Model>),
        (status = 404, description = "Part not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn get_part(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<part::Model> {
    let part = state.services.inventory.get_part(id).await?;
    Ok(ok(part, "Part retrieved"))
}

#[utoipa::path(
    put,
    path = "/api/v1/parts/:id",
    params(("id" = Uuid, Path, description = "Part ID")),
    request_body = UpdatePartRequest,
    responses(
        (status = 200, description = "Part updated", body = ApiResponse<part::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Part not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn update_part(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdatePartRequest>,
) -> ApiResult<part::Model> {
    let part = state.services.inventory.update_part(id, payload).await?;
    Ok(ok(part, "Part updated"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/parts/:id",
    params(("id" = Uuid, Path, description = "Part ID")),
    responses(
        (status = 200, description = "Part deactivated", body = ApiResponse<part::Model>),
        (status = 404, description = "Part not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn delete_part(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<part::Model> {
    let part = state.services.inventory.deactivate_part(id).await?;
    Ok(ok(part, "Part deactivated"))
}

#[utoipa::path(
    post,
    path = "/api/v1/parts/:id/adjust-stock",
    params(("id" = Uuid, Path, description = "Part ID")),
    request_body = StockAdjustmentRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = ApiResponse<StockAdjustmentResult>),
        (status = 400, description = "Invalid adjustment or insufficient stock", body = ErrorResponse),
        (status = 404, description = "Part not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<StockAdjustmentRequest>,
) -> ApiResult<StockAdjustmentResult> {
    let result = state
        .services
        .inventory
        .adjust_stock(id, payload, Some(user.user_id))
        .await?;
    Ok(ok(result, "Stock adjusted"))
}

#[utoipa::path(
    get,
    path = "/api/v1/parts/:id/adjustments",
    params(("id" = Uuid, Path, description = "Part ID")),
    responses(
        (status = 200, description = "Adjustment history, newest first", body = ApiResponse<Vec<stock_adjustment::Model>>),
        (status = 404, description = "Part not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn list_adjustments(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<stock_adjustment::Model>> {
    let adjustments = state.services.inventory.list_adjustments(id).await?;
    Ok(ok(adjustments, "Stock adjustments retrieved"))
}
