use crate::{
    auth::AdminUser,
    errors::ErrorResponse,
    handlers::common::{
        created, deleted, ok, paginated, ApiResult, CreatedResult, PaginationParams,
    },
    handlers::extract::{ApiJson, ApiPath, ApiQuery},
    models::expense,
    services::expenses::{CreateExpenseRequest, ExpenseFilter, UpdateExpenseRequest},
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
        .route("/", get(list_expenses).post(create_expense))
        .route(
            "/:id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/expenses",
    params(PaginationParams, ExpenseFilter),
    responses(
        (status = 200, description = "Expenses listed", body = ApiResponse<Vec<expense::Model>>)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn list_expenses(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(filter): ApiQuery<ExpenseFilter>,
) -> ApiResult<Vec<expense::Model>> {
    let page = state
        .services
        .expenses
        .list_expenses(filter, pagination.resolve(&state.config))
        .await?;
    Ok(paginated(page, "Expenses retrieved"))
}

#[utoipa::path(
    post,
    path = "/api/v1/expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense recorded", body = ApiResponse<expense::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn create_expense(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateExpenseRequest>,
) -> CreatedResult<expense::Model> {
    let expense = state.services.expenses.create_expense(payload).await?;
    Ok(created(expense, "Expense recorded"))
}

#[utoipa::path(
    get,
    path = "/api/v1/expenses/:id",
    params(("id" = Uuid, Path, description = "Expense ID")),
    responses(
        (status = 200, description = "Expense fetched", body = ApiResponse<expense::Model>),
        (status = 404, description = "Expense not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn get_expense(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<expense::Model> {
    let expense = state.services.expenses.get_expense(id).await?;
    Ok(ok(expense, "Expense retrieved"))
}

#[utoipa::path(
    put,
    path = "/api/v1/expenses/:id",
    params(("id" = Uuid, Path, description = "Expense ID")),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated", body = ApiResponse<expense::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn update_expense(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateExpenseRequest>,
) -> ApiResult<expense::Model> {
    let expense = state.services.expenses.update_expense(id, payload).await?;
    Ok(ok(expense, "Expense updated"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/expenses/:id",
    params(("id" = Uuid, Path, description = "Expense ID")),
    responses(
        (status = 200, description = "Expense deleted"),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn delete_expense(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.services.expenses.delete_expense(id).await?;
    Ok(deleted("Expense deleted"))
}
