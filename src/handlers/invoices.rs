//! Invoices and the payments recorded against them.

use crate::{
    auth::AdminUser,
    errors::ErrorResponse,
    handlers::common::{
        created, deleted, ok, paginated, ApiResult, CreatedResult, PaginationParams,
    },
    handlers::extract::{ApiJson, ApiPath, ApiQuery},
    models::{invoice, payment},
    services::{
        invoicing::{CreateInvoiceRequest, InvoiceFilter, UpdateInvoiceRequest},
        payments::{PaymentReceipt, RecordPaymentRequest},
    },
    AppState, ApiResponse,
};
use axum::{
    extract::State,
    routing::get,
    Router,
};
use uuid::Uuid;

pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route(
            "/:id",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
        .route("/:id/payments", get(list_payments).post(record_payment))
}

pub fn payment_routes() -> Router<AppState> {
    Router::new().route("/:id", get(get_payment).delete(delete_payment))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    params(PaginationParams, InvoiceFilter),
    responses(
        (status = 200, description = "Invoices listed", body = ApiResponse<Vec<invoice::Model>>)
    ),
    security(("bearer_auth" = [])),
    tag = "invoices"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(filter): ApiQuery<InvoiceFilter>,
) -> ApiResult<Vec<invoice::Model>> {
    let page = state
        .services
        .invoices
        .list_invoices(filter, pagination.resolve(&state.config))
        .await?;
    Ok(paginated(page, "Invoices retrieved"))
}

#[utoipa::path(
    post,
    path = "/api/v1/invoices",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 201, description = "Invoice created", body = ApiResponse<invoice::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Work order not found", body = ErrorResponse),
        (status = 409, description = "Work order already invoiced", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "invoices"
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateInvoiceRequest>,
) -> CreatedResult<invoice::Model> {
    let invoice = state.services.invoices.create_invoice(payload).await?;
    Ok(created(invoice, "Invoice created"))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/:id",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice fetched", body = ApiResponse<invoice::Model>),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<invoice::Model> {
    let invoice = state.services.invoices.get_invoice(id).await?;
    Ok(ok(invoice, "Invoice retrieved"))
}

#[utoipa::path(
    put,
    path = "/api/v1/invoices/:id",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    request_body = UpdateInvoiceRequest,
    responses(
        (status = 200, description = "Invoice updated", body = ApiResponse<invoice::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "invoices"
)]
pub async fn update_invoice(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateInvoiceRequest>,
) -> ApiResult<invoice::Model> {
    let invoice = state.services.invoices.update_invoice(id, payload).await?;
    Ok(ok(invoice, "Invoice updated"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/invoices/:id",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice deleted"),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse),
        (status = 409, description = "Invoice has payments", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "invoices"
)]
pub async fn delete_invoice(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.services.invoices.delete_invoice(id).await?;
    Ok(deleted("Invoice deleted"))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/:id/payments",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Payments listed", body = ApiResponse<Vec<payment::Model>>),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn list_payments(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<payment::Model>> {
    let payments = state.services.payments.list_payments(id).await?;
    Ok(ok(payments, "Payments retrieved"))
}

#[utoipa::path(
    post,
    path = "/api/v1/invoices/:id/payments",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    request_body = RecordPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = ApiResponse<PaymentReceipt>),
        (status = 400, description = "Invalid amount or overpayment", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn record_payment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<RecordPaymentRequest>,
) -> CreatedResult<PaymentReceipt> {
    let receipt = state.services.payments.record_payment(id, payload).await?;
    Ok(created(receipt, "Payment recorded"))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/:id",
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment fetched", body = ApiResponse<payment::Model>),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn get_payment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<payment::Model> {
    let payment = state.services.payments.get_payment(id).await?;
    Ok(ok(payment, "Payment retrieved"))
}

/// Removes a payment and returns the invoice as reconciled afterwards.
#[utoipa::path(
    delete,
    path = "/api/v1/payments/:id",
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment deleted", body = ApiResponse<invoice::Model>),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn delete_payment(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<invoice::Model> {
    let invoice = state.services.payments.delete_payment(id).await?;
    Ok(ok(invoice, "Payment deleted"))
}
