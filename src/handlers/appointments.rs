use crate::{
    auth::AdminUser,
    errors::ErrorResponse,
    handlers::common::{
        created, deleted, ok, paginated, ApiResult, CreatedResult, PaginationParams,
    },
    handlers::extract::{ApiJson, ApiPath, ApiQuery, OptionalJson},
    models::appointment,
    services::appointments::{
        AppointmentConversion, AppointmentFilter, AppointmentStatusRequest,
        ConvertAppointmentRequest, CreateAppointmentRequest, UpdateAppointmentRequest,
    },
    AppState, ApiResponse,
};
use axum::{
    extract::State,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

/// Window for the calendar view.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CalendarQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_appointments).post(create_appointment))
        .route("/calendar", get(calendar))
        .route(
            "/:id",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
        .route("/:id/status", put(update_status))
        .route("/:id/convert", post(convert_to_work_order))
}

#[utoipa::path(
    get,
    path = "/api/v1/appointments",
    params(PaginationParams, AppointmentFilter),
    responses(
        (status = 200, description = "Appointments listed", body = ApiResponse<Vec<appointment::Model>>)
    ),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn list_appointments(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(filter): ApiQuery<AppointmentFilter>,
) -> ApiResult<Vec<appointment::Model>> {
    let page = state
        .services
        .appointments
        .list_appointments(filter, pagination.resolve(&state.config))
        .await?;
    Ok(paginated(page, "Appointments retrieved"))
}

#[utoipa::path(
    get,
    path = "/api/v1/appointments/calendar",
    params(CalendarQuery),
    responses(
        (status = 200, description = "Appointments starting in the window", body = ApiResponse<Vec<appointment::Model>>)
    ),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn calendar(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CalendarQuery>,
) -> ApiResult<Vec<appointment::Model>> {
    let appointments = state
        .services
        .appointments
        .list_in_range(query.start, query.end)
        .await?;
    Ok(ok(appointments, "Appointments retrieved"))
}

#[utoipa::path(
    post,
    path = "/api/v1/appointments",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked", body = ApiResponse<appointment::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Customer or vehicle not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn create_appointment(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateAppointmentRequest>,
) -> CreatedResult<appointment::Model> {
    let appointment = state
        .services
        .appointments
        .create_appointment(payload)
        .await?;
    Ok(created(appointment, "Appointment booked"))
}

#[utoipa::path(
    get,
    path = "/api/v1/appointments/:id",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment fetched", body = ApiResponse<appointment::Model>),
        (status = 404, description = "Appointment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn get_appointment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<appointment::Model> {
    let appointment = state.services.appointments.get_appointment(id).await?;
    Ok(ok(appointment, "Appointment retrieved"))
}

#[utoipa::path(
    put,
    path = "/api/v1/appointments/:id",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    request_body = UpdateAppointmentRequest,
    responses(
        (status = 200, description = "Appointment updated", body = ApiResponse<appointment::Model>),
        (status = 400, description = "Invalid request or appointment closed", body = ErrorResponse),
        (status = 404, description = "Appointment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn update_appointment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateAppointmentRequest>,
) -> ApiResult<appointment::Model> {
    let appointment = state
        .services
        .appointments
        .update_appointment(id, payload)
        .await?;
    Ok(ok(appointment, "Appointment updated"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/appointments/:id",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment deleted"),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Appointment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn delete_appointment(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.services.appointments.delete_appointment(id).await?;
    Ok(deleted("Appointment deleted"))
}

#[utoipa::path(
    put,
    path = "/api/v1/appointments/:id/status",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    request_body = AppointmentStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<appointment::Model>),
        (status = 400, description = "Transition not allowed", body = ErrorResponse),
        (status = 404, description = "Appointment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn update_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AppointmentStatusRequest>,
) -> ApiResult<appointment::Model> {
    let appointment = state
        .services
        .appointments
        .update_status(id, payload)
        .await?;
    Ok(ok(appointment, "Appointment status updated"))
}

/// The body is optional; an absent body uses the defaults.
#[utoipa::path(
    post,
    path = "/api/v1/appointments/:id/convert",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    request_body(content = Option<ConvertAppointmentRequest>, description = "Overrides for the new work order"),
    responses(
        (status = 201, description = "Work order created from appointment", body = ApiResponse<AppointmentConversion>),
        (status = 400, description = "Appointment cannot be converted", body = ErrorResponse),
        (status = 404, description = "Appointment not found", body = ErrorResponse),
        (status = 409, description = "Appointment already converted", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "appointments"
)]
pub async fn convert_to_work_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    OptionalJson(request): OptionalJson<ConvertAppointmentRequest>,
) -> CreatedResult<AppointmentConversion> {
    let conversion = state
        .services
        .appointments
        .convert_to_work_order(id, request)
        .await?;
    Ok(created(conversion, "Appointment converted to work order"))
}
