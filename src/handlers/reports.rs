use crate::{
    errors::ErrorResponse,
    handlers::common::{ok, ApiResult},
    handlers::extract::ApiQuery,
    services::reports::{
        DashboardSummary, DateRange, Granularity, MechanicProductivity, ProfitPoint,
        RevenuePoint, ServiceUsage, DEFAULT_TOP_SERVICES,
    },
    AppState, ApiResponse,
};
use axum::{
    extract::State,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GranularityQuery {
    /// DAY (default) or MONTH
    pub granularity: Option<Granularity>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TopServicesQuery {
    /// Number of services to return (default 10)
    pub limit: Option<usize>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/revenue", get(revenue))
        .route("/revenue-vs-expenses", get(revenue_vs_expenses))
        .route("/mechanic-productivity", get(mechanic_productivity))
        .route("/top-services", get(top_services))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/dashboard",
    responses(
        (status = 200, description = "Dashboard counters", body = ApiResponse<DashboardSummary>),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<DashboardSummary> {
    let summary = state.services.reports.dashboard_summary().await?;
    Ok(ok(summary, "Dashboard summary"))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/revenue",
    params(DateRange, GranularityQuery),
    responses(
        (status = 200, description = "Payments received per period", body = ApiResponse<Vec<RevenuePoint>>),
        (status = 400, description = "Invalid date range", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn revenue(
    State(state): State<AppState>,
    ApiQuery(range): ApiQuery<DateRange>,
    ApiQuery(query): ApiQuery<GranularityQuery>,
) -> ApiResult<Vec<RevenuePoint>> {
    let points = state
        .services
        .reports
        .revenue(range, query.granularity.unwrap_or_default())
        .await?;
    Ok(ok(points, "Revenue report"))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/revenue-vs-expenses",
    params(DateRange),
    responses(
        (status = 200, description = "Monthly revenue, expenses and profit", body = ApiResponse<Vec<ProfitPoint>>)
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn revenue_vs_expenses(
    State(state): State<AppState>,
    ApiQuery(range): ApiQuery<DateRange>,
) -> ApiResult<Vec<ProfitPoint>> {
    let points = state.services.reports.revenue_vs_expenses(range).await?;
    Ok(ok(points, "Revenue vs expenses report"))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/mechanic-productivity",
    params(DateRange),
    responses(
        (status = 200, description = "Completed work per mechanic", body = ApiResponse<Vec<MechanicProductivity>>)
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn mechanic_productivity(
    State(state): State<AppState>,
    ApiQuery(range): ApiQuery<DateRange>,
) -> ApiResult<Vec<MechanicProductivity>> {
    let rows = state.services.reports.mechanic_productivity(range).await?;
    Ok(ok(rows, "Mechanic productivity report"))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/top-services",
    params(DateRange, TopServicesQuery),
    responses(
        (status = 200, description = "Most used services", body = ApiResponse<Vec<ServiceUsage>>)
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn top_services(
    State(state): State<AppState>,
    ApiQuery(range): ApiQuery<DateRange>,
    ApiQuery(query): ApiQuery<TopServicesQuery>,
) -> ApiResult<Vec<ServiceUsage>> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_SERVICES).clamp(1, 100);
    let rows = state.services.reports.top_services(range, limit).await?;
    Ok(ok(rows, "Top services report"))
}
