//! Workshop API Library
//!
//! Backend for a car workshop: customers and vehicles, work orders with
//! service and part lines, invoicing and payments, parts inventory,
//! appointments, purchase orders, expenses and reporting.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod lifecycle;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod services;
pub mod telemetry;

use axum::{extract::State, http::HeaderValue, response::Json, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer};
use tracing::info;
use utoipa::ToSchema;

use crate::auth::{AuthRouterExt, AuthService};
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::{EventEnvelope, EventSender};
use crate::handlers::{common::PaginationMeta, AppServices};
use crate::models::UserRole;

/// Shared state handed to every handler. Everything in it is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: Arc<AppConfig>,
    pub event_sender: Arc<EventSender>,
    pub services: AppServices,
    pub auth: Arc<AuthService>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wires services around an open pool. The returned receiver must be
    /// drained by [`events::process_events`].
    pub fn build(
        db: DbPool,
        config: AppConfig,
        clock: Arc<dyn Clock>,
    ) -> (Self, mpsc::Receiver<EventEnvelope>) {
        let db = Arc::new(db);
        let (sender, receiver) = EventSender::channel(config.event_channel_capacity);
        let event_sender = Arc::new(sender);
        let services = AppServices::new(db.clone(), event_sender.clone(), clock.clone(), &config);
        let auth = Arc::new(AuthService::new(
            auth::AuthConfig::from(&config),
            db.clone(),
        ));

        let state = Self {
            db,
            config: Arc::new(config),
            event_sender,
            services,
            auth,
            clock,
        };
        (state, receiver)
    }
}

// Common response wrappers
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

impl ResponseMeta {
    fn capture(pagination: Option<PaginationMeta>) -> Self {
        Self {
            request_id: telemetry::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
            pagination,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            meta: Some(ResponseMeta::capture(None)),
        }
    }

    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            meta: Some(ResponseMeta::capture(None)),
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn paginated(items: Vec<T>, pagination: PaginationMeta, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(items),
            meta: Some(ResponseMeta::capture(Some(pagination))),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            telemetry::scope_request_id(telemetry::RequestId::new("meta-123"), async {
                ApiResponse::success("ok", "done")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        assert!(meta.pagination.is_none());
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn paginated_response_carries_pagination() {
        let meta = PaginationMeta {
            page: 2,
            limit: 10,
            total: 25,
            total_pages: 3,
        };
        let response = ApiResponse::paginated(vec![1, 2, 3], meta, "listed");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["meta"]["pagination"]["total_pages"], 3);
    }

    #[test]
    fn message_only_response_omits_data() {
        let response = ApiResponse::<()>::message_only("Invoice deleted");
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["message"], "Invoice deleted");
    }
}

/// All `/api/v1` routes. Only `/auth/login` is reachable without a token;
/// reports need MANAGER and user management needs ADMIN.
pub fn api_v1_routes(auth: Arc<AuthService>) -> Router<AppState> {
    let protected = Router::new()
        .nest("/customers", handlers::customers::customer_routes())
        .nest("/vehicles", handlers::customers::vehicle_routes())
        .nest("/employees", handlers::employees::routes())
        .nest("/service-categories", handlers::catalog::category_routes())
        .nest("/services", handlers::catalog::service_routes())
        .nest("/suppliers", handlers::catalog::supplier_routes())
        .nest("/parts", handlers::parts::routes())
        .nest("/work-orders", handlers::work_orders::routes())
        .nest("/invoices", handlers::invoices::invoice_routes())
        .nest("/payments", handlers::invoices::payment_routes())
        .nest("/appointments", handlers::appointments::routes())
        .nest("/purchase-orders", handlers::purchase_orders::routes())
        .nest("/expenses", handlers::expenses::routes())
        .with_auth(auth.clone());

    let reports = Router::new()
        .nest("/reports", handlers::reports::routes())
        .with_role(auth.clone(), UserRole::Manager);

    Router::new()
        .nest("/auth", handlers::auth::routes(auth))
        .merge(protected)
        .merge(reports)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    /// `healthy` or `unhealthy`
    pub status: &'static str,
    pub database: &'static str,
    pub database_latency_ms: Option<u64>,
    pub version: &'static str,
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service health", body = ApiResponse<HealthStatus>)),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let (database, latency) = match db::check_connection(&state.db).await {
        Ok(elapsed) => ("healthy", Some(elapsed.as_millis() as u64)),
        Err(_) => ("unhealthy", None),
    };
    let health = HealthStatus {
        status: database,
        database,
        database_latency_ms: latency,
        version: env!("CARGO_PKG_VERSION"),
    };
    Json(ApiResponse::success(health, "Health check"))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        info!("Using permissive CORS because explicit origins were not configured");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    }
}

/// Full application router with the middleware stack applied.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_v1_routes(state.auth.clone()))
        .merge(openapi::swagger_ui())
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&config))
        .layer(telemetry::configure_http_tracing())
        .layer(axum::middleware::from_fn(telemetry::request_id_middleware))
        .with_state(state)
}
