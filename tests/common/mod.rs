#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::ServiceExt;
use workshop_api::{
    auth::CreateUserRequest,
    build_router,
    clock::FixedClock,
    config::AppConfig,
    db, events,
    models::{
        customer, employee, part, service, supplier, user, vehicle, work_order, EmployeeRole,
        UserRole,
    },
    services::{
        catalog::{CreateServiceRequest, CreateSupplierRequest},
        customers::{CreateCustomerRequest, CreateVehicleRequest},
        employees::CreateEmployeeRequest,
        inventory::CreatePartRequest,
        work_orders::CreateWorkOrderRequest,
    },
    AppState,
};

pub const TEST_SECRET: &str = "workshop_test_secret_key_with_at_least_32_chars";

/// Mid-March 2026, 10:00 UTC.
pub fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 15, 10, 0, 0).unwrap()
}

/// Application state over a private in-memory SQLite database.
///
/// The pool holds exactly one connection: every `sqlite::memory:` connection
/// is its own database.
pub struct TestApp {
    pub state: AppState,
    pub clock: FixedClock,
    router: Router,
    admin_token: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_SECRET.to_string(),
            "127.0.0.1".to_string(),
            8080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.default_tax_rate = 0.0;
        tweak(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to open test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let clock = FixedClock::new(start_instant());
        let (state, event_rx) = AppState::build(pool, cfg, Arc::new(clock.clone()));
        let event_task = tokio::spawn(events::process_events(event_rx));
        let router = build_router(state.clone());

        let admin = state
            .auth
            .create_user(CreateUserRequest {
                email: "admin@workshop.test".to_string(),
                password: "admin-password".to_string(),
                full_name: "Test Admin".to_string(),
                role: UserRole::Admin,
            })
            .await
            .expect("seed admin user");
        let admin_token = state.auth.generate_token(&admin).expect("admin token");

        Self {
            state,
            clock,
            router,
            admin_token,
            _event_task: event_task,
        }
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    /// Creates a user with the given role and returns it with a bearer token.
    pub async fn user_with_role(&self, email: &str, role: UserRole) -> (user::Model, String) {
        let user = self
            .state
            .auth
            .create_user(CreateUserRequest {
                email: email.to_string(),
                password: "user-password".to_string(),
                full_name: format!("{} user", role),
                role,
            })
            .await
            .expect("seed user");
        let token = self.state.auth.generate_token(&user).expect("user token");
        (user, token)
    }

    /// Sends a request through the full router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("router error during test request");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Request as the seeded admin.
    pub async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request(method, uri, body, Some(&self.admin_token)).await
    }

    pub async fn seed_customer(&self, last_name: &str) -> customer::Model {
        self.state
            .services
            .customers
            .create_customer(CreateCustomerRequest {
                first_name: "Alex".to_string(),
                last_name: last_name.to_string(),
                email: Some(format!("{}@example.com", last_name.to_lowercase())),
                phone: "555-0100".to_string(),
                address: None,
                notes: None,
            })
            .await
            .expect("seed customer")
    }

    pub async fn seed_vehicle(&self, customer_id: uuid::Uuid) -> vehicle::Model {
        self.state
            .services
            .customers
            .create_vehicle(CreateVehicleRequest {
                customer_id,
                make: "Toyota".to_string(),
                model: "Corolla".to_string(),
                year: 2018,
                vin: None,
                license_plate: None,
                color: Some("Blue".to_string()),
                mileage: Some(84_000),
            })
            .await
            .expect("seed vehicle")
    }

    pub async fn seed_mechanic(&self, last_name: &str, hourly_rate: Decimal) -> employee::Model {
        self.state
            .services
            .employees
            .create_employee(CreateEmployeeRequest {
                first_name: "Sam".to_string(),
                last_name: last_name.to_string(),
                email: format!("{}@workshop.test", last_name.to_lowercase()),
                phone: None,
                role: EmployeeRole::Mechanic,
                hourly_rate,
            })
            .await
            .expect("seed mechanic")
    }

    pub async fn seed_supplier(&self, name: &str) -> supplier::Model {
        self.state
            .services
            .catalog
            .create_supplier(CreateSupplierRequest {
                name: name.to_string(),
                contact_name: None,
                email: None,
                phone: None,
                address: None,
            })
            .await
            .expect("seed supplier")
    }

    pub async fn seed_service(&self, name: &str, base_price: Decimal) -> service::Model {
        self.state
            .services
            .catalog
            .create_service(CreateServiceRequest {
                category_id: None,
                name: name.to_string(),
                description: None,
                base_price,
                estimated_hours: dec!(1.0),
            })
            .await
            .expect("seed service")
    }

    pub async fn seed_part(&self, part_number: &str, stock: i32, selling_price: Decimal) -> part::Model {
        self.state
            .services
            .inventory
            .create_part(
                CreatePartRequest {
                    part_number: part_number.to_string(),
                    name: format!("Part {}", part_number),
                    description: None,
                    supplier_id: None,
                    quantity_in_stock: stock,
                    reorder_level: 2,
                    unit_cost: selling_price / dec!(2),
                    selling_price,
                },
                None,
            )
            .await
            .expect("seed part")
    }

    /// A customer with one vehicle and a fresh PENDING work order.
    pub async fn seed_work_order(&self) -> work_order::Model {
        let customer = self.seed_customer("Rivera").await;
        let vehicle = self.seed_vehicle(customer.id).await;
        self.state
            .services
            .work_orders
            .create_work_order(CreateWorkOrderRequest {
                customer_id: customer.id,
                vehicle_id: vehicle.id,
                assigned_mechanic_id: None,
                priority: Default::default(),
                description: Some("Brake noise".to_string()),
                diagnosis: None,
                mileage_in: Some(84_100),
            })
            .await
            .expect("seed work order")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
