mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::str::FromStr;
use workshop_api::models::UserRole;

fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a money value: {other}"),
    }
}

fn id_of(body: &Value) -> String {
    body["data"]["id"]
        .as_str()
        .expect("id in response data")
        .to_string()
}

#[tokio::test]
async fn health_and_openapi_are_public() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], "healthy");

    let (status, doc) = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/v1/work-orders"].is_object());
    assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
}

#[tokio::test]
async fn login_returns_a_usable_token() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": "admin@workshop.test", "password": "admin-password"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(body["data"]["user"]["role"], "ADMIN");
    assert!(body["data"]["user"].get("password_hash").is_none());
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    let (status, me) = app
        .request(Method::GET, "/api/v1/auth/me", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["email"], "admin@workshop.test");

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": "admin@workshop.test", "password": "wrong-password"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(Method::GET, "/api/v1/customers", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = app
        .request(Method::GET, "/api/v1/customers", None, Some("not-a-jwt"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn roles_gate_reports_user_management_and_deletes() {
    let app = TestApp::new().await;
    let (_, staff) = app.user_with_role("staff@workshop.test", UserRole::Staff).await;
    let (_, manager) = app
        .user_with_role("manager@workshop.test", UserRole::Manager)
        .await;

    let (status, body) = app
        .request(Method::GET, "/api/v1/reports/dashboard", None, Some(&staff))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, body) = app
        .request(Method::GET, "/api/v1/reports/dashboard", None, Some(&manager))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["open_work_orders"], 0);

    let new_user = json!({
        "email": "new@workshop.test",
        "password": "long-enough",
        "full_name": "New Hire"
    });
    let (status, _) = app
        .request(Method::POST, "/api/v1/auth/users", Some(new_user.clone()), Some(&manager))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app.admin(Method::POST, "/api/v1/auth/users", Some(new_user)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "STAFF");

    let order = app.seed_work_order().await;
    let uri = format!("/api/v1/work-orders/{}", order.id);
    let (status, _) = app.request(Method::DELETE, &uri, None, Some(&staff)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app.admin(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("data").is_none());

    let customer = app.seed_customer("Moreau").await;
    let supplier = app.seed_supplier("Brake Depot").await;
    let creations = [
        (
            "/api/v1/appointments",
            json!({
                "customer_id": customer.id,
                "scheduled_start": "2026-03-20T09:00:00Z",
                "scheduled_end": "2026-03-20T10:00:00Z"
            }),
            "/api/v1/appointments",
        ),
        (
            "/api/v1/purchase-orders",
            json!({"supplier_id": supplier.id}),
            "/api/v1/purchase-orders",
        ),
        (
            "/api/v1/expenses",
            json!({"category": "RENT", "description": "March rent", "amount": "1200.00"}),
            "/api/v1/expenses",
        ),
    ];
    for (create_uri, payload, base) in creations {
        let (status, created) = app.admin(Method::POST, create_uri, Some(payload)).await;
        assert_eq!(status, StatusCode::CREATED, "creating via {create_uri}");
        let id = created["data"]["id"]
            .as_str()
            .or_else(|| created["data"]["purchase_order"]["id"].as_str())
            .expect("created id")
            .to_string();
        let uri = format!("{base}/{id}");

        for token in [&staff, &manager] {
            let (status, body) = app
                .request(Method::DELETE, &uri, None, Some(token.as_str()))
                .await;
            assert_eq!(status, StatusCode::FORBIDDEN, "deleting {uri}");
            assert_eq!(body["error"]["code"], "FORBIDDEN");
        }
        let (status, _) = app.admin(Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK, "{uri} survives a refused delete");

        let (status, _) = app.admin(Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK, "admin deletes {uri}");
        let (status, _) = app.admin(Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn malformed_requests_get_the_error_envelope() {
    let app = TestApp::new().await;
    let order = app.seed_work_order().await;
    let status_uri = format!("/api/v1/work-orders/{}/status", order.id);

    let (status, body) = app
        .admin(Method::PUT, &status_uri, Some(json!({"status": "PAID"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["message"].is_string());
    assert!(body["error"]["details"]["body"].is_array());

    let (status, body) = app.admin(Method::PUT, &status_uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .admin(Method::GET, "/api/v1/work-orders/not-a-uuid", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, body) = app
        .admin(Method::GET, "/api/v1/customers?page=first", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["query"].is_array());

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/customers",
            Some(json!({"first_name": "Jo", "last_name": 7, "phone": "555-0100"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn customer_crud_with_pagination_and_validation() {
    let app = TestApp::new().await;

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/customers",
            Some(json!({"first_name": "", "last_name": "Blank", "phone": "555-0100"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    for name in ["Adams", "Baker", "Clark"] {
        let (status, body) = app
            .admin(
                Method::POST,
                "/api/v1/customers",
                Some(json!({"first_name": "Jo", "last_name": name, "phone": "555-0101"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
    }

    let (status, body) = app
        .admin(Method::GET, "/api/v1/customers?page=2&limit=2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["meta"]["pagination"]["total"], 3);
    assert_eq!(body["meta"]["pagination"]["total_pages"], 2);
    assert!(body["meta"]["timestamp"].is_string());

    let (status, body) = app
        .admin(Method::GET, "/api/v1/customers?search=baker", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["data"][0]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/v1/customers/{id}");
    let (status, body) = app
        .admin(Method::PUT, &uri, Some(json!({"notes": "Prefers mornings"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notes"], "Prefers mornings");

    let (status, body) = app.admin(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (status, body) = app
        .admin(Method::GET, "/api/v1/customers/00000000-0000-0000-0000-000000000000", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn job_to_payment_over_http() {
    let app = TestApp::new().await;
    let order = app.seed_work_order().await;

    let (status, service) = app
        .admin(
            Method::POST,
            "/api/v1/services",
            Some(json!({"name": "Diagnostics", "base_price": "100.00", "estimated_hours": "1.0"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, detail) = app
        .admin(
            Method::POST,
            &format!("/api/v1/work-orders/{}/services", order.id),
            Some(json!({"service_id": id_of(&service)})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(money(&detail["data"]["work_order"]["total_cost"]), dec!(100.00));

    let (status, body) = app
        .admin(
            Method::PUT,
            &format!("/api/v1/work-orders/{}/status", order.id),
            Some(json!({"status": "COMPLETED"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, invoice) = app
        .admin(
            Method::POST,
            "/api/v1/invoices",
            Some(json!({
                "work_order_id": order.id,
                "tax_amount": "10.00",
                "discount_amount": "5.00"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(invoice["data"]["status"], "UNPAID");
    assert_eq!(money(&invoice["data"]["total_amount"]), dec!(105.00));
    let invoice_id = id_of(&invoice);

    let payments_uri = format!("/api/v1/invoices/{invoice_id}/payments");
    let (status, receipt) = app
        .admin(
            Method::POST,
            &payments_uri,
            Some(json!({"amount": "50.00", "payment_method": "CARD"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["data"]["invoice"]["status"], "PARTIALLY_PAID");
    assert_eq!(money(&receipt["data"]["invoice"]["balance_due"]), dec!(55.00));

    let (status, body) = app
        .admin(
            Method::POST,
            &payments_uri,
            Some(json!({"amount": "60.00", "payment_method": "CASH"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .admin(
            Method::PUT,
            &format!("/api/v1/invoices/{invoice_id}"),
            Some(json!({"status": "PAID"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let payment_id = receipt["data"]["payment"]["id"].as_str().unwrap().to_string();
    let (status, reverted) = app
        .admin(Method::DELETE, &format!("/api/v1/payments/{payment_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reverted["data"]["status"], "UNPAID");
    assert_eq!(money(&reverted["data"]["balance_due"]), dec!(105.00));

    let (status, listed) = app.admin(Method::GET, &payments_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn stock_adjustment_over_http() {
    let app = TestApp::new().await;
    let part = app.seed_part("FLT-7", 4, dec!(12.00)).await;
    let uri = format!("/api/v1/parts/{}/adjust-stock", part.id);

    let (status, body) = app
        .admin(
            Method::POST,
            &uri,
            Some(json!({"adjustment_type": "REMOVE", "quantity": 5, "reason": "Used"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .admin(
            Method::POST,
            &uri,
            Some(json!({"adjustment_type": "SET", "quantity": 9, "reason": "Stock take"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["part"]["quantity_in_stock"], 9);
    assert_eq!(body["data"]["adjustment"]["previous_quantity"], 4);

    let (status, body) = app
        .admin(Method::GET, &format!("/api/v1/parts/{}/adjustments", part.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn appointment_conversion_accepts_an_empty_body() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Silva").await;
    let vehicle = app.seed_vehicle(customer.id).await;

    let (status, appointment) = app
        .admin(
            Method::POST,
            "/api/v1/appointments",
            Some(json!({
                "customer_id": customer.id,
                "vehicle_id": vehicle.id,
                "scheduled_start": "2026-03-20T09:00:00Z",
                "scheduled_end": "2026-03-20T10:30:00Z",
                "service_description": "Timing belt"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(appointment["data"]["status"], "SCHEDULED");

    let (status, converted) = app
        .admin(
            Method::POST,
            &format!("/api/v1/appointments/{}/convert", id_of(&appointment)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(converted["data"]["work_order"]["status"], "PENDING");
    assert_eq!(
        converted["data"]["appointment"]["work_order_id"],
        converted["data"]["work_order"]["id"]
    );

    let (status, calendar) = app
        .admin(
            Method::GET,
            "/api/v1/appointments/calendar?start=2026-03-16T00:00:00Z&end=2026-03-22T23:59:59Z",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(calendar["data"].as_array().map(Vec::len), Some(1));
}
