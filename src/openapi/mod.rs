use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Workshop API",
        version = "0.1.0",
        description = r#"
# Workshop Management API

Back office for a car workshop: customers and their vehicles, work orders,
invoices and payments, parts stock, appointments, purchase orders, expenses
and reports.

## Authentication

Every endpoint except `POST /api/v1/auth/login` and `GET /health` requires a
bearer token:

```
Authorization: Bearer <jwt>
```

Reports require the MANAGER role or higher. User management and deleting
work orders, invoices or payments require ADMIN.

## Responses

Successful calls return `{"success": true, "message", "data", "meta"}`.
`meta.pagination` is present on list endpoints, which accept `page` and
`limit` query parameters. Failures return `{"success": false, "message",
"error": {"code", "details"}}`.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Login and user accounts"),
        (name = "customers", description = "Customer records"),
        (name = "vehicles", description = "Customer vehicles"),
        (name = "employees", description = "Staff and mechanics"),
        (name = "catalog", description = "Service categories and billable services"),
        (name = "suppliers", description = "Parts suppliers"),
        (name = "inventory", description = "Parts and stock adjustments"),
        (name = "work-orders", description = "Work orders and their lines"),
        (name = "invoices", description = "Invoices"),
        (name = "payments", description = "Payments against invoices"),
        (name = "appointments", description = "Bookings and conversion to work orders"),
        (name = "purchase-orders", description = "Procurement and receiving"),
        (name = "expenses", description = "Operating expenses"),
        (name = "reports", description = "Revenue, productivity and dashboard"),
        (name = "health", description = "Liveness")
    ),
    paths(
        crate::health_check,

        handlers::auth::login,
        handlers::auth::me,
        handlers::auth::create_user,

        handlers::customers::list_customers,
        handlers::customers::create_customer,
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,
        handlers::customers::list_customer_vehicles,
        handlers::customers::list_vehicles,
        handlers::customers::create_vehicle,
        handlers::customers::get_vehicle,
        handlers::customers::update_vehicle,
        handlers::customers::delete_vehicle,

        handlers::employees::list_employees,
        handlers::employees::list_mechanics,
        handlers::employees::create_employee,
        handlers::employees::get_employee,
        handlers::employees::update_employee,
        handlers::employees::delete_employee,

        handlers::catalog::list_categories,
        handlers::catalog::create_category,
        handlers::catalog::get_category,
        handlers::catalog::update_category,
        handlers::catalog::delete_category,
        handlers::catalog::list_services,
        handlers::catalog::create_service,
        handlers::catalog::get_service,
        handlers::catalog::update_service,
        handlers::catalog::delete_service,
        handlers::catalog::list_suppliers,
        handlers::catalog::create_supplier,
        handlers::catalog::get_supplier,
        handlers::catalog::update_supplier,
        handlers::catalog::delete_supplier,

        handlers::parts::list_parts,
        handlers::parts::list_low_stock,
        handlers::parts::create_part,
        handlers::parts::get_part,
        handlers::parts::update_part,
        handlers::parts::delete_part,
        handlers::parts::adjust_stock,
        handlers::parts::list_adjustments,

        handlers::work_orders::list_work_orders,
        handlers::work_orders::create_work_order,
        handlers::work_orders::get_work_order,
        handlers::work_orders::update_work_order,
        handlers::work_orders::delete_work_order,
        handlers::work_orders::update_status,
        handlers::work_orders::assign_mechanic,
        handlers::work_orders::add_service_line,
        handlers::work_orders::remove_service_line,
        handlers::work_orders::add_part_line,
        handlers::work_orders::remove_part_line,

        handlers::invoices::list_invoices,
        handlers::invoices::create_invoice,
        handlers::invoices::get_invoice,
        handlers::invoices::update_invoice,
        handlers::invoices::delete_invoice,
        handlers::invoices::list_payments,
        handlers::invoices::record_payment,
        handlers::invoices::get_payment,
        handlers::invoices::delete_payment,

        handlers::appointments::list_appointments,
        handlers::appointments::calendar,
        handlers::appointments::create_appointment,
        handlers::appointments::get_appointment,
        handlers::appointments::update_appointment,
        handlers::appointments::delete_appointment,
        handlers::appointments::update_status,
        handlers::appointments::convert_to_work_order,

        handlers::purchase_orders::list_purchase_orders,
        handlers::purchase_orders::create_purchase_order,
        handlers::purchase_orders::get_purchase_order,
        handlers::purchase_orders::update_purchase_order,
        handlers::purchase_orders::delete_purchase_order,
        handlers::purchase_orders::update_status,
        handlers::purchase_orders::receive_purchase_order,

        handlers::expenses::list_expenses,
        handlers::expenses::create_expense,
        handlers::expenses::get_expense,
        handlers::expenses::update_expense,
        handlers::expenses::delete_expense,

        handlers::reports::dashboard,
        handlers::reports::revenue,
        handlers::reports::revenue_vs_expenses,
        handlers::reports::mechanic_productivity,
        handlers::reports::top_services,
    ),
    components(
        schemas(
            crate::ResponseMeta,
            handlers::common::PaginationMeta,
            crate::errors::ErrorResponse,
            crate::errors::ErrorBody,
            crate::models::WorkOrderStatus,
            crate::models::WorkOrderPriority,
            crate::models::InvoiceStatus,
            crate::models::AppointmentStatus,
            crate::models::PurchaseOrderStatus,
            crate::models::AdjustmentType,
            crate::models::PaymentMethod,
            crate::models::ExpenseCategory,
            crate::models::EmployeeRole,
            crate::models::UserRole,
        )
    )
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDocV1::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_workshop_paths_and_bearer_scheme() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("Workshop API"));
        assert!(json.contains("/api/v1/work-orders"));
        assert!(json.contains("/api/v1/invoices/:id/payments"));
        assert!(json.contains("bearer_auth"));
    }
}
