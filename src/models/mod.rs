//! sea-orm entities, one module per table.

// Master data
pub mod customer;
pub mod employee;
pub mod part;
pub mod service;
pub mod service_category;
pub mod supplier;
pub mod vehicle;

// Workshop jobs
pub mod appointment;
pub mod work_order;
pub mod work_order_part;
pub mod work_order_service;

// Money
pub mod expense;
pub mod invoice;
pub mod payment;

// Inventory and procurement
pub mod purchase_order;
pub mod purchase_order_item;
pub mod stock_adjustment;

// Infrastructure
pub mod document_sequence;
pub mod user;

pub use appointment::AppointmentStatus;
pub use employee::EmployeeRole;
pub use expense::ExpenseCategory;
pub use invoice::InvoiceStatus;
pub use payment::PaymentMethod;
pub use purchase_order::PurchaseOrderStatus;
pub use stock_adjustment::AdjustmentType;
pub use user::UserRole;
pub use work_order::{WorkOrderPriority, WorkOrderStatus};
