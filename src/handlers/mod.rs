//! HTTP handlers, one module per API area.

pub mod appointments;
pub mod auth;
pub mod catalog;
pub mod common;
pub mod customers;
pub mod employees;
pub mod expenses;
pub mod extract;
pub mod invoices;
pub mod parts;
pub mod purchase_orders;
pub mod reports;
pub mod work_orders;

use crate::{
    clock::Clock,
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        appointments::AppointmentService,
        catalog::CatalogService,
        customers::CustomerService,
        employees::EmployeeService,
        expenses::ExpenseService,
        inventory::InventoryService,
        invoicing::{InvoiceService, InvoiceSettings},
        payments::PaymentService,
        procurement::ProcurementService,
        reports::ReportService,
        work_orders::WorkOrderService,
    },
};
use std::sync::Arc;

pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub customers: Arc<CustomerService>,
    pub employees: Arc<EmployeeService>,
    pub catalog: Arc<CatalogService>,
    pub inventory: Arc<InventoryService>,
    pub work_orders: Arc<WorkOrderService>,
    pub invoices: Arc<InvoiceService>,
    pub payments: Arc<PaymentService>,
    pub appointments: Arc<AppointmentService>,
    pub procurement: Arc<ProcurementService>,
    pub expenses: Arc<ExpenseService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        clock: Arc<dyn Clock>,
        config: &AppConfig,
    ) -> Self {
        Self {
            customers: Arc::new(CustomerService::new(db.clone(), clock.clone())),
            employees: Arc::new(EmployeeService::new(db.clone(), clock.clone())),
            catalog: Arc::new(CatalogService::new(db.clone(), clock.clone())),
            inventory: Arc::new(InventoryService::new(
                db.clone(),
                event_sender.clone(),
                clock.clone(),
            )),
            work_orders: Arc::new(WorkOrderService::new(
                db.clone(),
                event_sender.clone(),
                clock.clone(),
            )),
            invoices: Arc::new(InvoiceService::new(
                db.clone(),
                event_sender.clone(),
                clock.clone(),
                InvoiceSettings::from(config),
            )),
            payments: Arc::new(PaymentService::new(
                db.clone(),
                event_sender.clone(),
                clock.clone(),
            )),
            appointments: Arc::new(AppointmentService::new(
                db.clone(),
                event_sender.clone(),
                clock.clone(),
            )),
            procurement: Arc::new(ProcurementService::new(
                db.clone(),
                event_sender,
                clock.clone(),
            )),
            expenses: Arc::new(ExpenseService::new(db.clone(), clock.clone())),
            reports: Arc::new(ReportService::new(db, clock)),
        }
    }
}
