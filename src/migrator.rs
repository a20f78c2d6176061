use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_master_data::Migration),
            Box::new(m20260101_000002_create_workshop_jobs::Migration),
            Box::new(m20260101_000003_create_billing::Migration),
            Box::new(m20260101_000004_create_inventory::Migration),
        ]
    }
}

// Column helpers shared by every migration

fn uuid_pk<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().primary_key().to_owned()
}

fn money<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .decimal_len(12, 2)
        .not_null()
        .default(0)
        .to_owned()
}

fn timestamp<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

fn active_flag<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).boolean().not_null().default(true).to_owned()
}

async fn index<T, C>(
    manager: &SchemaManager<'_>,
    name: &str,
    table: T,
    col: C,
    unique: bool,
) -> Result<(), DbErr>
where
    T: IntoIden + 'static,
    C: IntoIden,
{
    let mut stmt = Index::create();
    stmt.if_not_exists().name(name).table(table).col(col);
    if unique {
        stmt.unique();
    }
    manager.create_index(stmt.to_owned()).await
}

mod m20260101_000001_create_master_data {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000001_create_master_data"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(uuid_pk(Users::Id))
                        .col(ColumnDef::new(Users::Email).string().not_null())
                        .col(ColumnDef::new(Users::PasswordHash).text().not_null())
                        .col(ColumnDef::new(Users::FullName).string().not_null())
                        .col(ColumnDef::new(Users::Role).string_len(16).not_null())
                        .col(active_flag(Users::IsActive))
                        .col(timestamp(Users::CreatedAt))
                        .col(timestamp(Users::UpdatedAt))
                        .to_owned(),
                )
                .await?;
            index(manager, "idx_users_email", Users::Table, Users::Email, true).await?;

            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(uuid_pk(Customers::Id))
                        .col(ColumnDef::new(Customers::FirstName).string().not_null())
                        .col(ColumnDef::new(Customers::LastName).string().not_null())
                        .col(ColumnDef::new(Customers::Email).string().null())
                        .col(ColumnDef::new(Customers::Phone).string().not_null())
                        .col(ColumnDef::new(Customers::Address).string().null())
                        .col(ColumnDef::new(Customers::Notes).text().null())
                        .col(active_flag(Customers::IsActive))
                        .col(timestamp(Customers::CreatedAt))
                        .col(timestamp(Customers::UpdatedAt))
                        .to_owned(),
                )
                .await?;
            index(
                manager,
                "idx_customers_last_name",
                Customers::Table,
                Customers::LastName,
                false,
            )
            .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Vehicles::Table)
                        .if_not_exists()
                        .col(uuid_pk(Vehicles::Id))
                        .col(ColumnDef::new(Vehicles::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Vehicles::Make).string().not_null())
                        .col(ColumnDef::new(Vehicles::Model).string().not_null())
                        .col(ColumnDef::new(Vehicles::Year).integer().not_null())
                        .col(ColumnDef::new(Vehicles::Vin).string_len(17).null())
                        .col(ColumnDef::new(Vehicles::LicensePlate).string().null())
                        .col(ColumnDef::new(Vehicles::Color).string().null())
                        .col(ColumnDef::new(Vehicles::Mileage).integer().null())
                        .col(active_flag(Vehicles::IsActive))
                        .col(timestamp(Vehicles::CreatedAt))
                        .col(timestamp(Vehicles::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vehicles_customer_id")
                                .from(Vehicles::Table, Vehicles::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;
            index(manager, "idx_vehicles_vin", Vehicles::Table, Vehicles::Vin, true).await?;
            index(
                manager,
                "idx_vehicles_customer_id",
                Vehicles::Table,
                Vehicles::CustomerId,
                false,
            )
            .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Employees::Table)
                        .if_not_exists()
                        .col(uuid_pk(Employees::Id))
                        .col(ColumnDef::new(Employees::FirstName).string().not_null())
                        .col(ColumnDef::new(Employees::LastName).string().not_null())
                        .col(ColumnDef::new(Employees::Email).string().not_null())
                        .col(ColumnDef::new(Employees::Phone).string().null())
                        .col(ColumnDef::new(Employees::Role).string_len(32).not_null())
                        .col(
                            ColumnDef::new(Employees::HourlyRate)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(active_flag(Employees::IsActive))
                        .col(timestamp(Employees::CreatedAt))
                        .col(timestamp(Employees::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ServiceCategories::Table)
                        .if_not_exists()
                        .col(uuid_pk(ServiceCategories::Id))
                        .col(ColumnDef::new(ServiceCategories::Name).string().not_null())
                        .col(ColumnDef::new(ServiceCategories::Description).text().null())
                        .to_owned(),
                )
                .await?;
            index(
                manager,
                "idx_service_categories_name",
                ServiceCategories::Table,
                ServiceCategories::Name,
                true,
            )
            .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Services::Table)
                        .if_not_exists()
                        .col(uuid_pk(Services::Id))
                        .col(ColumnDef::new(Services::CategoryId).uuid().null())
                        .col(ColumnDef::new(Services::Name).string().not_null())
                        .col(ColumnDef::new(Services::Description).text().null())
                        .col(money(Services::BasePrice))
                        .col(
                            ColumnDef::new(Services::EstimatedHours)
                                .decimal_len(6, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(active_flag(Services::IsActive))
                        .col(timestamp(Services::CreatedAt))
                        .col(timestamp(Services::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_services_category_id")
                                .from(Services::Table, Services::CategoryId)
                                .to(ServiceCategories::Table, ServiceCategories::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(uuid_pk(Suppliers::Id))
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::ContactName).string().null())
                        .col(ColumnDef::new(Suppliers::Email).string().null())
                        .col(ColumnDef::new(Suppliers::Phone).string().null())
                        .col(ColumnDef::new(Suppliers::Address).string().null())
                        .col(active_flag(Suppliers::IsActive))
                        .col(timestamp(Suppliers::CreatedAt))
                        .col(timestamp(Suppliers::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Parts::Table)
                        .if_not_exists()
                        .col(uuid_pk(Parts::Id))
                        .col(ColumnDef::new(Parts::PartNumber).string().not_null())
                        .col(ColumnDef::new(Parts::Name).string().not_null())
                        .col(ColumnDef::new(Parts::Description).text().null())
                        .col(ColumnDef::new(Parts::SupplierId).uuid().null())
                        .col(
                            ColumnDef::new(Parts::QuantityInStock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Parts::ReorderLevel)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(money(Parts::UnitCost))
                        .col(money(Parts::SellingPrice))
                        .col(active_flag(Parts::IsActive))
                        .col(timestamp(Parts::CreatedAt))
                        .col(timestamp(Parts::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_parts_supplier_id")
                                .from(Parts::Table, Parts::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;
            index(
                manager,
                "idx_parts_part_number",
                Parts::Table,
                Parts::PartNumber,
                true,
            )
            .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                Parts::Table.into_iden(),
                Suppliers::Table.into_iden(),
                Services::Table.into_iden(),
                ServiceCategories::Table.into_iden(),
                Employees::Table.into_iden(),
                Vehicles::Table.into_iden(),
                Customers::Table.into_iden(),
                Users::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Users {
        Table,
        Id,
        Email,
        PasswordHash,
        FullName,
        Role,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Customers {
        Table,
        Id,
        FirstName,
        LastName,
        Email,
        Phone,
        Address,
        Notes,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Vehicles {
        Table,
        Id,
        CustomerId,
        Make,
        Model,
        Year,
        Vin,
        LicensePlate,
        Color,
        Mileage,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Employees {
        Table,
        Id,
        FirstName,
        LastName,
        Email,
        Phone,
        Role,
        HourlyRate,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum ServiceCategories {
        Table,
        Id,
        Name,
        Description,
    }

    #[derive(DeriveIden)]
    pub(super) enum Services {
        Table,
        Id,
        CategoryId,
        Name,
        Description,
        BasePrice,
        EstimatedHours,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Suppliers {
        Table,
        Id,
        Name,
        ContactName,
        Email,
        Phone,
        Address,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Parts {
        Table,
        Id,
        PartNumber,
        Name,
        Description,
        SupplierId,
        QuantityInStock,
        ReorderLevel,
        UnitCost,
        SellingPrice,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260101_000002_create_workshop_jobs {
    use super::m20260101_000001_create_master_data::{
        Customers, Employees, Parts, Services, Vehicles,
    };
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000002_create_workshop_jobs"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // work_order_id carries no foreign key: the link is one-way and
            // cleared by the work order delete path.
            manager
                .create_table(
                    Table::create()
                        .table(Appointments::Table)
                        .if_not_exists()
                        .col(uuid_pk(Appointments::Id))
                        .col(ColumnDef::new(Appointments::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Appointments::VehicleId).uuid().null())
                        .col(ColumnDef::new(Appointments::AssignedMechanicId).uuid().null())
                        .col(timestamp(Appointments::ScheduledStart))
                        .col(timestamp(Appointments::ScheduledEnd))
                        .col(ColumnDef::new(Appointments::ServiceDescription).text().null())
                        .col(ColumnDef::new(Appointments::Notes).text().null())
                        .col(ColumnDef::new(Appointments::Status).string_len(32).not_null())
                        .col(ColumnDef::new(Appointments::WorkOrderId).uuid().null())
                        .col(timestamp(Appointments::CreatedAt))
                        .col(timestamp(Appointments::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_appointments_customer_id")
                                .from(Appointments::Table, Appointments::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_appointments_vehicle_id")
                                .from(Appointments::Table, Appointments::VehicleId)
                                .to(Vehicles::Table, Vehicles::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_appointments_mechanic_id")
                                .from(Appointments::Table, Appointments::AssignedMechanicId)
                                .to(Employees::Table, Employees::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;
            index(
                manager,
                "idx_appointments_scheduled_start",
                Appointments::Table,
                Appointments::ScheduledStart,
                false,
            )
            .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WorkOrders::Table)
                        .if_not_exists()
                        .col(uuid_pk(WorkOrders::Id))
                        .col(
                            ColumnDef::new(WorkOrders::WorkOrderNumber)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkOrders::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(WorkOrders::VehicleId).uuid().not_null())
                        .col(ColumnDef::new(WorkOrders::AssignedMechanicId).uuid().null())
                        .col(ColumnDef::new(WorkOrders::AppointmentId).uuid().null())
                        .col(ColumnDef::new(WorkOrders::Status).string_len(32).not_null())
                        .col(ColumnDef::new(WorkOrders::Priority).string_len(16).not_null())
                        .col(ColumnDef::new(WorkOrders::Description).text().null())
                        .col(ColumnDef::new(WorkOrders::Diagnosis).text().null())
                        .col(ColumnDef::new(WorkOrders::MileageIn).integer().null())
                        .col(ColumnDef::new(WorkOrders::ActualHours).decimal_len(8, 2).null())
                        .col(
                            ColumnDef::new(WorkOrders::StartDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::CompletionDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(money(WorkOrders::TotalLaborCost))
                        .col(money(WorkOrders::TotalPartsCost))
                        .col(money(WorkOrders::TotalCost))
                        .col(timestamp(WorkOrders::CreatedAt))
                        .col(timestamp(WorkOrders::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_work_orders_customer_id")
                                .from(WorkOrders::Table, WorkOrders::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_work_orders_vehicle_id")
                                .from(WorkOrders::Table, WorkOrders::VehicleId)
                                .to(Vehicles::Table, Vehicles::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_work_orders_mechanic_id")
                                .from(WorkOrders::Table, WorkOrders::AssignedMechanicId)
                                .to(Employees::Table, Employees::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_work_orders_appointment_id")
                                .from(WorkOrders::Table, WorkOrders::AppointmentId)
                                .to(Appointments::Table, Appointments::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;
            index(
                manager,
                "idx_work_orders_number",
                WorkOrders::Table,
                WorkOrders::WorkOrderNumber,
                true,
            )
            .await?;
            index(
                manager,
                "idx_work_orders_status",
                WorkOrders::Table,
                WorkOrders::Status,
                false,
            )
            .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WorkOrderServices::Table)
                        .if_not_exists()
                        .col(uuid_pk(WorkOrderServices::Id))
                        .col(ColumnDef::new(WorkOrderServices::WorkOrderId).uuid().not_null())
                        .col(ColumnDef::new(WorkOrderServices::ServiceId).uuid().not_null())
                        .col(ColumnDef::new(WorkOrderServices::Quantity).integer().not_null())
                        .col(money(WorkOrderServices::UnitPrice))
                        .col(money(WorkOrderServices::TotalPrice))
                        .col(ColumnDef::new(WorkOrderServices::Notes).text().null())
                        .col(timestamp(WorkOrderServices::CreatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_work_order_services_work_order_id")
                                .from(WorkOrderServices::Table, WorkOrderServices::WorkOrderId)
                                .to(WorkOrders::Table, WorkOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_work_order_services_service_id")
                                .from(WorkOrderServices::Table, WorkOrderServices::ServiceId)
                                .to(Services::Table, Services::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WorkOrderParts::Table)
                        .if_not_exists()
                        .col(uuid_pk(WorkOrderParts::Id))
                        .col(ColumnDef::new(WorkOrderParts::WorkOrderId).uuid().not_null())
                        .col(ColumnDef::new(WorkOrderParts::PartId).uuid().not_null())
                        .col(ColumnDef::new(WorkOrderParts::Quantity).integer().not_null())
                        .col(money(WorkOrderParts::UnitPrice))
                        .col(money(WorkOrderParts::TotalPrice))
                        .col(timestamp(WorkOrderParts::CreatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_work_order_parts_work_order_id")
                                .from(WorkOrderParts::Table, WorkOrderParts::WorkOrderId)
                                .to(WorkOrders::Table, WorkOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_work_order_parts_part_id")
                                .from(WorkOrderParts::Table, WorkOrderParts::PartId)
                                .to(Parts::Table, Parts::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                WorkOrderParts::Table.into_iden(),
                WorkOrderServices::Table.into_iden(),
                WorkOrders::Table.into_iden(),
                Appointments::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum Appointments {
        Table,
        Id,
        CustomerId,
        VehicleId,
        AssignedMechanicId,
        ScheduledStart,
        ScheduledEnd,
        ServiceDescription,
        Notes,
        Status,
        WorkOrderId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum WorkOrders {
        Table,
        Id,
        WorkOrderNumber,
        CustomerId,
        VehicleId,
        AssignedMechanicId,
        AppointmentId,
        Status,
        Priority,
        Description,
        Diagnosis,
        MileageIn,
        ActualHours,
        StartDate,
        CompletionDate,
        TotalLaborCost,
        TotalPartsCost,
        TotalCost,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum WorkOrderServices {
        Table,
        Id,
        WorkOrderId,
        ServiceId,
        Quantity,
        UnitPrice,
        TotalPrice,
        Notes,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum WorkOrderParts {
        Table,
        Id,
        WorkOrderId,
        PartId,
        Quantity,
        UnitPrice,
        TotalPrice,
        CreatedAt,
    }
}

mod m20260101_000003_create_billing {
    use super::m20260101_000001_create_master_data::Customers;
    use super::m20260101_000002_create_workshop_jobs::WorkOrders;
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000003_create_billing"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DocumentSequences::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DocumentSequences::Prefix)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(ColumnDef::new(DocumentSequences::Year).integer().not_null())
                        .col(
                            ColumnDef::new(DocumentSequences::LastValue)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .primary_key(
                            Index::create()
                                .col(DocumentSequences::Prefix)
                                .col(DocumentSequences::Year),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(uuid_pk(Invoices::Id))
                        .col(
                            ColumnDef::new(Invoices::InvoiceNumber)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Invoices::WorkOrderId).uuid().not_null())
                        .col(ColumnDef::new(Invoices::CustomerId).uuid().not_null())
                        .col(money(Invoices::Subtotal))
                        .col(money(Invoices::TaxAmount))
                        .col(money(Invoices::DiscountAmount))
                        .col(money(Invoices::TotalAmount))
                        .col(money(Invoices::AmountPaid))
                        .col(money(Invoices::BalanceDue))
                        .col(ColumnDef::new(Invoices::Status).string_len(32).not_null())
                        .col(ColumnDef::new(Invoices::IssueDate).date().not_null())
                        .col(ColumnDef::new(Invoices::DueDate).date().null())
                        .col(ColumnDef::new(Invoices::Notes).text().null())
                        .col(timestamp(Invoices::CreatedAt))
                        .col(timestamp(Invoices::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_work_order_id")
                                .from(Invoices::Table, Invoices::WorkOrderId)
                                .to(WorkOrders::Table, WorkOrders::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_customer_id")
                                .from(Invoices::Table, Invoices::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;
            index(
                manager,
                "idx_invoices_invoice_number",
                Invoices::Table,
                Invoices::InvoiceNumber,
                true,
            )
            .await?;
            index(
                manager,
                "idx_invoices_work_order_id",
                Invoices::Table,
                Invoices::WorkOrderId,
                true,
            )
            .await?;
            index(
                manager,
                "idx_invoices_status",
                Invoices::Table,
                Invoices::Status,
                false,
            )
            .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(uuid_pk(Payments::Id))
                        .col(ColumnDef::new(Payments::InvoiceId).uuid().not_null())
                        .col(money(Payments::Amount))
                        .col(
                            ColumnDef::new(Payments::PaymentMethod)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Payments::PaymentDate).date().not_null())
                        .col(ColumnDef::new(Payments::Reference).string().null())
                        .col(ColumnDef::new(Payments::Notes).text().null())
                        .col(timestamp(Payments::CreatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payments_invoice_id")
                                .from(Payments::Table, Payments::InvoiceId)
                                .to(Invoices::Table, Invoices::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;
            index(
                manager,
                "idx_payments_payment_date",
                Payments::Table,
                Payments::PaymentDate,
                false,
            )
            .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Expenses::Table)
                        .if_not_exists()
                        .col(uuid_pk(Expenses::Id))
                        .col(ColumnDef::new(Expenses::Category).string_len(32).not_null())
                        .col(ColumnDef::new(Expenses::Description).string().not_null())
                        .col(money(Expenses::Amount))
                        .col(ColumnDef::new(Expenses::ExpenseDate).date().not_null())
                        .col(ColumnDef::new(Expenses::Vendor).string().null())
                        .col(ColumnDef::new(Expenses::Reference).string().null())
                        .col(timestamp(Expenses::CreatedAt))
                        .col(timestamp(Expenses::UpdatedAt))
                        .to_owned(),
                )
                .await?;
            index(
                manager,
                "idx_expenses_expense_date",
                Expenses::Table,
                Expenses::ExpenseDate,
                false,
            )
            .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                Expenses::Table.into_iden(),
                Payments::Table.into_iden(),
                Invoices::Table.into_iden(),
                DocumentSequences::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum DocumentSequences {
        Table,
        Prefix,
        Year,
        LastValue,
    }

    #[derive(DeriveIden)]
    enum Invoices {
        Table,
        Id,
        InvoiceNumber,
        WorkOrderId,
        CustomerId,
        Subtotal,
        TaxAmount,
        DiscountAmount,
        TotalAmount,
        AmountPaid,
        BalanceDue,
        Status,
        IssueDate,
        DueDate,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Payments {
        Table,
        Id,
        InvoiceId,
        Amount,
        PaymentMethod,
        PaymentDate,
        Reference,
        Notes,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Expenses {
        Table,
        Id,
        Category,
        Description,
        Amount,
        ExpenseDate,
        Vendor,
        Reference,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260101_000004_create_inventory {
    use super::m20260101_000001_create_master_data::{Parts, Suppliers};
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000004_create_inventory"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockAdjustments::Table)
                        .if_not_exists()
                        .col(uuid_pk(StockAdjustments::Id))
                        .col(ColumnDef::new(StockAdjustments::PartId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockAdjustments::AdjustmentType)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAdjustments::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(StockAdjustments::PreviousQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustments::NewQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAdjustments::Reason).text().not_null())
                        .col(
                            ColumnDef::new(StockAdjustments::ReferenceType)
                                .string_len(32)
                                .null(),
                        )
                        .col(ColumnDef::new(StockAdjustments::ReferenceId).uuid().null())
                        .col(ColumnDef::new(StockAdjustments::CreatedBy).uuid().null())
                        .col(timestamp(StockAdjustments::CreatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_adjustments_part_id")
                                .from(StockAdjustments::Table, StockAdjustments::PartId)
                                .to(Parts::Table, Parts::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;
            index(
                manager,
                "idx_stock_adjustments_part_id",
                StockAdjustments::Table,
                StockAdjustments::PartId,
                false,
            )
            .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(uuid_pk(PurchaseOrders::Id))
                        .col(
                            ColumnDef::new(PurchaseOrders::PoNumber)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrders::Status).string_len(32).not_null())
                        .col(ColumnDef::new(PurchaseOrders::OrderDate).date().null())
                        .col(ColumnDef::new(PurchaseOrders::ExpectedDate).date().null())
                        .col(ColumnDef::new(PurchaseOrders::ReceivedDate).date().null())
                        .col(ColumnDef::new(PurchaseOrders::Notes).text().null())
                        .col(money(PurchaseOrders::TotalAmount))
                        .col(timestamp(PurchaseOrders::CreatedAt))
                        .col(timestamp(PurchaseOrders::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_orders_supplier_id")
                                .from(PurchaseOrders::Table, PurchaseOrders::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;
            index(
                manager,
                "idx_purchase_orders_po_number",
                PurchaseOrders::Table,
                PurchaseOrders::PoNumber,
                true,
            )
            .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderItems::Table)
                        .if_not_exists()
                        .col(uuid_pk(PurchaseOrderItems::Id))
                        .col(
                            ColumnDef::new(PurchaseOrderItems::PurchaseOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderItems::PartId).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrderItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(money(PurchaseOrderItems::UnitCost))
                        .col(money(PurchaseOrderItems::TotalCost))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_order_items_po_id")
                                .from(PurchaseOrderItems::Table, PurchaseOrderItems::PurchaseOrderId)
                                .to(PurchaseOrders::Table, PurchaseOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_order_items_part_id")
                                .from(PurchaseOrderItems::Table, PurchaseOrderItems::PartId)
                                .to(Parts::Table, Parts::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                PurchaseOrderItems::Table.into_iden(),
                PurchaseOrders::Table.into_iden(),
                StockAdjustments::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum StockAdjustments {
        Table,
        Id,
        PartId,
        AdjustmentType,
        Quantity,
        PreviousQuantity,
        NewQuantity,
        Reason,
        ReferenceType,
        ReferenceId,
        CreatedBy,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum PurchaseOrders {
        Table,
        Id,
        PoNumber,
        SupplierId,
        Status,
        OrderDate,
        ExpectedDate,
        ReceivedDate,
        Notes,
        TotalAmount,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum PurchaseOrderItems {
        Table,
        Id,
        PurchaseOrderId,
        PartId,
        Quantity,
        UnitCost,
        TotalCost,
    }
}
