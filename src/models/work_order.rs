use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl WorkOrderStatus {
    /// Lines may only change while the job is still open.
    pub fn allows_line_changes(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[default]
    #[serde(alias = "MEDIUM")]
    #[sea_orm(string_value = "normal")]
    Normal,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "urgent")]
    Urgent,
}

/// The `work_orders` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "work_orders")]
#[schema(as = WorkOrder)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// `WO-YYYY-NNNNN`
    #[sea_orm(unique)]
    pub work_order_number: String,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub assigned_mechanic_id: Option<Uuid>,
    pub appointment_id: Option<Uuid>,
    pub status: WorkOrderStatus,
    pub priority: WorkOrderPriority,
    pub description: Option<String>,
    pub diagnosis: Option<String>,
    pub mileage_in: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((8, 2)))", nullable)]
    pub actual_hours: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub completion_date: Option<DateTime<Utc>>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_labor_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_parts_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::work_order_service::Entity")]
    ServiceLines,
    #[sea_orm(has_many = "super::work_order_part::Entity")]
    PartLines,
}

impl Related<super::work_order_service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceLines.def()
    }
}

impl Related<super::work_order_part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PartLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
