//! Read-only aggregation for the reporting endpoints.
//!
//! Rows are fetched with plain filters and summed in Rust so that money
//! stays in `Decimal` end to end. Date ranges are inclusive on both ends; an
//! inverted range yields an empty result rather than an error.

use crate::{
    clock::Clock,
    db::DbPool,
    errors::ServiceError,
    models::{
        appointment::{self, Entity as Appointment},
        employee::{self, Entity as Employee},
        expense::{self, Entity as Expense},
        invoice::{self, Entity as Invoice},
        part::{self, Entity as Part},
        payment::{self, Entity as Payment},
        service::{self, Entity as Service},
        work_order::{self, Entity as WorkOrder},
        work_order_service::{self, Entity as ServiceLine},
        AppointmentStatus, InvoiceStatus, WorkOrderStatus,
    },
    services::round_money,
};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub const DEFAULT_TOP_SERVICES: usize = 10;

/// Inclusive calendar-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    fn start_instant(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// First instant after the range; `None` when the range runs to the last
    /// representable date.
    fn end_exclusive(&self) -> Option<DateTime<Utc>> {
        self.end
            .checked_add_days(Days::new(1))
            .map(|day| day.and_time(NaiveTime::MIN).and_utc())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    #[default]
    Day,
    Month,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RevenuePoint {
    /// `YYYY-MM-DD` or `YYYY-MM`
    pub period: String,
    pub revenue: Decimal,
    pub payment_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProfitPoint {
    /// `YYYY-MM`
    pub period: String,
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MechanicProductivity {
    pub mechanic_id: Uuid,
    pub mechanic_name: String,
    pub completed_orders: u64,
    pub hours: Decimal,
    pub revenue: Decimal,
    pub average_revenue: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ServiceUsage {
    pub service_id: Uuid,
    pub service_name: String,
    pub usage_count: u64,
    pub quantity: i64,
    pub revenue: Decimal,
    pub average_revenue: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardSummary {
    pub open_work_orders: u64,
    pub todays_appointments: u64,
    pub unpaid_invoices: u64,
    pub outstanding_balance: Decimal,
    pub low_stock_parts: u64,
    pub revenue_this_month: Decimal,
}

/// Grouping key for a date at the given granularity.
pub fn period_key(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Day => date.format("%Y-%m-%d").to_string(),
        Granularity::Month => date.format("%Y-%m").to_string(),
    }
}

/// `total / count`, or `None` when there is nothing to average.
pub fn average(total: Decimal, count: u64) -> Option<Decimal> {
    if count == 0 {
        None
    } else {
        Some(round_money(total / Decimal::from(count)))
    }
}

pub fn group_revenue(
    payments: &[(NaiveDate, Decimal)],
    granularity: Granularity,
) -> Vec<RevenuePoint> {
    let mut buckets: BTreeMap<String, (Decimal, u64)> = BTreeMap::new();
    for (date, amount) in payments {
        let entry = buckets
            .entry(period_key(*date, granularity))
            .or_insert((Decimal::ZERO, 0));
        entry.0 += *amount;
        entry.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(period, (revenue, payment_count))| RevenuePoint {
            period,
            revenue: round_money(revenue),
            payment_count,
        })
        .collect()
}

/// Monthly revenue against expenses; a month appears if either side has rows.
pub fn merge_revenue_and_expenses(
    payments: &[(NaiveDate, Decimal)],
    expenses: &[(NaiveDate, Decimal)],
) -> Vec<ProfitPoint> {
    let mut months: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for (date, amount) in payments {
        months
            .entry(period_key(*date, Granularity::Month))
            .or_default()
            .0 += *amount;
    }
    for (date, amount) in expenses {
        months
            .entry(period_key(*date, Granularity::Month))
            .or_default()
            .1 += *amount;
    }
    months
        .into_iter()
        .map(|(period, (revenue, spent))| {
            let revenue = round_money(revenue);
            let expenses = round_money(spent);
            ProfitPoint {
                period,
                revenue,
                expenses,
                profit: revenue - expenses,
            }
        })
        .collect()
}

/// A completed work order as seen by the productivity report.
#[derive(Debug, Clone, Copy)]
pub struct CompletedJob {
    pub mechanic_id: Uuid,
    pub hours: Decimal,
    pub revenue: Decimal,
}

/// Per-mechanic totals, highest revenue first. Names are filled in by the caller.
pub fn aggregate_mechanics(jobs: &[CompletedJob]) -> Vec<MechanicProductivity> {
    let mut by_mechanic: HashMap<Uuid, (u64, Decimal, Decimal)> = HashMap::new();
    for job in jobs {
        let entry = by_mechanic
            .entry(job.mechanic_id)
            .or_insert((0, Decimal::ZERO, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += job.hours;
        entry.2 += job.revenue;
    }
    let mut rows: Vec<_> = by_mechanic
        .into_iter()
        .map(|(mechanic_id, (count, hours, revenue))| MechanicProductivity {
            mechanic_id,
            mechanic_name: String::new(),
            completed_orders: count,
            hours: hours.round_dp(2),
            revenue: round_money(revenue),
            average_revenue: average(revenue, count),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.mechanic_id.cmp(&b.mechanic_id))
    });
    rows
}

/// A service line from a completed work order.
#[derive(Debug, Clone, Copy)]
pub struct ServiceLineUse {
    pub service_id: Uuid,
    pub quantity: i32,
    pub revenue: Decimal,
}

/// Per-service usage, highest revenue first, cut to `limit`.
pub fn aggregate_services(lines: &[ServiceLineUse], limit: usize) -> Vec<ServiceUsage> {
    let mut by_service: HashMap<Uuid, (u64, i64, Decimal)> = HashMap::new();
    for line in lines {
        let entry = by_service
            .entry(line.service_id)
            .or_insert((0, 0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += i64::from(line.quantity);
        entry.2 += line.revenue;
    }
    let mut rows: Vec<_> = by_service
        .into_iter()
        .map(|(service_id, (count, quantity, revenue))| ServiceUsage {
            service_id,
            service_name: String::new(),
            usage_count: count,
            quantity,
            revenue: round_money(revenue),
            average_revenue: average(revenue, count),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| b.usage_count.cmp(&a.usage_count))
            .then_with(|| a.service_id.cmp(&b.service_id))
    });
    rows.truncate(limit);
    rows
}

pub struct ReportService {
    db: Arc<DbPool>,
    clock: Arc<dyn Clock>,
}

impl ReportService {
    pub fn new(db: Arc<DbPool>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    async fn payments_in(&self, range: DateRange) -> Result<Vec<(NaiveDate, Decimal)>, ServiceError> {
        Ok(Payment::find()
            .filter(payment::Column::PaymentDate.gte(range.start))
            .filter(payment::Column::PaymentDate.lte(range.end))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.payment_date, p.amount))
            .collect())
    }

    async fn completed_orders_in(
        &self,
        range: DateRange,
    ) -> Result<Vec<work_order::Model>, ServiceError> {
        Ok(WorkOrder::find()
            .filter(work_order::Column::Status.eq(WorkOrderStatus::Completed))
            .filter(work_order::Column::CompletionDate.gte(range.start_instant()))
            .apply_if(range.end_exclusive(), |query, end| {
                query.filter(work_order::Column::CompletionDate.lt(end))
            })
            .all(&*self.db)
            .await?)
    }

    /// Cash-basis revenue: payments received per day or month.
    #[instrument(skip(self))]
    pub async fn revenue(
        &self,
        range: DateRange,
        granularity: Granularity,
    ) -> Result<Vec<RevenuePoint>, ServiceError> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let payments = self.payments_in(range).await?;
        Ok(group_revenue(&payments, granularity))
    }

    #[instrument(skip(self))]
    pub async fn revenue_vs_expenses(
        &self,
        range: DateRange,
    ) -> Result<Vec<ProfitPoint>, ServiceError> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let payments = self.payments_in(range).await?;
        let expenses: Vec<_> = Expense::find()
            .filter(expense::Column::ExpenseDate.gte(range.start))
            .filter(expense::Column::ExpenseDate.lte(range.end))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|e| (e.expense_date, e.amount))
            .collect();
        Ok(merge_revenue_and_expenses(&payments, &expenses))
    }

    /// Work orders completed in the range, grouped by assigned mechanic.
    #[instrument(skip(self))]
    pub async fn mechanic_productivity(
        &self,
        range: DateRange,
    ) -> Result<Vec<MechanicProductivity>, ServiceError> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let jobs: Vec<_> = self
            .completed_orders_in(range)
            .await?
            .into_iter()
            .filter_map(|wo| {
                wo.assigned_mechanic_id.map(|mechanic_id| CompletedJob {
                    mechanic_id,
                    hours: wo.actual_hours.unwrap_or_default(),
                    revenue: wo.total_cost,
                })
            })
            .collect();
        let mut rows = aggregate_mechanics(&jobs);
        if rows.is_empty() {
            return Ok(rows);
        }

        let names: HashMap<Uuid, String> = Employee::find()
            .filter(
                employee::Column::Id
                    .is_in(rows.iter().map(|r| r.mechanic_id).collect::<Vec<_>>()),
            )
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|e| (e.id, e.full_name()))
            .collect();
        for row in &mut rows {
            if let Some(name) = names.get(&row.mechanic_id) {
                row.mechanic_name = name.clone();
            }
        }
        Ok(rows)
    }

    /// Most lucrative services across work orders completed in the range.
    #[instrument(skip(self))]
    pub async fn top_services(
        &self,
        range: DateRange,
        limit: usize,
    ) -> Result<Vec<ServiceUsage>, ServiceError> {
        if range.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let order_ids: Vec<Uuid> = self
            .completed_orders_in(range)
            .await?
            .into_iter()
            .map(|wo| wo.id)
            .collect();
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let lines: Vec<_> = ServiceLine::find()
            .filter(work_order_service::Column::WorkOrderId.is_in(order_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|line| ServiceLineUse {
                service_id: line.service_id,
                quantity: line.quantity,
                revenue: line.total_price,
            })
            .collect();
        let mut rows = aggregate_services(&lines, limit);
        if rows.is_empty() {
            return Ok(rows);
        }

        let names: HashMap<Uuid, String> = Service::find()
            .filter(
                service::Column::Id
                    .is_in(rows.iter().map(|r| r.service_id).collect::<Vec<_>>()),
            )
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();
        for row in &mut rows {
            if let Some(name) = names.get(&row.service_id) {
                row.service_name = name.clone();
            }
        }
        Ok(rows)
    }

    /// Headline numbers for the dashboard, as of the clock's current time.
    #[instrument(skip(self))]
    pub async fn dashboard_summary(&self) -> Result<DashboardSummary, ServiceError> {
        let now = self.clock.now();
        let today = now.date_naive();
        let db = &*self.db;

        let open_work_orders = WorkOrder::find()
            .filter(
                work_order::Column::Status
                    .is_in([WorkOrderStatus::Pending, WorkOrderStatus::InProgress]),
            )
            .count(db)
            .await?;

        let today_range = DateRange::new(today, today);
        let todays_appointments = Appointment::find()
            .filter(appointment::Column::ScheduledStart.gte(today_range.start_instant()))
            .apply_if(today_range.end_exclusive(), |query, end| {
                query.filter(appointment::Column::ScheduledStart.lt(end))
            })
            .filter(
                appointment::Column::Status
                    .is_not_in([AppointmentStatus::Cancelled, AppointmentStatus::NoShow]),
            )
            .count(db)
            .await?;

        let open_invoices = Invoice::find()
            .filter(invoice::Column::Status.ne(InvoiceStatus::Paid))
            .all(db)
            .await?;
        let outstanding_balance = round_money(open_invoices.iter().map(|i| i.balance_due).sum());

        let low_stock_parts = Part::find()
            .filter(part::Column::IsActive.eq(true))
            .filter(
                Expr::col(part::Column::QuantityInStock).lte(Expr::col(part::Column::ReorderLevel)),
            )
            .count(db)
            .await?;

        let month_start = today.with_day(1).unwrap_or(today);
        let revenue_this_month = round_money(
            self.payments_in(DateRange::new(month_start, today))
                .await?
                .iter()
                .map(|(_, amount)| *amount)
                .sum(),
        );

        Ok(DashboardSummary {
            open_work_orders,
            todays_appointments,
            unpaid_invoices: open_invoices.len() as u64,
            outstanding_balance,
            low_stock_parts,
            revenue_this_month,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_end_is_unbounded_at_the_last_date() {
        let range = DateRange::new(date(2026, 3, 1), date(2026, 3, 31));
        assert_eq!(
            range.end_exclusive(),
            Some(date(2026, 4, 1).and_time(NaiveTime::MIN).and_utc())
        );

        let open = DateRange::new(date(2026, 3, 1), NaiveDate::MAX);
        assert_eq!(open.end_exclusive(), None);
        assert!(open.contains(NaiveDate::MAX));
        assert_eq!(
            DateRange::new(NaiveDate::MIN, NaiveDate::MIN).start_instant(),
            NaiveDate::MIN.and_time(NaiveTime::MIN).and_utc()
        );
    }

    #[test]
    fn revenue_groups_by_day_and_month() {
        let payments = vec![
            (date(2026, 3, 1), dec!(50)),
            (date(2026, 3, 1), dec!(55)),
            (date(2026, 3, 20), dec!(10)),
            (date(2026, 4, 2), dec!(7.5)),
        ];

        let daily = group_revenue(&payments, Granularity::Day);
        assert_eq!(daily.len(), 3);
        assert_eq!(daily[0].period, "2026-03-01");
        assert_eq!(daily[0].revenue, dec!(105));
        assert_eq!(daily[0].payment_count, 2);

        let monthly = group_revenue(&payments, Granularity::Month);
        assert_eq!(
            monthly
                .iter()
                .map(|p| (p.period.as_str(), p.revenue))
                .collect::<Vec<_>>(),
            vec![("2026-03", dec!(115)), ("2026-04", dec!(7.5))]
        );
    }

    #[test]
    fn profit_includes_months_with_only_expenses() {
        let rows = merge_revenue_and_expenses(
            &[(date(2026, 1, 10), dec!(300))],
            &[(date(2026, 1, 3), dec!(120)), (date(2026, 2, 1), dec!(80))],
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].profit, dec!(180));
        assert_eq!(rows[1].revenue, dec!(0));
        assert_eq!(rows[1].profit, dec!(-80));
    }

    #[test]
    fn average_never_divides_by_zero() {
        assert_eq!(average(dec!(100), 0), None);
        assert_eq!(average(dec!(100), 3), Some(dec!(33.33)));
    }

    #[test]
    fn mechanics_sorted_by_revenue() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let rows = aggregate_mechanics(&[
            CompletedJob { mechanic_id: a, hours: dec!(2), revenue: dec!(100) },
            CompletedJob { mechanic_id: b, hours: dec!(1.5), revenue: dec!(400) },
            CompletedJob { mechanic_id: a, hours: dec!(3), revenue: dec!(200) },
        ]);
        assert_eq!(rows[0].mechanic_id, b);
        assert_eq!(rows[1].completed_orders, 2);
        assert_eq!(rows[1].hours, dec!(5));
        assert_eq!(rows[1].average_revenue, Some(dec!(150)));
    }

    #[test]
    fn top_services_respects_limit() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let lines = vec![
            ServiceLineUse { service_id: ids[0], quantity: 1, revenue: dec!(50) },
            ServiceLineUse { service_id: ids[1], quantity: 2, revenue: dec!(300) },
            ServiceLineUse { service_id: ids[2], quantity: 1, revenue: dec!(80) },
            ServiceLineUse { service_id: ids[0], quantity: 3, revenue: dec!(150) },
        ];
        let rows = aggregate_services(&lines, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].service_id, ids[1]);
        assert_eq!(rows[1].service_id, ids[0]);
        assert_eq!(rows[1].quantity, 4);
        assert_eq!(rows[1].average_revenue, Some(dec!(100)));
    }

    #[test]
    fn inverted_range_is_empty() {
        let range = DateRange::new(date(2026, 5, 2), date(2026, 5, 1));
        assert!(range.is_empty());
        assert!(!range.contains(date(2026, 5, 1)));
    }
}
