use crate::{
    clock::Clock,
    db::DbPool,
    errors::ServiceError,
    models::{
        expense::{self, Entity as Expense},
        ExpenseCategory,
    },
    services::{
        fetch_page, round_money, search_term, trimmed, validate_not_blank, validate_positive_amount, Page,
        PageRequest,
    },
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateExpenseRequest {
    pub category: ExpenseCategory,
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub description: String,
    #[validate(custom = "validate_positive_amount")]
    pub amount: Decimal,
    /// Defaults to today
    pub expense_date: Option<NaiveDate>,
    pub vendor: Option<String>,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateExpenseRequest {
    pub category: Option<ExpenseCategory>,
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub description: Option<String>,
    #[validate(custom = "validate_positive_amount")]
    pub amount: Option<Decimal>,
    pub expense_date: Option<NaiveDate>,
    pub vendor: Option<String>,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExpenseFilter {
    pub category: Option<ExpenseCategory>,
    /// Inclusive lower bound on `expense_date`
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on `expense_date`
    pub to: Option<NaiveDate>,
    /// Matches description or vendor
    pub search: Option<String>,
}

pub struct ExpenseService {
    db: Arc<DbPool>,
    clock: Arc<dyn Clock>,
}

impl ExpenseService {
    pub fn new(db: Arc<DbPool>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    #[instrument(skip(self, request), fields(category = %request.category, amount = %request.amount))]
    pub async fn create_expense(
        &self,
        request: CreateExpenseRequest,
    ) -> Result<expense::Model, ServiceError> {
        request.validate()?;
        let now = self.clock.now();

        let created = expense::ActiveModel {
            id: Set(Uuid::new_v4()),
            category: Set(request.category),
            description: Set(request.description.trim().to_string()),
            amount: Set(round_money(request.amount)),
            expense_date: Set(request.expense_date.unwrap_or_else(|| now.date_naive())),
            vendor: Set(trimmed(request.vendor)),
            reference: Set(trimmed(request.reference)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(expense_id = %created.id, "expense recorded");
        Ok(created)
    }

    pub async fn get_expense(&self, id: Uuid) -> Result<expense::Model, ServiceError> {
        Expense::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Expense", id))
    }

    pub async fn list_expenses(
        &self,
        filter: ExpenseFilter,
        page: PageRequest,
    ) -> Result<Page<expense::Model>, ServiceError> {
        let mut query = Expense::find();
        if let Some(category) = filter.category {
            query = query.filter(expense::Column::Category.eq(category));
        }
        if let Some(from) = filter.from {
            query = query.filter(expense::Column::ExpenseDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(expense::Column::ExpenseDate.lte(to));
        }
        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(
                Condition::any()
                    .add(expense::Column::Description.contains(&term))
                    .add(expense::Column::Vendor.contains(&term)),
            );
        }
        fetch_page(
            query
                .order_by_desc(expense::Column::ExpenseDate)
                .order_by_desc(expense::Column::CreatedAt),
            &*self.db,
            page,
        )
        .await
    }

    #[instrument(skip(self, request))]
    pub async fn update_expense(
        &self,
        id: Uuid,
        request: UpdateExpenseRequest,
    ) -> Result<expense::Model, ServiceError> {
        request.validate()?;
        let mut active: expense::ActiveModel = self.get_expense(id).await?.into();

        if let Some(category) = request.category {
            active.category = Set(category);
        }
        if let Some(description) = request.description {
            active.description = Set(description.trim().to_string());
        }
        if let Some(amount) = request.amount {
            active.amount = Set(round_money(amount));
        }
        if let Some(date) = request.expense_date {
            active.expense_date = Set(date);
        }
        if request.vendor.is_some() {
            active.vendor = Set(trimmed(request.vendor));
        }
        if request.reference.is_some() {
            active.reference = Set(trimmed(request.reference));
        }
        active.updated_at = Set(self.clock.now());

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_expense(&self, id: Uuid) -> Result<(), ServiceError> {
        let expense = self.get_expense(id).await?;
        expense.delete(&*self.db).await?;
        info!(expense_id = %id, "expense deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_amount_and_blank_description_are_rejected() {
        let request = CreateExpenseRequest {
            category: ExpenseCategory::Supplies,
            description: "   ".into(),
            amount: dec!(0),
            expense_date: None,
            vendor: None,
            reference: None,
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("amount"));
        assert!(fields.contains_key("description"));
    }
}
