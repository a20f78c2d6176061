//! Business logic, one service per workshop area.
//!
//! Services own their database access and publish [`crate::events::Event`]s
//! after a successful commit. Every multi-row write runs inside a single
//! transaction; once a transaction is open, all reads go through it.

pub mod appointments;
pub mod catalog;
pub mod customers;
pub mod employees;
pub mod expenses;
pub mod inventory;
pub mod invoicing;
pub mod payments;
pub mod procurement;
pub mod reports;
pub mod sequences;
pub mod work_orders;

use crate::errors::ServiceError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, Select};
use serde::Serialize;
use utoipa::ToSchema;
use validator::ValidationError;

/// Page selection for list operations; `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Serialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            (self.total + self.per_page - 1) / self.per_page
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

pub(crate) async fn fetch_page<E, C>(
    select: Select<E>,
    conn: &C,
    request: PageRequest,
) -> Result<Page<E::Model>, ServiceError>
where
    E: EntityTrait,
    E::Model: Send + Sync,
    C: ConnectionTrait,
{
    let paginator = select.paginate(conn, request.per_page);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(request.page.saturating_sub(1)).await?;
    Ok(Page {
        items,
        total,
        page: request.page,
        per_page: request.per_page,
    })
}

/// Currency amounts are kept at two decimal places.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// Trims a free-text search term, treating blank input as absent.
pub(crate) fn search_term(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Largest value a `DECIMAL(12, 2)` money column holds.
pub const MAX_MONEY: Decimal = dec!(9999999999.99);

fn too_large() -> ValidationError {
    let mut err = ValidationError::new("too_large");
    err.message = Some("must not exceed 9999999999.99".into());
    err
}

pub fn validate_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    if *value > MAX_MONEY {
        return Err(too_large());
    }
    Ok(())
}

pub fn validate_positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut err = ValidationError::new("positive");
        err.message = Some("must be greater than zero".into());
        return Err(err);
    }
    if *value > MAX_MONEY {
        return Err(too_large());
    }
    Ok(())
}

/// Rounds the result of checked money arithmetic, rejecting overflow and
/// anything a money column cannot store.
pub fn checked_money(field: &str, amount: Option<Decimal>) -> Result<Decimal, ServiceError> {
    match amount.map(round_money) {
        Some(value) if value.abs() <= MAX_MONEY => Ok(value),
        _ => Err(ServiceError::invalid_field(
            field,
            "Amount exceeds the largest supported value",
        )),
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::<u8> {
            items: vec![],
            total: 41,
            page: 1,
            per_page: 20,
        };
        assert_eq!(page.total_pages(), 3);
    }

    #[test]
    fn page_request_clamps_to_one() {
        assert_eq!(PageRequest::new(0, 0), PageRequest { page: 1, per_page: 1 });
    }

    #[test]
    fn money_rounds_half_even_to_cents() {
        assert_eq!(round_money(dec!(10.005)), dec!(10.00));
        assert_eq!(round_money(dec!(10.015)), dec!(10.02));
    }

    #[test]
    fn decimal_validators() {
        assert!(validate_amount(&dec!(0)).is_ok());
        assert!(validate_amount(&dec!(-0.01)).is_err());
        assert!(validate_amount(&MAX_MONEY).is_ok());
        assert!(validate_amount(&Decimal::MAX).is_err());
        assert!(validate_positive_amount(&dec!(0)).is_err());
        assert!(validate_positive_amount(&dec!(0.01)).is_ok());
        assert!(validate_positive_amount(&(MAX_MONEY + dec!(0.01))).is_err());
        assert!(validate_not_blank("  ").is_err());
    }

    #[test]
    fn checked_money_rejects_overflow_and_oversized_results() {
        assert_eq!(checked_money("total", Some(dec!(12.345))).unwrap(), dec!(12.34));
        assert!(checked_money("total", Decimal::MAX.checked_mul(dec!(2))).is_err());
        assert!(checked_money("total", Some(MAX_MONEY + dec!(1))).is_err());
    }
}
