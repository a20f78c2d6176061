//! Gap-free yearly document numbers (`INV-2026-00001`).
//!
//! Each `(prefix, year)` pair owns one counter row. The counter is advanced
//! with a single `UPDATE ... SET last_value = last_value + 1`, which takes the
//! row lock for the rest of the caller's transaction, so concurrent writers
//! queue behind each other instead of reading the same "last" value. The first
//! number of a year inserts the row and retries the update.

use crate::{
    errors::ServiceError,
    models::document_sequence::{self, Entity as DocumentSequence},
};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use tracing::{debug, instrument};

pub const INVOICE_PREFIX: &str = "INV";
pub const WORK_ORDER_PREFIX: &str = "WO";
pub const PURCHASE_ORDER_PREFIX: &str = "PO";

const MAX_ATTEMPTS: usize = 3;

pub fn format_number(prefix: &str, year: i32, value: i64) -> String {
    format!("{}-{}-{:05}", prefix, year, value)
}

/// Allocates the next number for `prefix` in `year`.
///
/// Must be called with the transaction that persists the numbered document,
/// so a rollback also releases the number.
#[instrument(skip(conn))]
pub async fn next_number<C>(conn: &C, prefix: &str, year: i32) -> Result<String, ServiceError>
where
    C: ConnectionTrait,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let updated = DocumentSequence::update_many()
            .col_expr(
                document_sequence::Column::LastValue,
                Expr::col(document_sequence::Column::LastValue).add(1),
            )
            .filter(document_sequence::Column::Prefix.eq(prefix))
            .filter(document_sequence::Column::Year.eq(year))
            .exec(conn)
            .await?;

        if updated.rows_affected == 1 {
            let row = DocumentSequence::find_by_id((prefix.to_string(), year))
                .one(conn)
                .await?
                .ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "Sequence row {}/{} vanished after update",
                        prefix, year
                    ))
                })?;
            let number = format_number(prefix, year, row.last_value);
            debug!(%number, attempt, "allocated document number");
            return Ok(number);
        }

        // First use this year. A concurrent insert of the same row is fine:
        // the conflict is ignored and the update above is retried.
        DocumentSequence::insert(document_sequence::ActiveModel {
            prefix: Set(prefix.to_string()),
            year: Set(year),
            last_value: Set(0),
        })
        .on_conflict(
            OnConflict::columns([
                document_sequence::Column::Prefix,
                document_sequence::Column::Year,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    }

    Err(ServiceError::InternalError(format!(
        "Could not allocate a {} number for {}",
        prefix, year
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(INVOICE_PREFIX, 2026, 1, "INV-2026-00001")]
    #[case(WORK_ORDER_PREFIX, 2027, 42, "WO-2027-00042")]
    #[case(PURCHASE_ORDER_PREFIX, 2026, 123456, "PO-2026-123456")]
    fn formats_zero_padded(
        #[case] prefix: &str,
        #[case] year: i32,
        #[case] value: i64,
        #[case] expected: &str,
    ) {
        assert_eq!(format_number(prefix, year, value), expected);
    }
}
