//! Property-based tests for the pure money, stock and status rules.

use proptest::prelude::*;
use rust_decimal::Decimal;
use workshop_api::{
    lifecycle::{apply_transition, LifecycleStatus, Transition},
    models::{
        AdjustmentType, AppointmentStatus, InvoiceStatus, PurchaseOrderStatus, WorkOrderStatus,
    },
    services::{
        inventory::apply_adjustment,
        invoicing::{compute_totals, derive_status, resolve_tax},
        sequences::format_number,
        work_orders::{line_total, sum_totals},
    },
};

fn cents() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|c| Decimal::new(c, 2))
}

fn work_order_status() -> impl Strategy<Value = WorkOrderStatus> {
    prop_oneof![
        Just(WorkOrderStatus::Pending),
        Just(WorkOrderStatus::InProgress),
        Just(WorkOrderStatus::Completed),
        Just(WorkOrderStatus::Cancelled),
    ]
}

fn appointment_status() -> impl Strategy<Value = AppointmentStatus> {
    prop_oneof![
        Just(AppointmentStatus::Scheduled),
        Just(AppointmentStatus::Confirmed),
        Just(AppointmentStatus::InProgress),
        Just(AppointmentStatus::Completed),
        Just(AppointmentStatus::Cancelled),
        Just(AppointmentStatus::NoShow),
    ]
}

fn purchase_order_status() -> impl Strategy<Value = PurchaseOrderStatus> {
    prop_oneof![
        Just(PurchaseOrderStatus::Draft),
        Just(PurchaseOrderStatus::Ordered),
        Just(PurchaseOrderStatus::Received),
        Just(PurchaseOrderStatus::Cancelled),
    ]
}

fn check_lifecycle<S: LifecycleStatus + std::fmt::Debug>(
    from: S,
    to: S,
) -> Result<(), TestCaseError> {
    match apply_transition(from, to) {
        Ok(Transition::Unchanged(s)) => prop_assert_eq!(s, from),
        Ok(Transition::Changed { to: target, .. }) => {
            prop_assert!(!from.is_terminal());
            prop_assert!(from.allowed_targets().contains(&target));
        }
        Err(_) => {
            prop_assert_ne!(from, to);
            prop_assert!(!from.allowed_targets().contains(&to));
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn invoice_total_is_gross_minus_discount(
        subtotal in cents(),
        tax in cents(),
        discount in cents(),
    ) {
        match compute_totals(subtotal, tax, discount) {
            Ok(total) => {
                prop_assert!(discount <= subtotal + tax);
                prop_assert_eq!(total, subtotal + tax - discount);
                prop_assert!(total >= Decimal::ZERO);
            }
            Err(_) => prop_assert!(discount > subtotal + tax),
        }
    }

    #[test]
    fn settled_invoices_are_always_paid(
        total in cents(),
        extra in cents(),
        due_offset in -60i64..60,
    ) {
        let today = chrono::NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let due = today + chrono::Duration::days(due_offset);
        prop_assert_eq!(
            derive_status(total, total + extra, Some(due), today),
            InvoiceStatus::Paid
        );
    }

    #[test]
    fn open_balance_status_depends_on_due_date_and_payments(
        total in 1i64..10_000_000,
        paid_share in 0i64..100,
        due_offset in -60i64..60,
    ) {
        let total = Decimal::new(total, 2);
        let paid = (total * Decimal::new(paid_share, 2)).round_dp(2);
        prop_assume!(paid < total);
        let today = chrono::NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let due = today + chrono::Duration::days(due_offset);

        let status = derive_status(total, paid, Some(due), today);
        if due < today {
            prop_assert_eq!(status, InvoiceStatus::Overdue);
        } else if paid > Decimal::ZERO {
            prop_assert_eq!(status, InvoiceStatus::PartiallyPaid);
        } else {
            prop_assert_eq!(status, InvoiceStatus::Unpaid);
        }
    }

    #[test]
    fn explicit_tax_and_rate_are_mutually_exclusive(
        subtotal in cents(),
        amount in cents(),
        rate in 0i64..=100,
    ) {
        let rate = Decimal::new(rate, 2);
        prop_assert!(resolve_tax(subtotal, Some(amount), Some(rate), Decimal::ZERO).is_err());
        prop_assert_eq!(
            resolve_tax(subtotal, Some(amount), None, rate).unwrap(),
            amount
        );
        let from_rate = resolve_tax(subtotal, None, Some(rate), Decimal::ZERO).unwrap();
        prop_assert_eq!(from_rate, (subtotal * rate).round_dp(2));
        prop_assert!(from_rate <= subtotal);
    }

    #[test]
    fn stock_never_goes_negative(
        current in 0i32..10_000,
        quantity in -10i32..20_000,
        kind in prop_oneof![
            Just(AdjustmentType::Add),
            Just(AdjustmentType::Remove),
            Just(AdjustmentType::Set),
        ],
    ) {
        match apply_adjustment(current, kind, quantity) {
            Ok(level) => {
                prop_assert!(level >= 0);
                let expected = match kind {
                    AdjustmentType::Add => current + quantity,
                    AdjustmentType::Remove => current - quantity,
                    AdjustmentType::Set => quantity,
                };
                prop_assert_eq!(level, expected);
            }
            Err(_) => prop_assert!(
                quantity < 0
                    || (quantity == 0 && kind != AdjustmentType::Set)
                    || (kind == AdjustmentType::Remove && quantity > current)
            ),
        }
    }

    #[test]
    fn work_order_total_is_labor_plus_parts(
        services in prop::collection::vec((cents(), 1i32..10), 0..8),
        parts in prop::collection::vec((cents(), 1i32..50), 0..8),
    ) {
        let labor: Vec<_> = services.iter().map(|(p, q)| line_total(*p, *q).unwrap()).collect();
        let part: Vec<_> = parts.iter().map(|(p, q)| line_total(*p, *q).unwrap()).collect();
        let totals = sum_totals(labor.clone(), part.clone()).unwrap();

        prop_assert_eq!(totals.labor, labor.iter().copied().sum::<Decimal>());
        prop_assert_eq!(totals.parts, part.iter().copied().sum::<Decimal>());
        prop_assert_eq!(totals.total, totals.labor + totals.parts);
    }

    #[test]
    fn line_arithmetic_never_panics(
        mantissa in any::<i64>(),
        scale in 0u32..=10,
        quantity in any::<i32>(),
    ) {
        let price = Decimal::new(mantissa, scale);
        if let Ok(total) = line_total(price, quantity) {
            prop_assert!(total.abs() <= workshop_api::services::MAX_MONEY);
        }
        let _ = compute_totals(price.abs(), Decimal::MAX, Decimal::ZERO);
    }

    #[test]
    fn document_numbers_sort_in_allocation_order(
        prefix in prop_oneof![Just("WO"), Just("INV"), Just("PO")],
        year in 2000i32..2100,
        a in 1i64..99_999,
        b in 1i64..99_999,
    ) {
        let first = format_number(prefix, year, a);
        let second = format_number(prefix, year, b);
        let expected_prefix = format!("{}-{}-", prefix, year);
        prop_assert!(first.starts_with(&expected_prefix));
        prop_assert_eq!(first.len(), prefix.len() + 11);
        prop_assert_eq!(a.cmp(&b), first.cmp(&second));
    }

    #[test]
    fn lifecycles_only_follow_their_tables(
        wo in (work_order_status(), work_order_status()),
        appt in (appointment_status(), appointment_status()),
        po in (purchase_order_status(), purchase_order_status()),
    ) {
        check_lifecycle(wo.0, wo.1)?;
        check_lifecycle(appt.0, appt.1)?;
        check_lifecycle(po.0, po.1)?;
    }
}
