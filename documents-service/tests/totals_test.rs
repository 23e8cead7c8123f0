//! Totals calculator tests: subtotal/VAT/total derivation, markup and
//! discount handling, and per-step rounding behaviour.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use documents_service::engine::{calculate_totals, line_total};
use documents_service::models::CreateLineItem;

fn item(quantity: Decimal, unit_price: Decimal) -> CreateLineItem {
    CreateLineItem {
        description: "Materials".to_string(),
        quantity,
        unit_price,
        sort_order: 0,
    }
}

#[test]
fn derives_subtotal_vat_and_total() {
    // 2 x 50.00 + 1 x 30.00 at 20% VAT
    let items = vec![item(dec!(2), dec!(50.00)), item(dec!(1), dec!(30.00))];

    let totals = calculate_totals(
        &items,
        dec!(20),
        Decimal::ZERO,
        Decimal::ZERO,
        None,
        Decimal::ZERO,
    )
    .expect("Failed to calculate totals");

    assert_eq!(totals.subtotal, dec!(130.00));
    assert_eq!(totals.vat_amount, dec!(26.00));
    assert_eq!(totals.total, dec!(156.00));
    assert_eq!(totals.balance_due, dec!(156.00));
}

#[test]
fn vat_applies_to_adjusted_subtotal_not_raw_subtotal() {
    let items = vec![item(dec!(1), dec!(100.00))];

    // markup 20, discount 10: adjusted = 110, VAT = 11, total = 121
    let totals = calculate_totals(
        &items,
        dec!(10),
        dec!(20.00),
        dec!(10.00),
        None,
        Decimal::ZERO,
    )
    .expect("Failed to calculate totals");

    assert_eq!(totals.subtotal, dec!(100.00));
    assert_eq!(totals.vat_amount, dec!(11.00));
    assert_eq!(totals.total, dec!(121.00));
}

#[test]
fn line_totals_round_before_summing() {
    // 3 x 0.335 = 1.005 -> rounds to 1.01 per line, not at the end
    assert_eq!(line_total(dec!(3), dec!(0.335)), dec!(1.01));

    let items = vec![item(dec!(3), dec!(0.335)), item(dec!(3), dec!(0.335))];
    let totals = calculate_totals(
        &items,
        Decimal::ZERO,
        Decimal::ZERO,
        Decimal::ZERO,
        None,
        Decimal::ZERO,
    )
    .expect("Failed to calculate totals");

    assert_eq!(totals.subtotal, dec!(2.02));
}

#[test]
fn zero_vat_rate_yields_no_vat() {
    let items = vec![item(dec!(4), dec!(25.00))];
    let totals = calculate_totals(
        &items,
        Decimal::ZERO,
        Decimal::ZERO,
        Decimal::ZERO,
        None,
        Decimal::ZERO,
    )
    .expect("Failed to calculate totals");

    assert_eq!(totals.vat_amount, Decimal::ZERO);
    assert_eq!(totals.total, dec!(100.00));
}

#[test]
fn discount_exceeding_subtotal_plus_markup_is_rejected() {
    let items = vec![item(dec!(1), dec!(100.00))];

    let err = calculate_totals(&items, dec!(20), dec!(10.00), dec!(110.01), None, Decimal::ZERO)
        .expect_err("Expected discount rejection");

    assert_eq!(err.code(), "INVALID_DISCOUNT");
}

#[test]
fn discount_equal_to_subtotal_plus_markup_is_allowed() {
    let items = vec![item(dec!(1), dec!(100.00))];

    let totals = calculate_totals(&items, dec!(20), dec!(10.00), dec!(110.00), None, Decimal::ZERO)
        .expect("Failed to calculate totals");

    assert_eq!(totals.total, Decimal::ZERO.round_dp(2));
    assert_eq!(totals.balance_due, Decimal::ZERO.round_dp(2));
}

#[test]
fn deposit_does_not_enter_the_arithmetic() {
    // deposits settle through the payments ledger, not the totals
    let items = vec![item(dec!(2), dec!(50.00)), item(dec!(1), dec!(30.00))];

    let with_deposit = calculate_totals(
        &items,
        dec!(20),
        Decimal::ZERO,
        Decimal::ZERO,
        Some(dec!(40.00)),
        Decimal::ZERO,
    )
    .expect("Failed to calculate totals");
    let without_deposit = calculate_totals(
        &items,
        dec!(20),
        Decimal::ZERO,
        Decimal::ZERO,
        None,
        Decimal::ZERO,
    )
    .expect("Failed to calculate totals");

    assert_eq!(with_deposit, without_deposit);
    assert_eq!(with_deposit.total, dec!(156.00));
    assert_eq!(with_deposit.balance_due, dec!(156.00));
}

#[test]
fn rejects_negative_deposit() {
    let items = vec![item(dec!(1), dec!(100.00))];

    let err = calculate_totals(
        &items,
        Decimal::ZERO,
        Decimal::ZERO,
        Decimal::ZERO,
        Some(dec!(-1.00)),
        Decimal::ZERO,
    )
    .expect_err("Expected deposit rejection");

    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[test]
fn overpaid_balance_clamps_to_zero() {
    let items = vec![item(dec!(1), dec!(100.00))];

    // amount_paid greater than total: ledger rejects new overpayments, but
    // replayed history may exceed total after out-of-band corrections
    let totals = calculate_totals(
        &items,
        Decimal::ZERO,
        Decimal::ZERO,
        Decimal::ZERO,
        None,
        dec!(150.00),
    )
    .expect("Failed to calculate totals");

    assert_eq!(totals.balance_due, Decimal::ZERO);
}

#[test]
fn rejects_non_positive_quantity() {
    let items = vec![item(Decimal::ZERO, dec!(10.00))];
    let err = calculate_totals(
        &items,
        Decimal::ZERO,
        Decimal::ZERO,
        Decimal::ZERO,
        None,
        Decimal::ZERO,
    )
    .expect_err("Expected quantity rejection");

    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[test]
fn rejects_out_of_range_vat_rate() {
    let items = vec![item(dec!(1), dec!(10.00))];
    let err = calculate_totals(&items, dec!(101), Decimal::ZERO, Decimal::ZERO, None, Decimal::ZERO)
        .expect_err("Expected VAT rate rejection");

    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[test]
fn total_reconciles_for_fractional_rates() {
    // 7 x 14.99 = 104.93, 8.25% VAT on adjusted
    let items = vec![item(dec!(7), dec!(14.99))];
    let totals = calculate_totals(
        &items,
        dec!(8.25),
        Decimal::ZERO,
        Decimal::ZERO,
        None,
        Decimal::ZERO,
    )
    .expect("Failed to calculate totals");

    assert_eq!(totals.subtotal, dec!(104.93));
    // 104.93 * 0.0825 = 8.656725 -> 8.66
    assert_eq!(totals.vat_amount, dec!(8.66));
    assert_eq!(totals.total, dec!(113.59));
}
