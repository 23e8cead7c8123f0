//! Payment ledger tests: status derivation, strict overpayment policy and
//! replay idempotence.

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::{invoice, payment, quote};
use documents_service::engine::{apply_payment, replay_amount_paid};
use documents_service::models::DocumentStatus;

#[test]
fn full_payment_settles_invoice() {
    let doc = invoice(DocumentStatus::Sent, dec!(156.00));

    let outcome =
        apply_payment(&doc, &[], dec!(156.00)).expect("Failed to apply payment");

    assert_eq!(outcome.amount_paid, dec!(156.00));
    assert_eq!(outcome.balance_due, Decimal::ZERO);
    assert_eq!(outcome.status, DocumentStatus::Paid);
}

#[test]
fn partial_payment_moves_to_partially_paid() {
    let doc = invoice(DocumentStatus::Sent, dec!(156.00));

    let outcome =
        apply_payment(&doc, &[], dec!(100.00)).expect("Failed to apply payment");

    assert_eq!(outcome.amount_paid, dec!(100.00));
    assert_eq!(outcome.balance_due, dec!(56.00));
    assert_eq!(outcome.status, DocumentStatus::PartiallyPaid);
}

#[test]
fn second_payment_settles_remaining_balance() {
    let doc = invoice(DocumentStatus::PartiallyPaid, dec!(156.00));
    let history = vec![payment(&doc, dec!(100.00))];

    let outcome =
        apply_payment(&doc, &history, dec!(56.00)).expect("Failed to apply payment");

    assert_eq!(outcome.amount_paid, dec!(156.00));
    assert_eq!(outcome.balance_due, Decimal::ZERO);
    assert_eq!(outcome.status, DocumentStatus::Paid);
}

#[test]
fn overpayment_is_rejected_not_clamped() {
    let doc = invoice(DocumentStatus::Sent, dec!(156.00));

    let err = apply_payment(&doc, &[], dec!(156.01)).expect_err("Expected overpayment");
    assert_eq!(err.code(), "OVERPAYMENT");
}

#[test]
fn overpayment_accounts_for_prior_payments() {
    let doc = invoice(DocumentStatus::PartiallyPaid, dec!(156.00));
    let history = vec![payment(&doc, dec!(150.00))];

    // balance is 6.00, so 6.01 must be rejected
    let err =
        apply_payment(&doc, &history, dec!(6.01)).expect_err("Expected overpayment");
    assert_eq!(err.code(), "OVERPAYMENT");

    let outcome =
        apply_payment(&doc, &history, dec!(6.00)).expect("Failed to apply payment");
    assert_eq!(outcome.status, DocumentStatus::Paid);
}

#[test]
fn non_positive_amounts_are_rejected() {
    let doc = invoice(DocumentStatus::Sent, dec!(156.00));

    let err = apply_payment(&doc, &[], Decimal::ZERO).expect_err("Expected rejection");
    assert_eq!(err.code(), "VALIDATION_ERROR");

    let err = apply_payment(&doc, &[], dec!(-5.00)).expect_err("Expected rejection");
    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[test]
fn payments_against_quotes_are_rejected() {
    let doc = quote(DocumentStatus::Sent);

    let err = apply_payment(&doc, &[], dec!(10.00)).expect_err("Expected rejection");
    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[test]
fn draft_and_cancelled_invoices_refuse_payments() {
    for status in [DocumentStatus::Draft, DocumentStatus::Cancelled] {
        let doc = invoice(status, dec!(156.00));
        let err = apply_payment(&doc, &[], dec!(10.00)).expect_err("Expected rejection");
        assert_eq!(err.code(), "INVALID_DOCUMENT_STATE");
    }
}

#[test]
fn overdue_invoice_accepts_partial_payment() {
    let doc = invoice(DocumentStatus::Overdue, dec!(200.00));

    let outcome =
        apply_payment(&doc, &[], dec!(50.00)).expect("Failed to apply payment");

    assert_eq!(outcome.status, DocumentStatus::PartiallyPaid);
    assert_eq!(outcome.balance_due, dec!(150.00));
}

#[test]
fn ledger_replay_is_idempotent() {
    let doc = invoice(DocumentStatus::PartiallyPaid, dec!(300.00));
    let history = vec![
        payment(&doc, dec!(120.50)),
        payment(&doc, dec!(79.50)),
        payment(&doc, dec!(25.00)),
    ];

    let first = replay_amount_paid(&history);
    let second = replay_amount_paid(&history);

    assert_eq!(first, dec!(225.00));
    assert_eq!(first, second);
}
