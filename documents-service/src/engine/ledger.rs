//! Payment ledger.
//!
//! Derives a document's paid/balance totals and payment status from the
//! full payment history. The running `amount_paid` on the document row is
//! never trusted: replaying the ledger is the source of truth, which keeps
//! totals consistent even if prior payments were corrected out-of-band.

use anyhow::anyhow;
use rust_decimal::Decimal;
use service_core::error::AppError;

use crate::engine::money::round2;
use crate::models::{Document, DocumentStatus, DocumentType, Payment};

/// Result of applying a payment: the recomputed totals and derived status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerOutcome {
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    pub status: DocumentStatus,
}

/// Validate and apply a new payment against a document's ledger.
///
/// Strict overpayment policy: a payment exceeding the outstanding balance is
/// rejected, never clamped. The caller appends the payment record and
/// persists the outcome atomically with the document row.
pub fn apply_payment(
    document: &Document,
    existing_payments: &[Payment],
    amount: Decimal,
) -> Result<LedgerOutcome, AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow!(
            "Payment amount must be greater than zero"
        )));
    }

    if document.doc_type() != DocumentType::Invoice {
        return Err(AppError::BadRequest(anyhow!(
            "Payments can only be recorded against invoices"
        )));
    }

    let status = document.current_status();
    if matches!(status, DocumentStatus::Draft | DocumentStatus::Cancelled) {
        return Err(AppError::InvalidDocumentState(anyhow!(
            "Cannot record a payment against a {} document",
            status.as_str()
        )));
    }

    let already_paid = round2(
        existing_payments
            .iter()
            .map(|p| p.amount)
            .sum::<Decimal>(),
    );
    let mut balance_before = round2(document.total - already_paid);
    if balance_before < Decimal::ZERO {
        balance_before = Decimal::ZERO;
    }

    if amount > balance_before {
        return Err(AppError::Overpayment(anyhow!(
            "Payment amount {} exceeds balance due {}",
            amount,
            balance_before
        )));
    }

    let amount_paid = round2(already_paid + amount);
    let mut balance_due = round2(document.total - amount_paid);
    if balance_due < Decimal::ZERO {
        balance_due = Decimal::ZERO;
    }

    let status = if balance_due == Decimal::ZERO {
        DocumentStatus::Paid
    } else if amount_paid > Decimal::ZERO {
        DocumentStatus::PartiallyPaid
    } else {
        status
    };

    Ok(LedgerOutcome {
        amount_paid,
        balance_due,
        status,
    })
}

/// Recompute `amount_paid` by replaying the full payment set.
///
/// Replaying twice yields the same result; the sum is rounded once, after
/// accumulation of already-rounded payment amounts.
pub fn replay_amount_paid(payments: &[Payment]) -> Decimal {
    round2(payments.iter().map(|p| p.amount).sum::<Decimal>())
}
