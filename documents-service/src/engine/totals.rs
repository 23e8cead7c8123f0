//! Line-item totals calculator.
//!
//! Pure derivation of a document's monetary fields from its line items and
//! rate parameters. Callers persist the result; nothing here touches
//! storage.

use anyhow::anyhow;
use rust_decimal::Decimal;
use service_core::error::AppError;

use crate::engine::money::round2;
use crate::models::CreateLineItem;

/// Derived monetary fields of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTotals {
    pub subtotal: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
}

/// Line total for one item: `round2(quantity * unit_price)`.
pub fn line_total(quantity: Decimal, unit_price: Decimal) -> Decimal {
    round2(quantity * unit_price)
}

/// Derive subtotal, VAT, total and balance due.
///
/// VAT is applied to the adjusted subtotal (after markup and discount), not
/// to the raw subtotal. Rounding happens at each arithmetic step. The
/// deposit is validated here but never enters the arithmetic: deposits
/// settle through the payments ledger like any other payment.
///
/// Overpayment is clamped here (balance floors at zero); rejecting a payment
/// that would overpay is the ledger's job before totals are rederived.
pub fn calculate_totals(
    items: &[CreateLineItem],
    vat_rate: Decimal,
    markup_amount: Decimal,
    discount_amount: Decimal,
    deposit_amount: Option<Decimal>,
    amount_paid: Decimal,
) -> Result<DocumentTotals, AppError> {
    if vat_rate < Decimal::ZERO || vat_rate > Decimal::ONE_HUNDRED {
        return Err(AppError::BadRequest(anyhow!(
            "VAT rate must be between 0 and 100, got {}",
            vat_rate
        )));
    }
    if markup_amount < Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow!(
            "Markup amount must not be negative"
        )));
    }
    if discount_amount < Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow!(
            "Discount amount must not be negative"
        )));
    }
    if let Some(deposit) = deposit_amount {
        if deposit < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow!(
                "Deposit amount must not be negative"
            )));
        }
    }
    for item in items {
        if item.quantity <= Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow!(
                "Line item quantity must be greater than zero"
            )));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow!(
                "Line item unit price must not be negative"
            )));
        }
    }

    let subtotal = round2(
        items
            .iter()
            .map(|item| line_total(item.quantity, item.unit_price))
            .sum::<Decimal>(),
    );

    if discount_amount > round2(subtotal + markup_amount) {
        return Err(AppError::InvalidDiscount(anyhow!(
            "Discount {} exceeds subtotal plus markup {}",
            discount_amount,
            round2(subtotal + markup_amount)
        )));
    }

    let adjusted = round2(subtotal + markup_amount - discount_amount);
    if adjusted < Decimal::ZERO {
        return Err(AppError::NegativeAdjustedTotal(anyhow!(
            "Adjusted subtotal is negative: {}",
            adjusted
        )));
    }

    let vat_amount = round2(adjusted * vat_rate / Decimal::ONE_HUNDRED);
    let total = round2(adjusted + vat_amount);

    let amount_paid = round2(amount_paid);
    let mut balance_due = round2(total - amount_paid);
    if balance_due < Decimal::ZERO {
        balance_due = Decimal::ZERO;
    }

    Ok(DocumentTotals {
        subtotal,
        vat_amount,
        total,
        amount_paid,
        balance_due,
    })
}
