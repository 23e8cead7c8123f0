//! Currency rounding for the totals and ledger engines.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to 2 decimal places, half away from zero.
///
/// Every monetary output of the engine passes through this exactly once per
/// arithmetic step, so compounding behaviour is deterministic regardless of
/// how many line items or payments accumulate.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
