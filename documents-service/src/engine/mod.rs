//! Quote/invoice lifecycle and ledger engine.
//!
//! Pure domain logic with no I/O: money rounding, totals derivation, the
//! payment ledger, the document state machine, authorization checks and
//! number formatting. The persistence layer calls into these modules inside
//! its transactions.

pub mod authz;
pub mod ledger;
pub mod lifecycle;
pub mod money;
pub mod numbering;
pub mod totals;

pub use authz::{authorize, ensure_staff_for_business, Actor, DocumentAction, Role};
pub use ledger::{apply_payment, replay_amount_paid, LedgerOutcome};
pub use lifecycle::{
    ensure_can_accept, ensure_can_cancel, ensure_can_reject, ensure_can_revise, ensure_can_send,
    ensure_editable, ensure_expected_version,
};
pub use money::round2;
pub use totals::{calculate_totals, line_total, DocumentTotals};
