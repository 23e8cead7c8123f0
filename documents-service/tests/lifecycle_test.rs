//! State machine tests: allowed transitions, terminal states and the
//! lock/revision editing rules.

mod common;

use rust_decimal_macros::dec;

use common::{document, invoice, quote};
use documents_service::engine::{
    ensure_can_accept, ensure_can_cancel, ensure_can_reject, ensure_can_revise,
    ensure_can_send, ensure_editable, ensure_expected_version,
};
use documents_service::models::{DocumentStatus, DocumentType};

#[test]
fn only_drafts_can_be_sent() {
    ensure_can_send(&quote(DocumentStatus::Draft)).expect("Draft should be sendable");

    for status in [
        DocumentStatus::Sent,
        DocumentStatus::Accepted,
        DocumentStatus::Rejected,
        DocumentStatus::PartiallyPaid,
        DocumentStatus::Paid,
        DocumentStatus::Overdue,
    ] {
        let err = ensure_can_send(&document(DocumentType::Invoice, status, dec!(100.00)))
            .expect_err("Non-draft should not be sendable");
        assert_eq!(err.code(), "INVALID_TRANSITION");
    }
}

#[test]
fn quotes_accept_from_draft_or_sent() {
    ensure_can_accept(&quote(DocumentStatus::Draft)).expect("Draft quote should accept");
    ensure_can_accept(&quote(DocumentStatus::Sent)).expect("Sent quote should accept");
}

#[test]
fn double_acceptance_is_rejected() {
    let err = ensure_can_accept(&quote(DocumentStatus::Accepted))
        .expect_err("Accepted quote should not accept again");
    assert_eq!(err.code(), "INVALID_TRANSITION");
}

#[test]
fn rejected_quote_cannot_be_accepted_or_rerejected() {
    let doc = quote(DocumentStatus::Rejected);

    assert_eq!(
        ensure_can_accept(&doc).expect_err("Expected rejection").code(),
        "INVALID_TRANSITION"
    );
    assert_eq!(
        ensure_can_reject(&doc).expect_err("Expected rejection").code(),
        "INVALID_TRANSITION"
    );
}

#[test]
fn invoices_cannot_be_accepted_or_rejected() {
    let doc = invoice(DocumentStatus::Sent, dec!(100.00));

    assert_eq!(
        ensure_can_accept(&doc).expect_err("Expected rejection").code(),
        "INVALID_TRANSITION"
    );
    assert_eq!(
        ensure_can_reject(&doc).expect_err("Expected rejection").code(),
        "INVALID_TRANSITION"
    );
}

#[test]
fn revisions_require_a_locked_document() {
    let mut doc = quote(DocumentStatus::Accepted);
    doc.is_locked = true;
    ensure_can_revise(&doc).expect("Locked document should allow a revision");

    doc.is_locked = false;
    let err = ensure_can_revise(&doc).expect_err("Unlocked document should refuse");
    assert_eq!(err.code(), "INVALID_TRANSITION");
}

#[test]
fn cancellation_is_terminal() {
    ensure_can_cancel(&quote(DocumentStatus::Sent)).expect("Sent should cancel");
    ensure_can_cancel(&invoice(DocumentStatus::PartiallyPaid, dec!(100.00)))
        .expect("Partially paid should cancel");

    let cancelled = quote(DocumentStatus::Cancelled);
    for result in [
        ensure_can_send(&cancelled),
        ensure_can_accept(&cancelled),
        ensure_can_reject(&cancelled),
        ensure_can_revise(&cancelled),
        ensure_can_cancel(&cancelled),
        ensure_editable(&cancelled),
    ] {
        let err = result.expect_err("Cancelled document should refuse all transitions");
        assert_eq!(err.code(), "INVALID_DOCUMENT_STATE");
    }
}

#[test]
fn drafts_are_editable() {
    ensure_editable(&quote(DocumentStatus::Draft)).expect("Draft should be editable");
}

#[test]
fn locked_accepted_quote_is_not_editable() {
    let mut doc = quote(DocumentStatus::Accepted);
    doc.is_locked = true;

    let err = ensure_editable(&doc).expect_err("Locked document should refuse edits");
    assert_eq!(err.code(), "INVALID_DOCUMENT_STATE");
}

#[test]
fn accepted_quote_becomes_editable_after_revision_unlock() {
    // create_revision flips is_locked back to false without changing status
    let mut doc = quote(DocumentStatus::Accepted);
    doc.is_locked = false;
    doc.revision_count = 1;

    ensure_editable(&doc).expect("Unlocked accepted quote should be editable");
}

#[test]
fn stale_version_is_a_conflict() {
    let mut doc = quote(DocumentStatus::Draft);
    doc.version = 3;

    let err = ensure_expected_version(&doc, Some(2)).expect_err("Stale version should conflict");
    assert_eq!(err.code(), "CONFLICT");

    ensure_expected_version(&doc, Some(3)).expect("Matching version should pass");
    ensure_expected_version(&doc, None).expect("Omitted version skips the check");
}

#[test]
fn sent_documents_are_not_editable() {
    let err = ensure_editable(&invoice(DocumentStatus::Sent, dec!(100.00)))
        .expect_err("Sent document should refuse edits");
    assert_eq!(err.code(), "INVALID_DOCUMENT_STATE");
}
