//! Document state machine.
//!
//! Guards for every lifecycle transition. Each guard validates the
//! requested transition against the document's current state and returns
//! `INVALID_TRANSITION` or `INVALID_DOCUMENT_STATE` when the move is not
//! permitted. The persistence layer performs the actual update inside a
//! transaction after the guard passes.
//!
//! ```text
//! draft -> sent -> accepted (quote, locks) -> revision (unlocks)
//!                  rejected (quote)
//!          sent/overdue -> partially_paid -> paid   (invoice, via ledger)
//! any non-cancelled -> cancelled (terminal)
//! ```

use anyhow::anyhow;
use service_core::error::AppError;

use crate::models::{Document, DocumentStatus, DocumentType};

fn reject_cancelled(document: &Document) -> Result<(), AppError> {
    if document.current_status() == DocumentStatus::Cancelled {
        return Err(AppError::InvalidDocumentState(anyhow!(
            "Document {} is cancelled; no further transitions are permitted",
            document.document_number
        )));
    }
    Ok(())
}

/// `draft -> sent`. Only a draft may be sent; re-sending is rejected.
pub fn ensure_can_send(document: &Document) -> Result<(), AppError> {
    reject_cancelled(document)?;
    if document.current_status() != DocumentStatus::Draft {
        return Err(AppError::InvalidTransition(anyhow!(
            "Only draft documents can be sent, current status is {}",
            document.status
        )));
    }
    Ok(())
}

/// `draft/sent -> accepted`, quotes only. Double-acceptance is rejected.
pub fn ensure_can_accept(document: &Document) -> Result<(), AppError> {
    reject_cancelled(document)?;
    if document.doc_type() != DocumentType::Quote {
        return Err(AppError::InvalidTransition(anyhow!(
            "Only quotes can be accepted"
        )));
    }
    if !matches!(
        document.current_status(),
        DocumentStatus::Draft | DocumentStatus::Sent
    ) {
        return Err(AppError::InvalidTransition(anyhow!(
            "Quote cannot be accepted from status {}",
            document.status
        )));
    }
    Ok(())
}

/// `draft/sent -> rejected`, quotes only. The caller validates that a
/// rejection reason was supplied.
pub fn ensure_can_reject(document: &Document) -> Result<(), AppError> {
    reject_cancelled(document)?;
    if document.doc_type() != DocumentType::Quote {
        return Err(AppError::InvalidTransition(anyhow!(
            "Only quotes can be rejected"
        )));
    }
    if !matches!(
        document.current_status(),
        DocumentStatus::Draft | DocumentStatus::Sent
    ) {
        return Err(AppError::InvalidTransition(anyhow!(
            "Quote cannot be rejected from status {}",
            document.status
        )));
    }
    Ok(())
}

/// Revision creation requires a locked document; unlocking does not change
/// the document's status.
pub fn ensure_can_revise(document: &Document) -> Result<(), AppError> {
    reject_cancelled(document)?;
    if !document.is_locked {
        return Err(AppError::InvalidTransition(anyhow!(
            "Revisions can only be created for locked documents"
        )));
    }
    Ok(())
}

/// Any non-cancelled document may be cancelled; cancellation is terminal.
pub fn ensure_can_cancel(document: &Document) -> Result<(), AppError> {
    reject_cancelled(document)
}

/// Optimistic concurrency check. A caller that read the document earlier
/// may pass the version it saw; a mismatch means someone else mutated the
/// document in between and the edit must be retried against fresh state.
pub fn ensure_expected_version(
    document: &Document,
    expected: Option<i32>,
) -> Result<(), AppError> {
    if let Some(version) = expected {
        if version != document.version {
            return Err(AppError::Conflict(anyhow!(
                "Document {} is at version {}, request was based on version {}",
                document.document_number,
                document.version,
                version
            )));
        }
    }
    Ok(())
}

/// Line items, markup and discount are mutable only while the document is
/// editable: draft, or accepted-and-unlocked after a revision.
pub fn ensure_editable(document: &Document) -> Result<(), AppError> {
    reject_cancelled(document)?;
    if document.is_locked {
        return Err(AppError::InvalidDocumentState(anyhow!(
            "Document {} is locked; create a revision before editing",
            document.document_number
        )));
    }
    if !document.is_editable() {
        return Err(AppError::InvalidDocumentState(anyhow!(
            "Document in status {} cannot be edited",
            document.status
        )));
    }
    Ok(())
}
