//! Authorization guard.
//!
//! Capability checks evaluated before any state transition. Roles form a
//! closed union carrying exactly the proof each check needs: staff carry
//! their business affiliation, clients carry their client record id, admins
//! cross business boundaries. Every failed proof fails closed with
//! `FORBIDDEN`; missing identity is rejected as `UNAUTHORIZED` by the
//! identity middleware before these checks run.

use anyhow::anyhow;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::Document;

/// Caller role, resolved from the verified identity headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Staff { business_id: Uuid },
    Client { client_id: Uuid },
}

/// Authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

/// Lifecycle action being attempted on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentAction {
    Send,
    Accept,
    Reject,
    CreateRevision,
    RecordPayment,
    Cancel,
    Edit,
}

impl DocumentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentAction::Send => "send",
            DocumentAction::Accept => "accept",
            DocumentAction::Reject => "reject",
            DocumentAction::CreateRevision => "create-revision",
            DocumentAction::RecordPayment => "record-payment",
            DocumentAction::Cancel => "cancel",
            DocumentAction::Edit => "edit",
        }
    }

    fn is_client_action(&self) -> bool {
        matches!(self, DocumentAction::Accept | DocumentAction::Reject)
    }
}

/// Check that the actor may perform `action` on `document`.
pub fn authorize(actor: &Actor, action: DocumentAction, document: &Document) -> Result<(), AppError> {
    if action.is_client_action() {
        return match actor.role {
            Role::Client { client_id } if client_id == document.client_id => Ok(()),
            _ => Err(AppError::Forbidden(anyhow!(
                "Only the document's client may {} it",
                action.as_str()
            ))),
        };
    }

    ensure_staff_for_business(actor, document.business_id, action.as_str())
}

/// Staff actions require staff or admin role; staff must belong to the
/// document's issuing business, admins may act on any business.
pub fn ensure_staff_for_business(
    actor: &Actor,
    business_id: Uuid,
    action: &str,
) -> Result<(), AppError> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Staff {
            business_id: own_business,
        } if own_business == business_id => Ok(()),
        Role::Staff { .. } => Err(AppError::Forbidden(anyhow!(
            "Staff may only {} documents of their own business",
            action
        ))),
        Role::Client { .. } => Err(AppError::Forbidden(anyhow!(
            "Clients are not permitted to {} documents",
            action
        ))),
    }
}
