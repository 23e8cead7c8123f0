//! Acceptance snapshot model for documents-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Immutable copy of a quote's terms at the moment of client acceptance.
///
/// Created exactly once per acceptance event and never updated afterwards;
/// the document itself may later be revised, but the accepted terms remain
/// evidence.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AcceptanceSnapshot {
    pub snapshot_id: Uuid,
    pub document_id: Uuid,
    pub items_data: serde_json::Value,
    pub totals_data: serde_json::Value,
    pub accepted_by: Uuid,
    pub acceptance_ip: Option<String>,
    pub acceptance_note: Option<String>,
    pub created_utc: DateTime<Utc>,
}
