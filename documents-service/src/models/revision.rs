//! Revision model for documents-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Snapshot of a locked document taken when staff unlock it for edits.
///
/// Revision numbers increase monotonically per document starting at 1, and
/// each revision links to its predecessor, so the full pre-edit history of
/// an accepted document stays provable.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Revision {
    pub revision_id: Uuid,
    pub document_id: Uuid,
    pub revision_number: i32,
    pub parent_revision_id: Option<Uuid>,
    pub document_data: serde_json::Value,
    pub items_data: serde_json::Value,
    pub totals_data: serde_json::Value,
    pub change_reason: String,
    pub created_by: Uuid,
    pub created_utc: DateTime<Utc>,
}
