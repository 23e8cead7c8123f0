//! Revision handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{CreateRevisionRequest, CreateRevisionResponse},
    engine::{self, Actor, DocumentAction},
    models::Revision,
    AppState,
};

use super::ensure_can_view;

/// Create a revision of a locked document, unlocking it for edits. Staff
/// only; the change reason is mandatory.
pub async fn create_revision(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<CreateRevisionRequest>,
) -> Result<(StatusCode, Json<CreateRevisionResponse>), AppError> {
    payload.validate()?;

    let document = state
        .db
        .get_document(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))?;
    engine::authorize(&actor, DocumentAction::CreateRevision, &document)?;

    let (document, revision) = state
        .db
        .create_revision(document_id, &payload.change_reason, actor.user_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateRevisionResponse { document, revision }),
    ))
}

/// List the revision history for a document.
pub async fn list_revisions(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
) -> Result<Json<Vec<Revision>>, AppError> {
    let document = state
        .db
        .get_document(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))?;
    ensure_can_view(&actor, &document)?;

    let revisions = state.db.list_revisions(document_id).await?;
    Ok(Json(revisions))
}
