//! Payment recording handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{RecordPaymentRequest, RecordPaymentResponse},
    engine::{self, DocumentAction},
    models::{CreatePayment, Payment},
    services::database::default_paid_at,
    AppState,
};

use super::ensure_can_view;
use crate::engine::Actor;

/// Record a payment against an invoice. Staff only; the ledger enforces the
/// strict overpayment policy inside the document row lock.
pub async fn record_payment(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<RecordPaymentResponse>), AppError> {
    payload.validate()?;

    let document = state
        .db
        .get_document(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))?;
    engine::authorize(&actor, DocumentAction::RecordPayment, &document)?;

    let input = CreatePayment {
        document_id,
        amount: payload.amount,
        method: payload.method,
        reference: payload.reference,
        paid_at: default_paid_at(payload.paid_at),
        recorded_by: actor.user_id,
    };

    let (document, payment) = state.db.record_payment(&input).await?;

    Ok((
        StatusCode::CREATED,
        Json(RecordPaymentResponse { document, payment }),
    ))
}

/// List the payment ledger for a document.
pub async fn list_payments(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let document = state
        .db
        .get_document(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))?;
    ensure_can_view(&actor, &document)?;

    let payments = state.db.get_payments(document_id).await?;
    Ok(Json(payments))
}
