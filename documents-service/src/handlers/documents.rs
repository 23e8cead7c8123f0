//! Document lifecycle handlers.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use rust_decimal::Decimal;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        AcceptQuoteRequest, AcceptQuoteResponse, CreateDocumentRequest, DocumentResponse,
        ListDocumentsQuery, RejectQuoteRequest, ReplaceLineItemsRequest,
    },
    engine::{self, Actor, DocumentAction, Role},
    models::{
        CreateDocument, CreateLineItem, Document, DocumentType, ListDocumentsFilter,
    },
    services::database::parse_status_filter,
    AppState,
};

use super::ensure_can_view;

fn parse_document_type(s: &str) -> Result<DocumentType, AppError> {
    match s {
        "quote" => Ok(DocumentType::Quote),
        "invoice" => Ok(DocumentType::Invoice),
        other => Err(AppError::BadRequest(anyhow::anyhow!(
            "Unknown document type '{}'",
            other
        ))),
    }
}

fn line_item_inputs(payload_items: &[crate::dtos::LineItemInput]) -> Vec<CreateLineItem> {
    payload_items
        .iter()
        .map(|item| CreateLineItem {
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            sort_order: item.sort_order,
        })
        .collect()
}

async fn load_document(state: &AppState, document_id: Uuid) -> Result<Document, AppError> {
    state
        .db
        .get_document(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))
}

/// Create a draft document. Staff only, within their own business.
pub async fn create_document(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>), AppError> {
    payload.validate()?;
    engine::ensure_staff_for_business(&actor, payload.business_id, "create")?;

    let document_type = parse_document_type(&payload.document_type)?;
    let input = CreateDocument {
        business_id: payload.business_id,
        client_id: payload.client_id,
        document_type,
        vat_rate: payload.vat_rate,
        markup_amount: payload.markup_amount.unwrap_or(Decimal::ZERO),
        discount_amount: payload.discount_amount.unwrap_or(Decimal::ZERO),
        deposit_amount: payload.deposit_amount,
    };
    let items = line_item_inputs(&payload.line_items);

    let (document, line_items) = state.db.create_document(&input, &items).await?;

    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse {
            document,
            line_items,
        }),
    ))
}

/// Get a document with its line items.
pub async fn get_document(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, AppError> {
    let document = load_document(&state, document_id).await?;
    ensure_can_view(&actor, &document)?;

    let line_items = state.db.get_line_items(document_id).await?;

    Ok(Json(DocumentResponse {
        document,
        line_items,
    }))
}

/// List documents visible to the actor. Staff see their business, clients
/// see their own documents, admins see everything.
pub async fn list_documents(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<Vec<Document>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(parse_status_filter)
        .transpose()?;
    let document_type = query
        .document_type
        .as_deref()
        .map(parse_document_type)
        .transpose()?;

    let (business_id, client_id) = match actor.role {
        Role::Admin => (query.business_id, query.client_id),
        Role::Staff { business_id } => (Some(business_id), query.client_id),
        Role::Client { client_id } => (None, Some(client_id)),
    };

    let filter = ListDocumentsFilter {
        business_id,
        client_id,
        document_type,
        status,
        page_size: query.page_size,
        page_token: query.page_token,
    };

    let documents = state.db.list_documents(&filter).await?;
    Ok(Json(documents))
}

/// Replace line items (and optionally markup/discount) on an editable
/// document. Totals are rederived by the engine.
pub async fn replace_line_items(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<ReplaceLineItemsRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    payload.validate()?;

    let document = load_document(&state, document_id).await?;
    engine::authorize(&actor, DocumentAction::Edit, &document)?;

    let items = line_item_inputs(&payload.line_items);
    let (document, line_items) = state
        .db
        .replace_line_items(
            document_id,
            &items,
            payload.markup_amount,
            payload.discount_amount,
            payload.version,
        )
        .await?;

    Ok(Json(DocumentResponse {
        document,
        line_items,
    }))
}

/// Send a draft document to its client.
pub async fn send_document(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
) -> Result<Json<Document>, AppError> {
    let document = load_document(&state, document_id).await?;
    engine::authorize(&actor, DocumentAction::Send, &document)?;

    let document = state.db.send_document(document_id).await?;
    Ok(Json(document))
}

/// Accept a quote as the client. Creates the acceptance snapshot and locks
/// the document.
pub async fn accept_quote(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<AcceptQuoteRequest>,
) -> Result<Json<AcceptQuoteResponse>, AppError> {
    payload.validate()?;

    let document = load_document(&state, document_id).await?;
    engine::authorize(&actor, DocumentAction::Accept, &document)?;

    let acceptance_ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string());

    let (document, snapshot) = state
        .db
        .accept_quote(
            document_id,
            actor.user_id,
            acceptance_ip,
            payload.acceptance_note,
        )
        .await?;

    Ok(Json(AcceptQuoteResponse { document, snapshot }))
}

/// Reject a quote as the client. The reason is mandatory.
pub async fn reject_quote(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<RejectQuoteRequest>,
) -> Result<Json<Document>, AppError> {
    payload.validate()?;

    let document = load_document(&state, document_id).await?;
    engine::authorize(&actor, DocumentAction::Reject, &document)?;

    let document = state
        .db
        .reject_quote(document_id, actor.user_id, &payload.rejection_reason)
        .await?;

    Ok(Json(document))
}

/// Cancel a document. Terminal.
pub async fn cancel_document(
    State(state): State<AppState>,
    actor: Actor,
    Path(document_id): Path<Uuid>,
) -> Result<Json<Document>, AppError> {
    let document = load_document(&state, document_id).await?;
    engine::authorize(&actor, DocumentAction::Cancel, &document)?;

    let document = state.db.cancel_document(document_id).await?;
    Ok(Json(document))
}
