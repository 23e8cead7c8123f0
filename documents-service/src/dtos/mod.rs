//! Request and response payloads for the REST surface.
//!
//! Derived monetary fields never appear in requests; they are recomputed by
//! the engine on every mutation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{AcceptanceSnapshot, Document, LineItem, Payment, Revision};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LineItemInput {
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDocumentRequest {
    pub business_id: Uuid,
    pub client_id: Uuid,
    pub document_type: String,
    pub vat_rate: Decimal,
    pub markup_amount: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub deposit_amount: Option<Decimal>,
    #[validate(length(min = 1, message = "at least one line item is required"), nested)]
    pub line_items: Vec<LineItemInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReplaceLineItemsRequest {
    #[validate(length(min = 1, message = "at least one line item is required"), nested)]
    pub line_items: Vec<LineItemInput>,
    pub markup_amount: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    /// Document version the edit was based on; a stale value is a conflict.
    pub version: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AcceptQuoteRequest {
    pub acceptance_note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RejectQuoteRequest {
    #[validate(length(min = 1, message = "rejection reason is required"))]
    pub rejection_reason: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRevisionRequest {
    #[validate(length(min = 1, message = "change reason is required"))]
    pub change_reason: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    #[validate(length(min = 1, message = "payment method is required"))]
    pub method: String,
    pub reference: Option<String>,
    pub paid_at: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    pub status: Option<String>,
    pub document_type: Option<String>,
    pub business_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    #[serde(default = "default_page_size")]
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}

fn default_page_size() -> i32 {
    50
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    #[serde(flatten)]
    pub document: Document,
    pub line_items: Vec<LineItem>,
}

#[derive(Debug, Serialize)]
pub struct AcceptQuoteResponse {
    pub document: Document,
    pub snapshot: AcceptanceSnapshot,
}

#[derive(Debug, Serialize)]
pub struct CreateRevisionResponse {
    pub document: Document,
    pub revision: Revision,
}

#[derive(Debug, Serialize)]
pub struct RecordPaymentResponse {
    pub document: Document,
    pub payment: Payment,
}
