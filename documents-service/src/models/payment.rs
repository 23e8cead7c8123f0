//! Payment model for documents-service.
//!
//! Payments form an append-only ledger per document: records are never
//! mutated or deleted once created, so the document's paid/balance totals
//! can always be recomputed by replaying the full set.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Recorded payment against an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub payment_id: Uuid,
    pub document_id: Uuid,
    pub business_id: Uuid,
    pub amount: Decimal,
    pub method: String,
    pub reference: Option<String>,
    pub paid_at: NaiveDate,
    pub recorded_by: Uuid,
    pub created_utc: DateTime<Utc>,
}

/// Input for recording a payment.
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub document_id: Uuid,
    pub amount: Decimal,
    pub method: String,
    pub reference: Option<String>,
    pub paid_at: NaiveDate,
    pub recorded_by: Uuid,
}
