//! Document model for documents-service.
//!
//! A document is a quote or an invoice: the unit of financial lifecycle
//! tracked by this service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Quote,
    Invoice,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Quote => "quote",
            DocumentType::Invoice => "invoice",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "invoice" => DocumentType::Invoice,
            _ => DocumentType::Quote,
        }
    }
}

/// Document status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
    PartiallyPaid,
    Paid,
    Overdue,
    Cancelled,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Sent => "sent",
            DocumentStatus::Accepted => "accepted",
            DocumentStatus::Rejected => "rejected",
            DocumentStatus::PartiallyPaid => "partially_paid",
            DocumentStatus::Paid => "paid",
            DocumentStatus::Overdue => "overdue",
            DocumentStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "sent" => DocumentStatus::Sent,
            "accepted" => DocumentStatus::Accepted,
            "rejected" => DocumentStatus::Rejected,
            "partially_paid" => DocumentStatus::PartiallyPaid,
            "paid" => DocumentStatus::Paid,
            "overdue" => DocumentStatus::Overdue,
            "cancelled" => DocumentStatus::Cancelled,
            _ => DocumentStatus::Draft,
        }
    }
}

/// Quote or invoice document.
///
/// `subtotal`, `vat_amount`, `total`, `amount_paid` and `balance_due` are
/// derived fields: they are recomputed by the engine and never taken from a
/// client request. `version` backs optimistic concurrency on mutation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub document_id: Uuid,
    pub business_id: Uuid,
    pub client_id: Uuid,
    pub document_number: String,
    pub document_type: String,
    pub status: String,
    pub vat_rate: Decimal,
    pub markup_amount: Decimal,
    pub discount_amount: Decimal,
    pub deposit_amount: Option<Decimal>,
    pub subtotal: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    pub is_locked: bool,
    pub revision_count: i32,
    pub rejection_reason: Option<String>,
    pub accepted_by: Option<Uuid>,
    pub rejected_by: Option<Uuid>,
    pub acceptance_ip: Option<String>,
    pub acceptance_note: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Document {
    pub fn doc_type(&self) -> DocumentType {
        DocumentType::from_string(&self.document_type)
    }

    pub fn current_status(&self) -> DocumentStatus {
        DocumentStatus::from_string(&self.status)
    }

    /// Line items, markup and discount may change only on a draft, or on an
    /// accepted document after a revision has unlocked it.
    pub fn is_editable(&self) -> bool {
        match self.current_status() {
            DocumentStatus::Draft => true,
            DocumentStatus::Accepted => !self.is_locked,
            _ => false,
        }
    }
}

/// Filter parameters for listing documents.
#[derive(Debug, Clone, Default)]
pub struct ListDocumentsFilter {
    pub business_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub document_type: Option<DocumentType>,
    pub status: Option<DocumentStatus>,
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}

/// Input for creating a draft document.
#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub business_id: Uuid,
    pub client_id: Uuid,
    pub document_type: DocumentType,
    pub vat_rate: Decimal,
    pub markup_amount: Decimal,
    pub discount_amount: Decimal,
    pub deposit_amount: Option<Decimal>,
}
