//! Shared fixtures for engine tests.

#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use documents_service::engine::{Actor, Role};
use documents_service::models::{Document, DocumentStatus, DocumentType, Payment};

pub const TEST_BUSINESS_ID: Uuid = Uuid::from_u128(0x0b5e55ed_0000_0000_0000_000000000001);
pub const TEST_CLIENT_ID: Uuid = Uuid::from_u128(0xc11e0000_0000_0000_0000_000000000002);
pub const TEST_USER_ID: Uuid = Uuid::from_u128(0x5caff000_0000_0000_0000_000000000003);

/// A document fixture with sane defaults and the given type/status/total.
pub fn document(
    document_type: DocumentType,
    status: DocumentStatus,
    total: Decimal,
) -> Document {
    let now = Utc::now();
    Document {
        document_id: Uuid::new_v4(),
        business_id: TEST_BUSINESS_ID,
        client_id: TEST_CLIENT_ID,
        document_number: "INV-000001".to_string(),
        document_type: document_type.as_str().to_string(),
        status: status.as_str().to_string(),
        vat_rate: dec!(20),
        markup_amount: Decimal::ZERO,
        discount_amount: Decimal::ZERO,
        deposit_amount: None,
        subtotal: total,
        vat_amount: Decimal::ZERO,
        total,
        amount_paid: Decimal::ZERO,
        balance_due: total,
        is_locked: false,
        revision_count: 0,
        rejection_reason: None,
        accepted_by: None,
        rejected_by: None,
        acceptance_ip: None,
        acceptance_note: None,
        sent_at: None,
        accepted_at: None,
        rejected_at: None,
        cancelled_at: None,
        version: 1,
        created_utc: now,
        updated_utc: now,
    }
}

pub fn invoice(status: DocumentStatus, total: Decimal) -> Document {
    document(DocumentType::Invoice, status, total)
}

pub fn quote(status: DocumentStatus) -> Document {
    document(DocumentType::Quote, status, dec!(156.00))
}

pub fn payment(document: &Document, amount: Decimal) -> Payment {
    Payment {
        payment_id: Uuid::new_v4(),
        document_id: document.document_id,
        business_id: document.business_id,
        amount,
        method: "bank_transfer".to_string(),
        reference: None,
        paid_at: Utc::now().date_naive(),
        recorded_by: TEST_USER_ID,
        created_utc: Utc::now(),
    }
}

pub fn admin() -> Actor {
    Actor {
        user_id: TEST_USER_ID,
        role: Role::Admin,
    }
}

pub fn staff(business_id: Uuid) -> Actor {
    Actor {
        user_id: TEST_USER_ID,
        role: Role::Staff { business_id },
    }
}

pub fn client(client_id: Uuid) -> Actor {
    Actor {
        user_id: TEST_USER_ID,
        role: Role::Client { client_id },
    }
}
