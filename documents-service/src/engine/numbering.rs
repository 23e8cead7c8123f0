//! Document numbering.
//!
//! Numbers are `{PREFIX}-{counter:06}` with the counter scoped per
//! business and document type. Allocation happens in the database layer as
//! a transactional upsert-increment; this module owns prefixes and
//! formatting. Counters are never reused, even when a document is later
//! cancelled.

use crate::models::DocumentType;

pub const QUOTE_PREFIX: &str = "Q";
pub const INVOICE_PREFIX: &str = "INV";

/// Default number prefix for a document type. A business may override the
/// prefix through its counter row.
pub fn default_prefix(document_type: DocumentType) -> &'static str {
    match document_type {
        DocumentType::Quote => QUOTE_PREFIX,
        DocumentType::Invoice => INVOICE_PREFIX,
    }
}

/// Format an allocated counter value, e.g. `INV-000042`.
pub fn format_document_number(prefix: &str, counter: i64) -> String {
    format!("{}-{:06}", prefix, counter)
}
