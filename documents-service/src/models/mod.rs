//! Domain models for documents-service.

mod document;
mod line_item;
mod payment;
mod revision;
mod snapshot;

pub use document::{
    CreateDocument, Document, DocumentStatus, DocumentType, ListDocumentsFilter,
};
pub use line_item::{CreateLineItem, LineItem};
pub use payment::{CreatePayment, Payment};
pub use revision::Revision;
pub use snapshot::AcceptanceSnapshot;
