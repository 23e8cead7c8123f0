//! Database service for documents-service.
//!
//! All lifecycle mutations run inside a transaction that takes a row lock
//! on the document (`SELECT ... FOR UPDATE`) and bumps its `version`
//! column, so two concurrent payments can never both pass the overpayment
//! check against a stale balance, and revision numbers are allocated
//! serially per document. Number allocation is a transactional
//! upsert-increment on the counters table.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Row, Transaction};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::engine;
use crate::models::{
    AcceptanceSnapshot, CreateDocument, CreateLineItem, CreatePayment, Document,
    DocumentStatus, LineItem, ListDocumentsFilter, Payment, Revision,
};

const DOCUMENT_COLUMNS: &str = "document_id, business_id, client_id, document_number, \
    document_type, status, vat_rate, markup_amount, discount_amount, deposit_amount, \
    subtotal, vat_amount, total, amount_paid, balance_due, is_locked, revision_count, \
    rejection_reason, accepted_by, rejected_by, acceptance_ip, acceptance_note, \
    sent_at, accepted_at, rejected_at, cancelled_at, version, created_utc, updated_utc";

const LINE_ITEM_COLUMNS: &str =
    "line_item_id, document_id, description, quantity, unit_price, line_total, sort_order, created_utc";

const PAYMENT_COLUMNS: &str = "payment_id, document_id, business_id, amount, method, \
    reference, paid_at, recorded_by, created_utc";

const REVISION_COLUMNS: &str = "revision_id, document_id, revision_number, parent_revision_id, \
    document_data, items_data, totals_data, change_reason, created_by, created_utc";

const SNAPSHOT_COLUMNS: &str = "snapshot_id, document_id, items_data, totals_data, \
    accepted_by, acceptance_ip, acceptance_note, created_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "documents-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Document Numbering
    // -------------------------------------------------------------------------

    /// Allocate the next document number for a business and document type.
    ///
    /// Atomic upsert-increment: concurrent creations for the same scope get
    /// distinct sequential counters, and counters are never reused.
    async fn next_document_number(
        tx: &mut Transaction<'_, Postgres>,
        business_id: Uuid,
        document_type: crate::models::DocumentType,
    ) -> Result<String, AppError> {
        let default_prefix = engine::numbering::default_prefix(document_type);

        let row = sqlx::query(
            r#"
            INSERT INTO document_counters (business_id, document_type, prefix, counter)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (business_id, document_type)
            DO UPDATE SET counter = document_counters.counter + 1
            RETURNING prefix, counter
            "#,
        )
        .bind(business_id)
        .bind(document_type.as_str())
        .bind(default_prefix)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to allocate document number: {}", e))
        })?;

        let prefix: String = row
            .try_get("prefix")
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Invalid counter row: {}", e)))?;
        let counter: i64 = row
            .try_get("counter")
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Invalid counter row: {}", e)))?;

        Ok(engine::numbering::format_document_number(&prefix, counter))
    }

    // -------------------------------------------------------------------------
    // Document Operations
    // -------------------------------------------------------------------------

    /// Create a draft document with its line items and an allocated number.
    #[instrument(skip(self, input, items), fields(business_id = %input.business_id))]
    pub async fn create_document(
        &self,
        input: &CreateDocument,
        items: &[CreateLineItem],
    ) -> Result<(Document, Vec<LineItem>), AppError> {
        let totals = engine::calculate_totals(
            items,
            input.vat_rate,
            input.markup_amount,
            input.discount_amount,
            input.deposit_amount,
            Decimal::ZERO,
        )?;

        let mut tx = self.begin().await?;

        let document_number =
            Self::next_document_number(&mut tx, input.business_id, input.document_type).await?;

        let document_id = Uuid::new_v4();
        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            INSERT INTO documents (
                document_id, business_id, client_id, document_number, document_type, status,
                vat_rate, markup_amount, discount_amount, deposit_amount,
                subtotal, vat_amount, total, amount_paid, balance_due
            )
            VALUES ($1, $2, $3, $4, $5, 'draft', $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(document_id)
        .bind(input.business_id)
        .bind(input.client_id)
        .bind(&document_number)
        .bind(input.document_type.as_str())
        .bind(input.vat_rate)
        .bind(input.markup_amount)
        .bind(input.discount_amount)
        .bind(input.deposit_amount)
        .bind(totals.subtotal)
        .bind(totals.vat_amount)
        .bind(totals.total)
        .bind(totals.amount_paid)
        .bind(totals.balance_due)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create document: {}", e)))?;

        let line_items = Self::insert_line_items(&mut tx, document_id, items).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        info!(
            document_id = %document.document_id,
            document_number = %document.document_number,
            "Draft document created"
        );

        Ok((document, line_items))
    }

    /// Get a document by ID.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub async fn get_document(&self, document_id: Uuid) -> Result<Option<Document>, AppError> {
        let document = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE document_id = $1"
        ))
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get document: {}", e)))?;

        Ok(document)
    }

    /// List documents matching a filter, keyset-paginated in creation order.
    /// The page token is the last document of the previous page; an unknown
    /// token yields an empty page.
    #[instrument(skip(self, filter))]
    pub async fn list_documents(
        &self,
        filter: &ListDocumentsFilter,
    ) -> Result<Vec<Document>, AppError> {
        let limit = filter.page_size.clamp(1, 100) as i64;
        let status_str = filter.status.map(|s| s.as_str().to_string());
        let type_str = filter.document_type.map(|t| t.as_str().to_string());

        let documents = sqlx::query_as::<_, Document>(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM documents
            WHERE ($1::uuid IS NULL OR business_id = $1)
              AND ($2::uuid IS NULL OR client_id = $2)
              AND ($3::varchar IS NULL OR document_type = $3)
              AND ($4::varchar IS NULL OR status = $4)
              AND ($5::uuid IS NULL OR (created_utc, document_id) >
                  (SELECT created_utc, document_id FROM documents WHERE document_id = $5))
            ORDER BY created_utc, document_id
            LIMIT $6
            "#
        ))
        .bind(filter.business_id)
        .bind(filter.client_id)
        .bind(&type_str)
        .bind(&status_str)
        .bind(filter.page_token)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list documents: {}", e)))?;

        Ok(documents)
    }

    /// Get line items for a document.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub async fn get_line_items(&self, document_id: Uuid) -> Result<Vec<LineItem>, AppError> {
        let line_items = sqlx::query_as::<_, LineItem>(&format!(
            r#"
            SELECT {LINE_ITEM_COLUMNS}
            FROM line_items
            WHERE document_id = $1
            ORDER BY sort_order, created_utc
            "#
        ))
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get line items: {}", e)))?;

        Ok(line_items)
    }

    /// Replace a document's line items and rate adjustments, recomputing all
    /// derived totals. Rejected unless the document is editable, or when the
    /// caller's expected version is stale.
    #[instrument(skip(self, items), fields(document_id = %document_id))]
    pub async fn replace_line_items(
        &self,
        document_id: Uuid,
        items: &[CreateLineItem],
        markup_amount: Option<Decimal>,
        discount_amount: Option<Decimal>,
        expected_version: Option<i32>,
    ) -> Result<(Document, Vec<LineItem>), AppError> {
        let mut tx = self.begin().await?;

        let document = Self::get_document_for_update(&mut tx, document_id).await?;
        engine::lifecycle::ensure_expected_version(&document, expected_version)?;
        engine::lifecycle::ensure_editable(&document)?;

        let markup = markup_amount.unwrap_or(document.markup_amount);
        let discount = discount_amount.unwrap_or(document.discount_amount);

        let payments = Self::get_payments_in_tx(&mut tx, document_id).await?;
        let amount_paid = engine::replay_amount_paid(&payments);

        let totals = engine::calculate_totals(
            items,
            document.vat_rate,
            markup,
            discount,
            document.deposit_amount,
            amount_paid,
        )?;

        sqlx::query("DELETE FROM line_items WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to clear line items: {}", e))
            })?;

        let line_items = Self::insert_line_items(&mut tx, document_id, items).await?;

        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET markup_amount = $2,
                discount_amount = $3,
                subtotal = $4,
                vat_amount = $5,
                total = $6,
                amount_paid = $7,
                balance_due = $8,
                version = version + 1,
                updated_utc = NOW()
            WHERE document_id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(document_id)
        .bind(markup)
        .bind(discount)
        .bind(totals.subtotal)
        .bind(totals.vat_amount)
        .bind(totals.total)
        .bind(totals.amount_paid)
        .bind(totals.balance_due)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update document: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        info!(document_id = %document.document_id, "Line items replaced");

        Ok((document, line_items))
    }

    // -------------------------------------------------------------------------
    // Lifecycle Transitions
    // -------------------------------------------------------------------------

    /// Mark a draft document as sent. `sent_at` is set exactly once.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub async fn send_document(&self, document_id: Uuid) -> Result<Document, AppError> {
        let mut tx = self.begin().await?;

        let document = Self::get_document_for_update(&mut tx, document_id).await?;
        engine::lifecycle::ensure_can_send(&document)?;

        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET status = 'sent',
                sent_at = COALESCE(sent_at, NOW()),
                version = version + 1,
                updated_utc = NOW()
            WHERE document_id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(document_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to send document: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        info!(
            document_id = %document.document_id,
            document_number = %document.document_number,
            "Document sent"
        );

        Ok(document)
    }

    /// Accept a quote: snapshot its terms, lock it, and stamp acceptance
    /// metadata. The snapshot is created exactly once per acceptance event.
    #[instrument(skip(self, acceptance_note), fields(document_id = %document_id))]
    pub async fn accept_quote(
        &self,
        document_id: Uuid,
        accepted_by: Uuid,
        acceptance_ip: Option<String>,
        acceptance_note: Option<String>,
    ) -> Result<(Document, AcceptanceSnapshot), AppError> {
        let mut tx = self.begin().await?;

        let document = Self::get_document_for_update(&mut tx, document_id).await?;
        engine::lifecycle::ensure_can_accept(&document)?;

        let line_items = Self::get_line_items_in_tx(&mut tx, document_id).await?;
        let items_data = serde_json::to_value(&line_items)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Snapshot serialization: {}", e)))?;
        let totals_data = Self::totals_json(&document);

        let snapshot = sqlx::query_as::<_, AcceptanceSnapshot>(&format!(
            r#"
            INSERT INTO acceptance_snapshots (
                snapshot_id, document_id, items_data, totals_data,
                accepted_by, acceptance_ip, acceptance_note
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SNAPSHOT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(document_id)
        .bind(&items_data)
        .bind(&totals_data)
        .bind(accepted_by)
        .bind(&acceptance_ip)
        .bind(&acceptance_note)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create acceptance snapshot: {}", e))
        })?;

        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET status = 'accepted',
                is_locked = TRUE,
                accepted_at = COALESCE(accepted_at, NOW()),
                accepted_by = $2,
                acceptance_ip = $3,
                acceptance_note = $4,
                version = version + 1,
                updated_utc = NOW()
            WHERE document_id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(document_id)
        .bind(accepted_by)
        .bind(&acceptance_ip)
        .bind(&acceptance_note)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to accept quote: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        info!(
            document_id = %document.document_id,
            document_number = %document.document_number,
            "Quote accepted and locked"
        );

        Ok((document, snapshot))
    }

    /// Reject a quote with a mandatory reason.
    #[instrument(skip(self, rejection_reason), fields(document_id = %document_id))]
    pub async fn reject_quote(
        &self,
        document_id: Uuid,
        rejected_by: Uuid,
        rejection_reason: &str,
    ) -> Result<Document, AppError> {
        let mut tx = self.begin().await?;

        let document = Self::get_document_for_update(&mut tx, document_id).await?;
        engine::lifecycle::ensure_can_reject(&document)?;

        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET status = 'rejected',
                rejected_at = COALESCE(rejected_at, NOW()),
                rejected_by = $2,
                rejection_reason = $3,
                version = version + 1,
                updated_utc = NOW()
            WHERE document_id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(document_id)
        .bind(rejected_by)
        .bind(rejection_reason)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to reject quote: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        info!(
            document_id = %document.document_id,
            document_number = %document.document_number,
            "Quote rejected"
        );

        Ok(document)
    }

    /// Cancel a document. Terminal: every later transition attempt fails.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub async fn cancel_document(&self, document_id: Uuid) -> Result<Document, AppError> {
        let mut tx = self.begin().await?;

        let document = Self::get_document_for_update(&mut tx, document_id).await?;
        engine::lifecycle::ensure_can_cancel(&document)?;

        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET status = 'cancelled',
                cancelled_at = COALESCE(cancelled_at, NOW()),
                version = version + 1,
                updated_utc = NOW()
            WHERE document_id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(document_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to cancel document: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        info!(
            document_id = %document.document_id,
            document_number = %document.document_number,
            "Document cancelled"
        );

        Ok(document)
    }

    // -------------------------------------------------------------------------
    // Revision Operations
    // -------------------------------------------------------------------------

    /// Snapshot a locked document into a new revision and unlock it.
    ///
    /// The revision number is `MAX(existing) + 1`, allocated under the same
    /// row lock as the document, so concurrent revision attempts serialize.
    #[instrument(skip(self, change_reason), fields(document_id = %document_id))]
    pub async fn create_revision(
        &self,
        document_id: Uuid,
        change_reason: &str,
        created_by: Uuid,
    ) -> Result<(Document, Revision), AppError> {
        let mut tx = self.begin().await?;

        let document = Self::get_document_for_update(&mut tx, document_id).await?;
        engine::lifecycle::ensure_can_revise(&document)?;

        let line_items = Self::get_line_items_in_tx(&mut tx, document_id).await?;

        let next_number: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(revision_number), 0) + 1 FROM revisions WHERE document_id = $1",
        )
        .bind(document_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to allocate revision number: {}", e))
        })?;

        let parent_revision_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT revision_id FROM revisions
            WHERE document_id = $1
            ORDER BY revision_number DESC
            LIMIT 1
            "#,
        )
        .bind(document_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to find parent revision: {}", e))
        })?;

        let document_data = serde_json::to_value(&document)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Revision serialization: {}", e)))?;
        let items_data = serde_json::to_value(&line_items)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Revision serialization: {}", e)))?;
        let totals_data = Self::totals_json(&document);

        let revision = sqlx::query_as::<_, Revision>(&format!(
            r#"
            INSERT INTO revisions (
                revision_id, document_id, revision_number, parent_revision_id,
                document_data, items_data, totals_data, change_reason, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {REVISION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(document_id)
        .bind(next_number)
        .bind(parent_revision_id)
        .bind(&document_data)
        .bind(&items_data)
        .bind(&totals_data)
        .bind(change_reason)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create revision: {}", e)))?;

        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET is_locked = FALSE,
                revision_count = $2,
                version = version + 1,
                updated_utc = NOW()
            WHERE document_id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(document_id)
        .bind(next_number)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to unlock document: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        info!(
            document_id = %document.document_id,
            revision_number = revision.revision_number,
            "Revision created, document unlocked"
        );

        Ok((document, revision))
    }

    /// List revisions for a document, oldest first.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub async fn list_revisions(&self, document_id: Uuid) -> Result<Vec<Revision>, AppError> {
        let revisions = sqlx::query_as::<_, Revision>(&format!(
            r#"
            SELECT {REVISION_COLUMNS}
            FROM revisions
            WHERE document_id = $1
            ORDER BY revision_number
            "#
        ))
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list revisions: {}", e)))?;

        Ok(revisions)
    }

    // -------------------------------------------------------------------------
    // Payment Operations
    // -------------------------------------------------------------------------

    /// Record a payment against an invoice.
    ///
    /// Validation and totals derivation run inside the document row lock:
    /// the ledger replays the full payment history, the overpayment check is
    /// strict, and the payment record plus updated totals commit atomically.
    #[instrument(skip(self, input), fields(document_id = %input.document_id))]
    pub async fn record_payment(
        &self,
        input: &CreatePayment,
    ) -> Result<(Document, Payment), AppError> {
        let mut tx = self.begin().await?;

        let document = Self::get_document_for_update(&mut tx, input.document_id).await?;
        let existing = Self::get_payments_in_tx(&mut tx, input.document_id).await?;

        let outcome = engine::apply_payment(&document, &existing, input.amount)?;

        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (
                payment_id, document_id, business_id, amount, method,
                reference, paid_at, recorded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.document_id)
        .bind(document.business_id)
        .bind(input.amount)
        .bind(&input.method)
        .bind(&input.reference)
        .bind(input.paid_at)
        .bind(input.recorded_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to record payment: {}", e)))?;

        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET amount_paid = $2,
                balance_due = $3,
                status = $4,
                version = version + 1,
                updated_utc = NOW()
            WHERE document_id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(input.document_id)
        .bind(outcome.amount_paid)
        .bind(outcome.balance_due)
        .bind(outcome.status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update document totals: {}", e))
        })?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        info!(
            payment_id = %payment.payment_id,
            document_id = %document.document_id,
            amount = %payment.amount,
            status = %document.status,
            "Payment recorded"
        );

        Ok((document, payment))
    }

    /// Get payments for a document, oldest first.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub async fn get_payments(&self, document_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE document_id = $1
            ORDER BY created_utc
            "#
        ))
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get payments: {}", e)))?;

        Ok(payments)
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    async fn begin(&self) -> Result<Transaction<'_, Postgres>, AppError> {
        self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })
    }

    /// Fetch a document under a row lock. Concurrent mutations on the same
    /// document serialize on this lock.
    async fn get_document_for_update(
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<Document, AppError> {
        sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE document_id = $1 FOR UPDATE"
        ))
        .bind(document_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to lock document: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))
    }

    async fn get_line_items_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<Vec<LineItem>, AppError> {
        sqlx::query_as::<_, LineItem>(&format!(
            r#"
            SELECT {LINE_ITEM_COLUMNS}
            FROM line_items
            WHERE document_id = $1
            ORDER BY sort_order, created_utc
            "#
        ))
        .bind(document_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get line items: {}", e)))
    }

    async fn get_payments_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<Vec<Payment>, AppError> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE document_id = $1
            ORDER BY created_utc
            "#
        ))
        .bind(document_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get payments: {}", e)))
    }

    async fn insert_line_items(
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
        items: &[CreateLineItem],
    ) -> Result<Vec<LineItem>, AppError> {
        let mut inserted = Vec::with_capacity(items.len());
        for item in items {
            let line_total = engine::line_total(item.quantity, item.unit_price);
            let line_item = sqlx::query_as::<_, LineItem>(&format!(
                r#"
                INSERT INTO line_items (
                    line_item_id, document_id, description, quantity, unit_price,
                    line_total, sort_order
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {LINE_ITEM_COLUMNS}
                "#
            ))
            .bind(Uuid::new_v4())
            .bind(document_id)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(line_total)
            .bind(item.sort_order)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert line item: {}", e))
            })?;
            inserted.push(line_item);
        }
        Ok(inserted)
    }

    /// Totals JSON stored in snapshots and revisions.
    fn totals_json(document: &Document) -> serde_json::Value {
        serde_json::json!({
            "subtotal": document.subtotal,
            "markup_amount": document.markup_amount,
            "discount_amount": document.discount_amount,
            "deposit_amount": document.deposit_amount,
            "vat_rate": document.vat_rate,
            "vat_amount": document.vat_amount,
            "total": document.total,
            "amount_paid": document.amount_paid,
            "balance_due": document.balance_due,
        })
    }
}

/// Default payment date when the request omits one.
pub fn default_paid_at(supplied: Option<NaiveDate>) -> NaiveDate {
    supplied.unwrap_or_else(|| chrono::Utc::now().date_naive())
}

/// Parse an optional status filter string, rejecting unknown values rather
/// than silently defaulting.
pub fn parse_status_filter(s: &str) -> Result<DocumentStatus, AppError> {
    let status = DocumentStatus::from_string(s);
    if status.as_str() != s {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Unknown status filter '{}'",
            s
        )));
    }
    Ok(status)
}
