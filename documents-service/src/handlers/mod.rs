//! HTTP handlers for documents-service.
//!
//! Handlers stay thin: resolve the actor, run the authorization guard,
//! delegate to the database service (which applies the engine's state and
//! money rules inside a transaction), and shape the response.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub mod documents;
pub mod payments;
pub mod revisions;

use anyhow::anyhow;
use service_core::error::AppError;

use crate::engine::{Actor, Role};
use crate::models::Document;
use crate::AppState;

/// Liveness probe. Reports unavailable when the database cannot be reached.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "documents-service",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed - database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "service": "documents-service",
                    "version": env!("CARGO_PKG_VERSION")
                })),
            )
        }
    }
}

/// Read access: admin, staff of the issuing business, or the document's
/// client.
pub(crate) fn ensure_can_view(actor: &Actor, document: &Document) -> Result<(), AppError> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Staff { business_id } if business_id == document.business_id => Ok(()),
        Role::Client { client_id } if client_id == document.client_id => Ok(()),
        _ => Err(AppError::Forbidden(anyhow!(
            "Not permitted to view this document"
        ))),
    }
}
