//! Identity middleware.
//!
//! Resolves the authenticated caller from request headers set by the
//! upstream auth layer after session verification. Absent or malformed
//! identity fails with `UNAUTHORIZED` before any role or ownership check
//! runs; role and ownership themselves are enforced by the engine's
//! authorization guard.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;
use uuid::Uuid;

use crate::engine::{Actor, Role};

const USER_ID_HEADER: &str = "X-User-Id";
const ROLE_HEADER: &str = "X-Actor-Role";
const BUSINESS_ID_HEADER: &str = "X-Business-Id";
const CLIENT_ID_HEADER: &str = "X-Client-Id";

fn header_uuid(parts: &Parts, name: &str) -> Result<Uuid, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing {} header", name)))?
        .parse()
        .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Invalid {} header", name)))
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_uuid(parts, USER_ID_HEADER)?;

        let role_str = parts
            .headers
            .get(ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!("Missing {} header", ROLE_HEADER))
            })?;

        let role = match role_str {
            "admin" => Role::Admin,
            "staff" => Role::Staff {
                business_id: header_uuid(parts, BUSINESS_ID_HEADER)?,
            },
            "client" => Role::Client {
                client_id: header_uuid(parts, CLIENT_ID_HEADER)?,
            },
            other => {
                return Err(AppError::Unauthorized(anyhow::anyhow!(
                    "Unknown actor role '{}'",
                    other
                )))
            }
        };

        let span = tracing::Span::current();
        span.record("user_id", user_id.to_string().as_str());
        span.record("actor_role", role_str);

        Ok(Actor { user_id, role })
    }
}
