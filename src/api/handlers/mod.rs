//! API request handlers.
//!
//! Handlers are the terminal stage of a gate chain: by the time one runs,
//! its body has been validated and rewritten, and on protected routes the
//! caller's identity has been verified.

/// Sign-in handler.
pub mod auth;
/// Account CRUD handlers.
pub mod users;

use crate::auth::jwt::Identity;
use crate::middleware::{read_json, PathParams};
use crate::types::{AppError, Result};
use axum::extract::Request;
use serde::de::DeserializeOwned;

/// Liveness probe
#[utoipa::path(
    get,
    path = "/ping",
    responses((status = 200, description = "Service is up", body = String)),
    tag = "health"
)]
pub async fn ping() -> &'static str {
    "alive"
}

/// The verified caller. Protected chains always run the authorization
/// gate, so a missing identity means the route was wired without it.
pub(crate) fn caller(identity: Option<Identity>) -> Result<Identity> {
    identity.ok_or_else(|| {
        tracing::error!("protected handler reached without a verified identity");
        AppError::invalid_token()
    })
}

/// The `{id}` path segment.
pub(crate) fn target_id(params: &PathParams) -> Result<String> {
    match params.get("id") {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(AppError::InvalidInput("Invalid target resource".to_string())),
    }
}

/// Decodes a body that a validator gate has already normalized.
pub(crate) async fn validated_body<T: DeserializeOwned>(request: Request) -> Result<T> {
    read_json(request.into_body())
        .await
        .map_err(|e| AppError::Internal(format!("Validated body could not be decoded: {}", e)))
}
