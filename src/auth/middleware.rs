use crate::auth::jwt::{AccessScope, Identity, TokenService};
use crate::middleware::{Flow, Gate};
use crate::types::AppError;
use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{header, HeaderMap},
};
use std::sync::Arc;

/// Message returned when a caller touches someone else's account.
pub const NOT_OWNER_MESSAGE: &str = "Invalid operation for the existing user";

/// Gate that admits only callers presenting a valid bearer token.
///
/// On success the verified [`Identity`] is stored in the request extensions
/// for the handler. Every failure (missing header, wrong scheme, bad
/// signature, expired) gets the same 401 body.
#[derive(Debug, Clone)]
pub struct AuthorizationGuard {
    tokens: Arc<TokenService>,
}

impl AuthorizationGuard {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`.
///
/// The scheme is matched case-sensitively and must be followed by exactly
/// one space.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl Gate for AuthorizationGuard {
    fn name(&self) -> &'static str {
        "authorization"
    }

    async fn intercept(&self, mut request: Request) -> Flow {
        let Some(token) = bearer_token(request.headers()) else {
            tracing::debug!("missing or malformed bearer credentials");
            return Flow::reject(AppError::invalid_token());
        };

        match self.tokens.verify(token) {
            Ok(identity) => {
                request.extensions_mut().insert(identity);
                Flow::Forward(request)
            }
            Err(reason) => {
                tracing::debug!(%reason, "token rejected");
                Flow::reject(AppError::invalid_token())
            }
        }
    }
}

/// Fails with 403 unless `identity` owns `resource_id`.
pub fn require_owner(identity: &Identity, resource_id: &str) -> Result<(), AppError> {
    match identity.scope_for(resource_id) {
        AccessScope::Owner => Ok(()),
        AccessScope::Other => Err(AppError::Forbidden(NOT_OWNER_MESSAGE.to_string())),
    }
}
