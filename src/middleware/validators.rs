//! Operation-specific body validators.
//!
//! Each validator buffers the JSON body, decodes it into a typed request,
//! checks the fields in a fixed order and, on success, replaces the body
//! with the normalized form the handler expects. Plaintext passwords never
//! travel past these gates: create and update swap them for a hash.

use super::{read_json, with_json_body, Flow, Gate};
use crate::auth::hasher::CredentialHasher;
use crate::types::{
    ApiResponse, AppError, CreateUserRequest, LoginRequest, NewUser, Result, Role,
    UpdateUserRequest, UserChanges, INVALID_CREDENTIALS_MESSAGE,
};
use async_trait::async_trait;
use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};

pub const INVALID_USERNAME: &str = "Invalid Username";
pub const INVALID_EMAIL: &str = "Invalid Email";
pub const INVALID_PASSWORD: &str = "Invalid Password";
pub const INVALID_BODY: &str = "Invalid Request Body";
pub const NOTHING_TO_UPDATE: &str = "No updatable fields supplied";

/// Shortest acceptable password, in characters.
pub const MIN_PASSWORD_CHARS: usize = 8;

fn invalid(message: &str) -> AppError {
    AppError::InvalidInput(message.to_string())
}

fn check_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(invalid(INVALID_USERNAME));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(invalid(INVALID_EMAIL));
    }
    Ok(())
}

fn check_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(invalid(INVALID_PASSWORD));
    }
    Ok(())
}

/// Decodes the body as `T`, runs `validate` and forwards the request with the
/// validated value as its new body. Decoding failures become `on_decode_error`.
async fn rewrite_body<T, U, E, V>(request: Request, on_decode_error: E, validate: V) -> Flow
where
    T: DeserializeOwned,
    U: Serialize,
    E: FnOnce() -> Response,
    V: FnOnce(T) -> std::result::Result<U, Response>,
{
    let (parts, body) = request.into_parts();

    let payload = match read_json::<T>(body).await {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(error = %e, "request body rejected");
            return Flow::Reject(on_decode_error());
        }
    };

    let normalized = match validate(payload) {
        Ok(normalized) => normalized,
        Err(response) => return Flow::Reject(response),
    };

    match with_json_body(parts, &normalized) {
        Ok(request) => Flow::Forward(request),
        Err(e) => Flow::reject(AppError::Internal(format!(
            "Failed to re-encode request body: {}",
            e
        ))),
    }
}

// ============= Account creation =============

/// Validates `POST /users` bodies and hashes the password.
///
/// Checks run in the order username, email, password and stop at the first
/// failure. The forwarded body is a [`NewUser`].
#[derive(Clone, Default)]
pub struct CreateUserValidator {
    hasher: CredentialHasher,
}

impl CreateUserValidator {
    pub fn new(hasher: CredentialHasher) -> Self {
        Self { hasher }
    }

    /// Field checks and normalization, independent of HTTP.
    pub fn validate(&self, payload: CreateUserRequest) -> Result<NewUser> {
        check_username(&payload.username)?;
        check_email(&payload.email)?;
        check_password(&payload.password)?;

        Ok(NewUser {
            password_hash: self.hasher.hash(&payload.password)?,
            role: Role::normalize(payload.role.as_ref()),
            username: payload.username,
            email: payload.email,
        })
    }
}

#[async_trait]
impl Gate for CreateUserValidator {
    fn name(&self) -> &'static str {
        "create-user"
    }

    async fn intercept(&self, request: Request) -> Flow {
        rewrite_body(
            request,
            || invalid(INVALID_BODY).into_response(),
            |payload: CreateUserRequest| self.validate(payload).map_err(IntoResponse::into_response),
        )
        .await
    }
}

// ============= Sign-in =============

/// Validates `POST /users/signin` bodies.
///
/// Every failure, including a body that is not JSON, produces the same
/// "Invalid credentials" message so the response reveals nothing about
/// which field was wrong. The status is configurable (401 or 400).
#[derive(Debug, Clone, Copy)]
pub struct SignInValidator {
    failure_status: StatusCode,
}

impl Default for SignInValidator {
    fn default() -> Self {
        Self {
            failure_status: StatusCode::UNAUTHORIZED,
        }
    }
}

impl SignInValidator {
    pub fn new(failure_status: StatusCode) -> Self {
        Self { failure_status }
    }

    pub fn failure_status(&self) -> StatusCode {
        self.failure_status
    }

    /// Whether a sign-in payload is well-formed enough to attempt.
    pub fn is_well_formed(payload: &LoginRequest) -> bool {
        !payload.email.is_empty() && payload.password.chars().count() >= MIN_PASSWORD_CHARS
    }

    fn failure(&self) -> Response {
        ApiResponse::failure(self.failure_status, INVALID_CREDENTIALS_MESSAGE).into_response()
    }
}

#[async_trait]
impl Gate for SignInValidator {
    fn name(&self) -> &'static str {
        "sign-in"
    }

    async fn intercept(&self, request: Request) -> Flow {
        rewrite_body(
            request,
            || self.failure(),
            |payload: LoginRequest| {
                if Self::is_well_formed(&payload) {
                    Ok(payload)
                } else {
                    Err(self.failure())
                }
            },
        )
        .await
    }
}

// ============= Partial update =============

/// Validates `PUT /users/{id}` bodies.
///
/// Only `username`, `email` and `password` may appear; any other key is an
/// invalid body. Present fields get the same checks as account creation, a
/// present password is hashed, and the forwarded body is a [`UserChanges`].
#[derive(Clone, Default)]
pub struct UpdateUserValidator {
    hasher: CredentialHasher,
}

impl UpdateUserValidator {
    pub fn new(hasher: CredentialHasher) -> Self {
        Self { hasher }
    }

    pub fn validate(&self, payload: UpdateUserRequest) -> Result<UserChanges> {
        if let Some(username) = &payload.username {
            check_username(username)?;
        }
        if let Some(email) = &payload.email {
            check_email(email)?;
        }
        if let Some(password) = &payload.password {
            check_password(password)?;
        }

        let password_hash = match &payload.password {
            Some(password) => Some(self.hasher.hash(password)?),
            None => None,
        };

        let changes = UserChanges {
            username: payload.username,
            email: payload.email,
            password_hash,
        };

        if changes.is_empty() {
            return Err(invalid(NOTHING_TO_UPDATE));
        }
        Ok(changes)
    }
}

#[async_trait]
impl Gate for UpdateUserValidator {
    fn name(&self) -> &'static str {
        "update-user"
    }

    async fn intercept(&self, request: Request) -> Flow {
        rewrite_body(
            request,
            || invalid(INVALID_BODY).into_response(),
            |payload: UpdateUserRequest| self.validate(payload).map_err(IntoResponse::into_response),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header};
    use rstest::rstest;
    use serde_json::json;

    fn json_request(body: impl Into<Body>) -> Request {
        Request::builder()
            .method("POST")
            .uri("/api/v1/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn run(gate: &dyn Gate, body: impl Into<Body>) -> Flow {
        gate.intercept(json_request(body)).await
    }

    async fn rejection(flow: Flow) -> (StatusCode, String) {
        let response: Response = match flow {
            Flow::Reject(response) => response,
            Flow::Forward(_) => panic!("expected the gate to reject"),
        };
        let status = response.status();
        let body: ApiResponse = read_json(response.into_body()).await.unwrap();
        (status, body.message.unwrap_or_default())
    }

    async fn forwarded<T: serde::de::DeserializeOwned>(flow: Flow) -> T {
        match flow {
            Flow::Forward(request) => read_json(request.into_body()).await.unwrap(),
            Flow::Reject(response) => panic!("unexpected rejection: {}", response.status()),
        }
    }

    #[rstest]
    #[case(json!({"username": "", "email": "a@b.com", "password": "12345678"}), INVALID_USERNAME)]
    #[case(json!({"email": "a@b.com", "password": "12345678"}), INVALID_USERNAME)]
    #[case(json!({"username": "ada", "email": "", "password": "12345678"}), INVALID_EMAIL)]
    #[case(json!({"username": "ada", "email": "a@b.com", "password": "1234567"}), INVALID_PASSWORD)]
    #[case(json!({"username": "", "email": "", "password": ""}), INVALID_USERNAME)]
    #[case(json!({"username": "ada", "email": "", "password": ""}), INVALID_EMAIL)]
    #[tokio::test]
    async fn test_create_rejects_in_field_order(
        #[case] body: serde_json::Value,
        #[case] message: &str,
    ) {
        let gate = CreateUserValidator::default();
        let flow = run(&gate, body.to_string()).await;

        assert_eq!(rejection(flow).await, (StatusCode::BAD_REQUEST, message.to_string()));
    }

    #[tokio::test]
    async fn test_create_rejects_non_json() {
        let gate = CreateUserValidator::default();
        let flow = run(&gate, "username=ada").await;

        assert_eq!(
            rejection(flow).await,
            (StatusCode::BAD_REQUEST, INVALID_BODY.to_string())
        );
    }

    #[tokio::test]
    async fn test_create_hashes_password_and_normalizes_role() {
        let hasher = CredentialHasher::new();
        let gate = CreateUserValidator::new(hasher.clone());
        let body = json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": "analytical",
            "role": "SUPERUSER"
        });

        let new_user: NewUser = forwarded(run(&gate, body.to_string()).await).await;

        assert_eq!(new_user.username, "ada");
        assert_eq!(new_user.role, Role::Basic);
        assert_ne!(new_user.password_hash, "analytical");
        assert!(hasher.verify(&new_user.password_hash, "analytical"));
    }

    #[tokio::test]
    async fn test_create_keeps_admin_role() {
        let gate = CreateUserValidator::default();
        let body = json!({
            "username": "root",
            "email": "root@example.com",
            "password": "12345678",
            "role": "ADMIN"
        });

        let new_user: NewUser = forwarded(run(&gate, body.to_string()).await).await;
        assert_eq!(new_user.role, Role::Admin);
    }

    #[rstest]
    #[case(StatusCode::UNAUTHORIZED, json!({"email": "a@b.com", "password": ""}).to_string())]
    #[case(StatusCode::UNAUTHORIZED, json!({"email": "", "password": "12345678"}).to_string())]
    #[case(StatusCode::UNAUTHORIZED, "definitely not json".to_string())]
    #[case(StatusCode::BAD_REQUEST, json!({"email": "a@b.com", "password": "short"}).to_string())]
    #[tokio::test]
    async fn test_sign_in_failures_are_generic(#[case] status: StatusCode, #[case] body: String) {
        let gate = SignInValidator::new(status);
        let flow = run(&gate, body).await;

        assert_eq!(
            rejection(flow).await,
            (status, INVALID_CREDENTIALS_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn test_sign_in_forwards_credentials_untouched() {
        let gate = SignInValidator::default();
        assert_eq!(gate.failure_status(), StatusCode::UNAUTHORIZED);

        let body = json!({"email": "a@b.com", "password": "12345678"});
        let login: LoginRequest = forwarded(run(&gate, body.to_string()).await).await;

        assert_eq!(login.email, "a@b.com");
        assert_eq!(login.password, "12345678");
    }

    #[rstest]
    #[case(json!({"role": "ADMIN"}), INVALID_BODY)]
    #[case(json!({"username": "new", "id": "other"}), INVALID_BODY)]
    #[case(json!({}), NOTHING_TO_UPDATE)]
    #[case(json!({"username": null}), NOTHING_TO_UPDATE)]
    #[case(json!({"username": ""}), INVALID_USERNAME)]
    #[case(json!({"email": "", "password": "x"}), INVALID_EMAIL)]
    #[case(json!({"password": "short"}), INVALID_PASSWORD)]
    #[tokio::test]
    async fn test_update_rejections(#[case] body: serde_json::Value, #[case] message: &str) {
        let gate = UpdateUserValidator::default();
        let flow = run(&gate, body.to_string()).await;

        assert_eq!(rejection(flow).await, (StatusCode::BAD_REQUEST, message.to_string()));
    }

    #[tokio::test]
    async fn test_update_hashes_new_password() {
        let hasher = CredentialHasher::new();
        let gate = UpdateUserValidator::new(hasher.clone());
        let body = json!({"email": "new@example.com", "password": "a-new-secret"});

        let changes: UserChanges = forwarded(run(&gate, body.to_string()).await).await;

        assert_eq!(changes.email.as_deref(), Some("new@example.com"));
        assert!(changes.username.is_none());
        let hash = changes.password_hash.expect("password should be hashed");
        assert!(hasher.verify(&hash, "a-new-secret"));
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert!(check_password("ééééééé").is_err());
        assert!(check_password("éééééééé").is_ok());
    }
}
