use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= Roles =============

/// The two fixed account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    #[default]
    Basic,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Basic => "BASIC",
        }
    }

    /// Maps a client-supplied role onto a known role.
    ///
    /// Anything that is not exactly `"ADMIN"` or `"BASIC"` (including a
    /// missing value or a non-string) becomes [`Role::Basic`].
    pub fn normalize(raw: Option<&serde_json::Value>) -> Self {
        match raw.and_then(|v| v.as_str()) {
            Some("ADMIN") => Role::Admin,
            _ => Role::Basic,
        }
    }

    /// Parses a stored role, falling back to [`Role::Basic`].
    pub fn from_stored(raw: &str) -> Self {
        match raw {
            "ADMIN" => Role::Admin,
            _ => Role::Basic,
        }
    }
}

// ============= User Types =============

/// A full account record as stored. `password` holds the credential hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub created_at: i64,
    pub updated_at: i64,
}

/// An account record without the credential field, returned to non-owners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// ============= API Request Types =============

/// Account creation payload as sent by clients.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// `ADMIN` or `BASIC`; anything else is stored as `BASIC`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = String)]
    pub role: Option<serde_json::Value>,
}

/// Account creation payload after validation: the password is already hashed
/// and the role normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Sign-in payload.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Partial account update. Only the fields listed here are mutable; any
/// other key in the payload is rejected.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Validated partial update handed to the store. `password_hash` is never a
/// plaintext secret.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password_hash.is_none()
    }
}

// ============= Response Envelope =============

/// JSON envelope used for every response body the service writes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse {
    pub status: u16,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl ApiResponse {
    fn success(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            success: true,
            message: Some(message.into()),
            data: None,
            token: None,
        }
    }

    /// HTTP 200 envelope.
    pub fn ok(message: impl Into<String>) -> Self {
        Self::success(StatusCode::OK, message)
    }

    /// HTTP 201 envelope.
    pub fn created(message: impl Into<String>) -> Self {
        Self::success(StatusCode::CREATED, message)
    }

    /// Failure envelope for the given status.
    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            success: false,
            message: Some(message.into()),
            data: None,
            token: None,
        }
    }

    pub fn with_data<T: Serialize>(mut self, data: &T) -> Result<Self> {
        let value = serde_json::to_value(data)
            .map_err(|e| AppError::Internal(format!("Failed to serialize response: {}", e)))?;
        self.data = Some(value);
        Ok(self)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status_code(), axum::Json(self)).into_response()
    }
}

// ============= Error Types =============

/// Message returned for every authentication failure, whatever the cause.
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid user token";

/// Message returned for every sign-in failure, whatever the cause.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not acceptable: {0}")]
    NotAcceptable(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication error: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message written into the response envelope. Server-side failure
    /// details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::NotAcceptable(msg)
            | AppError::UnsupportedMediaType(msg)
            | AppError::InvalidInput(msg)
            | AppError::Unauthenticated(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Database(_) => "The server was unable to access its storage".to_string(),
            AppError::Internal(_) => "The server was unable to process the request".to_string(),
        }
    }

    /// Builds the uniform 401 used for every token failure.
    pub fn invalid_token() -> Self {
        AppError::Unauthenticated(INVALID_TOKEN_MESSAGE.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        ApiResponse::failure(status, self.public_message()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_normalization() {
        assert_eq!(Role::normalize(Some(&json!("ADMIN"))), Role::Admin);
        assert_eq!(Role::normalize(Some(&json!("BASIC"))), Role::Basic);
        assert_eq!(Role::normalize(Some(&json!("admin"))), Role::Basic);
        assert_eq!(Role::normalize(Some(&json!("SUPERUSER"))), Role::Basic);
        assert_eq!(Role::normalize(Some(&json!(7))), Role::Basic);
        assert_eq!(Role::normalize(None), Role::Basic);
    }

    #[test]
    fn test_role_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), json!("ADMIN"));
        assert_eq!(Role::from_stored("BASIC"), Role::Basic);
        assert_eq!(Role::from_stored("garbage"), Role::Basic);
    }

    #[test]
    fn test_public_user_drops_credential() {
        let user = User {
            id: "u-1".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "$argon2id$v=19$stub".to_string(),
            role: Role::Basic,
            created_at: 1,
            updated_at: 2,
        };

        let public = serde_json::to_value(PublicUser::from(&user)).unwrap();
        assert!(public.get("password").is_none());
        assert_eq!(public["email"], "ada@example.com");
    }

    #[test]
    fn test_update_request_rejects_unknown_fields() {
        let parsed: std::result::Result<UpdateUserRequest, _> =
            serde_json::from_value(json!({"username": "new", "role": "ADMIN"}));
        assert!(parsed.is_err(), "role is not a mutable field");

        let parsed: UpdateUserRequest =
            serde_json::from_value(json!({"email": null, "username": "new"})).unwrap();
        assert_eq!(parsed.username.as_deref(), Some("new"));
        assert!(parsed.email.is_none());
    }

    #[test]
    fn test_envelope_omits_empty_fields() {
        let body = serde_json::to_value(ApiResponse::failure(
            StatusCode::NOT_ACCEPTABLE,
            "Only JSON representations are supported",
        ))
        .unwrap();

        assert_eq!(
            body,
            json!({
                "status": 406,
                "success": false,
                "message": "Only JSON representations are supported"
            })
        );
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(AppError::invalid_token().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Database("disk on fire".into()).public_message(),
            "The server was unable to access its storage"
        );
    }
}
