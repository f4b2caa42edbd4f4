use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

/// Default token lifetime: one hour.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Claims embedded in every token this service issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - the account id
    pub sub: String,
    pub email: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
}

/// A caller whose token passed signature and expiry checks.
///
/// Only [`TokenService::verify`] constructs one, so holding an `Identity`
/// means the claims were verified during the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    claims: Claims,
}

/// Relationship between the caller and the resource named in the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    /// The resource belongs to the caller.
    Owner,
    /// Someone else's resource.
    Other,
}

impl Identity {
    pub fn subject_id(&self) -> &str {
        &self.claims.sub
    }

    pub fn email(&self) -> &str {
        &self.claims.email
    }

    pub fn expires_at(&self) -> i64 {
        self.claims.exp
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Owner iff the subject id equals the path resource id exactly.
    pub fn scope_for(&self, resource_id: &str) -> AccessScope {
        if self.claims.sub == resource_id {
            AccessScope::Owner
        } else {
            AccessScope::Other
        }
    }
}

/// Raised only when the signing primitive itself fails.
#[derive(Debug, thiserror::Error)]
#[error("Failed to generate token: {0}")]
pub struct SigningFailure(#[from] jsonwebtoken::errors::Error);

impl From<SigningFailure> for crate::types::AppError {
    fn from(e: SigningFailure) -> Self {
        crate::types::AppError::Internal(e.to_string())
    }
}

/// Why a token was refused. Callers must not surface the variant to
/// clients; it exists for debug logging only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenRejection {
    #[error("token does not have three segments")]
    Malformed,
    #[error("signature does not match")]
    BadSignature,
    #[error("claims could not be decoded")]
    InvalidClaims,
    #[error("token has expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenRejection {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => TokenRejection::BadSignature,
            ErrorKind::ExpiredSignature => TokenRejection::Expired,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) => TokenRejection::Malformed,
            _ => TokenRejection::InvalidClaims,
        }
    }
}

/// Issues and verifies HS256 bearer tokens.
///
/// The signing secret is handed in at construction and never read from the
/// environment afterwards. The service is immutable, so one instance behind
/// an `Arc` serves every request concurrently.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a token service.
    ///
    /// # Arguments
    /// * `secret` - Symmetric signing secret
    /// * `ttl_secs` - Lifetime of issued tokens in seconds
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Issues a token for the account using the configured lifetime.
    pub fn issue(&self, subject_id: &str, email: &str) -> Result<String, SigningFailure> {
        self.issue_with_ttl(subject_id, email, self.ttl)
    }

    /// Issues a token whose expiration is `now + ttl`.
    pub fn issue_with_ttl(
        &self,
        subject_id: &str,
        email: &str,
        ttl: Duration,
    ) -> Result<String, SigningFailure> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Verifies signature and expiry against the current clock.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenRejection> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verifies signature and expiry as of `now` (seconds since epoch).
    ///
    /// The token is accepted only while `exp > now`; there is no leeway.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Identity, TokenRejection> {
        if token.split('.').count() != 3 {
            return Err(TokenRejection::Malformed);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_aud = false;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        if data.claims.exp <= now {
            return Err(TokenRejection::Expired);
        }

        Ok(Identity {
            claims: data.claims,
        })
    }

    /// Decodes the claims segment without checking the signature or expiry.
    ///
    /// The result is deliberately a bare [`Claims`], not an [`Identity`]: it
    /// can be displayed but cannot be handed to anything that authorizes.
    pub fn extract_unverified(token: &str) -> Result<Claims, TokenRejection> {
        if token.split('.').count() != 3 {
            return Err(TokenRejection::Malformed);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .map_err(TokenRejection::from)
    }
}
