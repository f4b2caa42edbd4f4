use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::LazyLock;

/// Stand-in credential checked when no account matches, so a miss costs the
/// same Argon2 work as a wrong password.
static PLACEHOLDER_HASH: LazyLock<String> = LazyLock::new(|| {
    CredentialHasher::default()
        .hash("warden-placeholder-credential")
        .unwrap_or_default()
});

/// Raised only when the hashing primitive itself fails.
#[derive(Debug, thiserror::Error)]
#[error("Failed to hash password: {0}")]
pub struct HashingFailure(String);

impl From<HashingFailure> for crate::types::AppError {
    fn from(e: HashingFailure) -> Self {
        crate::types::AppError::Internal(e.to_string())
    }
}

/// One-way credential hashing using Argon2id.
///
/// Hashes are PHC strings carrying their own salt and parameters, so
/// verification always runs under the parameters the hash was made with.
#[derive(Clone, Default)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes a plaintext secret with a freshly generated salt.
    pub fn hash(&self, secret: &str) -> Result<String, HashingFailure> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashingFailure(e.to_string()))
    }

    /// Checks `candidate` against a stored hash.
    ///
    /// The digest comparison inside argon2 is constant-time. A stored value
    /// that is not a valid PHC string simply fails to match.
    pub fn verify(&self, hash: &str, candidate: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "stored credential is not a valid PHC string");
                return false;
            }
        };

        self.argon2
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }

    /// Runs a full verification for an account that does not exist and
    /// always returns `false`.
    pub fn verify_absent(&self, candidate: &str) -> bool {
        let _ = self.verify(&PLACEHOLDER_HASH, candidate);
        false
    }
}
