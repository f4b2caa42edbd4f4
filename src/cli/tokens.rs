//! Offline credential and token helpers (`hash`, `inspect`, `verify`).

use super::output::Output;
use crate::auth::{
    hasher::{CredentialHasher, HashingFailure},
    jwt::{Claims, Identity, TokenRejection, TokenService},
};
use chrono::{DateTime, Utc};

fn describe_timestamp(secs: i64) -> String {
    match DateTime::<Utc>::from_timestamp(secs, 0) {
        Some(at) => format!("{} ({})", secs, at.to_rfc3339()),
        None => secs.to_string(),
    }
}

/// `hash`: prints a fresh Argon2id PHC string for `password`.
///
/// Only the hash goes to stdout so the command can be used in pipelines.
pub fn hash_password(password: &str) -> Result<String, HashingFailure> {
    let hash = CredentialHasher::new().hash(password)?;
    println!("{}", hash);
    Ok(hash)
}

/// `inspect`: prints the claims without any signature or expiry check.
pub fn inspect_token(token: &str, output: &Output) -> Result<Claims, TokenRejection> {
    let claims = TokenService::extract_unverified(token)?;

    output.header("Token claims (UNVERIFIED)");
    output.kv("sub", &claims.sub);
    output.kv("email", &claims.email);
    output.kv("iat", &describe_timestamp(claims.iat));
    output.kv("exp", &describe_timestamp(claims.exp));
    output.warning("Signature and expiry were not checked; do not trust these values");

    Ok(claims)
}

/// `verify`: checks the token against the configured secret.
pub fn verify_token(
    tokens: &TokenService,
    token: &str,
    output: &Output,
) -> Result<Identity, TokenRejection> {
    match tokens.verify(token) {
        Ok(identity) => {
            output.success("Token is valid");
            output.kv("sub", identity.subject_id());
            output.kv("email", identity.email());
            output.kv("expires", &describe_timestamp(identity.expires_at()));
            Ok(identity)
        }
        Err(reason) => {
            output.error(&format!("Token rejected: {}", reason));
            Err(reason)
        }
    }
}
