//! Credentials, tokens and the authorization gate
//!
//! This module provides the authentication infrastructure for the Warden API:
//! one-way credential hashing, HS256 bearer tokens and the gate that turns a
//! bearer token into a verified [`Identity`](crate::auth::jwt::Identity).
//!
//! # Module Structure
//!
//! - [`auth::hasher`](crate::auth::hasher) - Argon2id hashing and verification
//! - [`auth::jwt`](crate::auth::jwt) - token issuance, verification and claims
//! - [`auth::middleware`](crate::auth::middleware) - the authorization gate and ownership check
//!
//! # Security Features
//!
//! - **Password Hashing**: Argon2id (memory-hard), salted per call, PHC strings
//! - **Tokens**: HS256 with a one-hour default lifetime and no clock leeway
//! - **Uniform failures**: every token problem becomes the same 401 body
//!
//! # Usage
//!
//! ```ignore
//! use warden::auth::jwt::TokenService;
//!
//! let tokens = TokenService::new(&secret, 3600);
//! let token = tokens.issue(&user.id, &user.email)?;
//! let identity = tokens.verify(&token)?;
//! assert_eq!(identity.subject_id(), user.id);
//! ```
//!
//! # Configuration
//!
//! Configure via `warden.toml`:
//! ```toml
//! [auth]
//! jwt_secret_env = "JWT_SECRET"   # Name of the env var holding the secret
//! token_ttl_secs = 3600           # Token validity duration
//! ```

/// Argon2id credential hashing.
pub mod hasher;
/// Token generation, validation and verified identities.
pub mod jwt;
/// Authorization gate for protected routes.
pub mod middleware;

pub use hasher::CredentialHasher;
pub use jwt::{AccessScope, Claims, Identity, TokenService};
pub use middleware::{require_owner, AuthorizationGuard};
