//! # Warden - user management behind composable request gates
//!
//! A user-management HTTP service that authenticates clients with stateless
//! HS256 bearer tokens and runs every request through an ordered chain of
//! gates before it reaches business logic.
//!
//! ## Overview
//!
//! Warden can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `warden-server` binary
//! 2. **As a library** - Reuse the gates, token service and hasher in your
//!    own axum application
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden::{
//!     auth::{AuthorizationGuard, TokenService},
//!     middleware::{handler, negotiation::RequestGate, Chain},
//! };
//!
//! let tokens = Arc::new(TokenService::new(&secret, 3600));
//! let chain = Chain::new(
//!     vec![Arc::new(RequestGate), Arc::new(AuthorizationGuard::new(tokens))],
//!     handler(state, my_handler),
//! );
//! let app = axum::Router::new().route("/me", axum::routing::get(move |req| chain.serve(req)));
//! ```
//!
//! ## Request flow
//!
//! ```text
//! request -> RequestGate -> body validator -> AuthorizationGuard -> handler
//!               406/415         400/401             401/403
//! ```
//!
//! The first gate that rejects writes the response; nothing after it runs.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `local-db` | Local SQLite database (default) |
//! | `turso` | Remote Turso database |
//! | `swagger-ui` | Interactive API docs at `/swagger-ui` |
//!
//! ## Modules
//!
//! - [`api`] - REST handlers, route wiring, OpenAPI document
//! - [`auth`] - Credential hashing, tokens, the authorization gate
//! - [`cli`] - Command-line interface
//! - [`db`] - Account storage (SQLite, Turso)
//! - [`middleware`] - Gate trait, chain composition, body validators
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
#[allow(missing_docs)]
pub mod api;
/// Credential hashing, tokens and the authorization gate.
#[allow(missing_docs)]
pub mod auth;
/// Command-line interface.
pub mod cli;
/// Account storage (Turso/SQLite).
pub mod db;
/// Request gates and chain composition.
#[allow(missing_docs)]
pub mod middleware;
/// Core types (requests, responses, errors).
#[allow(missing_docs)]
pub mod types;
/// Configuration utilities (TOML).
#[allow(missing_docs)]
pub mod utils;

// Re-export commonly used types
pub use auth::{CredentialHasher, TokenService};
pub use db::{TursoClient, UserStore};
pub use types::{AppError, Result};
pub use utils::toml_config::WardenConfig;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML-based configuration, loaded once at startup
    pub config: Arc<WardenConfig>,
    /// Account storage
    pub store: Arc<dyn UserStore>,
    /// Token issuance and verification
    pub tokens: Arc<TokenService>,
    /// Credential hashing
    pub hasher: CredentialHasher,
}

impl AppState {
    /// Builds state from a loaded config, an open store and the signing secret.
    pub fn new(config: WardenConfig, store: Arc<dyn UserStore>, jwt_secret: &str) -> Self {
        let tokens = TokenService::new(jwt_secret, config.auth.token_ttl_secs);

        Self {
            config: Arc::new(config),
            store,
            tokens: Arc::new(tokens),
            hasher: CredentialHasher::new(),
        }
    }
}
