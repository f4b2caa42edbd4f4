//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for Warden, built on the Axum web
//! framework. Each route is served by a [`Chain`](crate::middleware::Chain)
//! of gates in front of a handler.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Terminal handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Chain wiring and router configuration
//! - [`api::openapi`](crate::api::openapi) - OpenAPI document
//!
//! # API Endpoints
//!
//! ## Accounts (`/api/v1/users`)
//! - `GET /api/v1/users` - List accounts (public projection)
//! - `POST /api/v1/users` - Create an account, returns a token
//! - `GET /api/v1/users/{id}` - Fetch an account (full record for its owner)
//! - `PUT /api/v1/users/{id}` - Partially update your own account
//! - `DELETE /api/v1/users/{id}` - Delete your own account
//!
//! ## Authentication
//! - `POST /api/v1/users/signin` - Exchange email and password for a token
//!
//! ## Health
//! - `GET /ping` - Liveness probe, answers `alive`
//!
//! # Authentication
//!
//! Protected endpoints require a valid token in the `Authorization` header:
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! # OpenAPI Documentation
//!
//! The document is served at `/api-docs/openapi.json`. When the `swagger-ui`
//! feature is enabled, interactive documentation is available at
//! `/swagger-ui/`.

/// Request handlers for all API endpoints.
pub mod handlers;
/// OpenAPI document.
pub mod openapi;
/// Router configuration and route definitions.
pub mod routes;
