//! OpenAPI document for the HTTP API.
//!
//! Served as JSON at `/api-docs/openapi.json`; with the `swagger-ui`
//! feature the interactive UI is mounted at `/swagger-ui`.

use crate::types::{
    ApiResponse, CreateUserRequest, LoginRequest, PublicUser, Role, UpdateUserRequest, User,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

/// Path of the generated document.
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Warden API",
        description = "User management with stateless bearer-token authentication"
    ),
    paths(
        crate::api::handlers::ping,
        crate::api::handlers::auth::sign_in,
        crate::api::handlers::users::list_users,
        crate::api::handlers::users::get_user,
        crate::api::handlers::users::create_user,
        crate::api::handlers::users::update_user,
        crate::api::handlers::users::delete_user,
    ),
    components(schemas(
        ApiResponse,
        CreateUserRequest,
        LoginRequest,
        UpdateUserRequest,
        User,
        PublicUser,
        Role,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Sign-in"),
        (name = "users", description = "Account management")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
