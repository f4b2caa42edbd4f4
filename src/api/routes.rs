use super::handlers::{self, auth, users};
use crate::{
    auth::middleware::AuthorizationGuard,
    middleware::{
        handler,
        negotiation::RequestGate,
        validators::{CreateUserValidator, SignInValidator, UpdateUserValidator},
        Chain, Gate, MAX_BODY_BYTES,
    },
    AppState,
};
use axum::{
    extract::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

/// Every route chain, built once per router.
///
/// Exposed so the wiring (which gates guard which route, in what order) can
/// be inspected in tests.
pub struct RouteChains {
    pub list_users: Chain,
    pub get_user: Chain,
    pub create_user: Chain,
    pub update_user: Chain,
    pub delete_user: Chain,
    pub sign_in: Chain,
}

impl RouteChains {
    pub fn new(state: &AppState) -> Self {
        let request: Arc<dyn Gate> = Arc::new(RequestGate);
        let authorization: Arc<dyn Gate> =
            Arc::new(AuthorizationGuard::new(state.tokens.clone()));
        let create: Arc<dyn Gate> = Arc::new(CreateUserValidator::new(state.hasher.clone()));
        let update: Arc<dyn Gate> = Arc::new(UpdateUserValidator::new(state.hasher.clone()));
        let sign_in: Arc<dyn Gate> = Arc::new(SignInValidator::new(
            state.config.auth.signin_failure_status(),
        ));

        let protected = || vec![request.clone(), authorization.clone()];

        Self {
            list_users: Chain::new(protected(), handler(state.clone(), users::list_users)),
            get_user: Chain::new(protected(), handler(state.clone(), users::get_user)),
            create_user: Chain::new(
                vec![request.clone(), create],
                handler(state.clone(), users::create_user),
            ),
            update_user: Chain::new(
                vec![request.clone(), update, authorization.clone()],
                handler(state.clone(), users::update_user),
            ),
            delete_user: Chain::new(protected(), handler(state.clone(), users::delete_user)),
            sign_in: Chain::new(
                vec![request.clone(), sign_in],
                handler(state.clone(), auth::sign_in),
            ),
        }
    }
}

/// Builds the full application router.
///
/// | Route | Chain |
/// |---|---|
/// | `GET /api/v1/users` | request, authorization |
/// | `POST /api/v1/users` | request, create-user |
/// | `POST /api/v1/users/signin` | request, sign-in |
/// | `GET /api/v1/users/{id}` | request, authorization |
/// | `PUT /api/v1/users/{id}` | request, update-user, authorization |
/// | `DELETE /api/v1/users/{id}` | request, authorization |
///
/// On `PUT` the body validator runs before authorization, so a malformed
/// body is reported ahead of a missing token and a supplied password is
/// hashed even when the token is then refused.
pub fn create_router(state: AppState) -> Router {
    let RouteChains {
        list_users,
        get_user,
        create_user,
        update_user,
        delete_user,
        sign_in,
    } = RouteChains::new(&state);

    let api = Router::new()
        .route(
            "/users",
            get(move |req: Request| list_users.serve(req))
                .post(move |req: Request| create_user.serve(req)),
        )
        .route("/users/signin", post(move |req: Request| sign_in.serve(req)))
        .route(
            "/users/{id}",
            get(move |req: Request| get_user.serve(req))
                .put(move |req: Request| update_user.serve(req))
                .delete(move |req: Request| delete_user.serve(req)),
        );

    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/api/v1", api)
        .merge(docs_router())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

#[cfg(feature = "swagger-ui")]
fn docs_router() -> Router {
    use super::openapi::{ApiDoc, OPENAPI_JSON_PATH};
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    SwaggerUi::new("/swagger-ui")
        .url(OPENAPI_JSON_PATH, ApiDoc::openapi())
        .into()
}

#[cfg(not(feature = "swagger-ui"))]
fn docs_router() -> Router {
    use super::openapi::{ApiDoc, OPENAPI_JSON_PATH};
    use utoipa::OpenApi;

    Router::new().route(
        OPENAPI_JSON_PATH,
        get(|| async { axum::Json(ApiDoc::openapi()) }),
    )
}
