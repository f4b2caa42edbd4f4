use super::{caller, target_id, validated_body};
use crate::{
    auth::{
        jwt::{AccessScope, Identity},
        middleware::require_owner,
    },
    middleware::PathParams,
    types::{ApiResponse, AppError, NewUser, PublicUser, Result, User, UserChanges},
    AppState,
};
use axum::{
    extract::Request,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Base path of the account collection.
pub const USERS_PATH: &str = "/api/v1/users";

const USER_NOT_FOUND: &str = "User does not exists";

fn not_found() -> AppError {
    AppError::NotFound(USER_NOT_FOUND.to_string())
}

/// List every account (public projection)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Accounts fetched", body = ApiResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 406, description = "Client does not accept JSON")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users(
    state: AppState,
    _request: Request,
    _params: PathParams,
    identity: Option<Identity>,
) -> Result<ApiResponse> {
    caller(identity)?;

    let users: Vec<PublicUser> = state
        .store
        .list_users()
        .await?
        .iter()
        .map(PublicUser::from)
        .collect();

    ApiResponse::ok("Successful fetch").with_data(&users)
}

/// Fetch one account
///
/// The owner gets the full record; anyone else gets the public projection.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account fetched", body = ApiResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such account")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user(
    state: AppState,
    _request: Request,
    params: PathParams,
    identity: Option<Identity>,
) -> Result<ApiResponse> {
    let identity = caller(identity)?;
    let id = target_id(&params)?;

    let user = state.store.get_user_by_id(&id).await?.ok_or_else(not_found)?;

    let response = ApiResponse::ok("Successful fetch");
    match identity.scope_for(&id) {
        AccessScope::Owner => response.with_data(&user),
        AccessScope::Other => response.with_data(&PublicUser::from(&user)),
    }
}

/// Create an account
///
/// Responds with the stored record, a token for the new account and a
/// `Location` header pointing at it.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = crate::types::CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse),
        (status = 400, description = "Invalid username, email, password or body"),
        (status = 409, description = "Email already registered"),
        (status = 415, description = "Body is not JSON")
    ),
    tag = "users"
)]
pub async fn create_user(
    state: AppState,
    request: Request,
    _params: PathParams,
    _identity: Option<Identity>,
) -> Result<Response> {
    let new_user: NewUser = validated_body(request).await?;
    let user: User = state.store.create_user(new_user).await?;
    let token = state.tokens.issue(&user.id, &user.email)?;

    tracing::info!(user_id = %user.id, "account created");

    let location = format!("{}/{}", USERS_PATH, user.id);
    let body = ApiResponse::created("Successful creation")
        .with_data(&user)?
        .with_token(token);

    Ok(([(header::LOCATION, location)], body).into_response())
}

/// Partially update the caller's own account
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "Account id")),
    request_body = crate::types::UpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = ApiResponse),
        (status = 400, description = "Invalid field or unknown key"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not the caller's account"),
        (status = 404, description = "No such account"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user(
    state: AppState,
    request: Request,
    params: PathParams,
    identity: Option<Identity>,
) -> Result<ApiResponse> {
    let identity = caller(identity)?;
    let id = target_id(&params)?;
    require_owner(&identity, &id)?;

    let changes: UserChanges = validated_body(request).await?;
    let user = state
        .store
        .update_user(&id, changes)
        .await?
        .ok_or_else(not_found)?;

    ApiResponse::ok("Successful update").with_data(&user)
}

/// Delete the caller's own account
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "Account id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not the caller's account"),
        (status = 404, description = "No such account")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_user(
    state: AppState,
    _request: Request,
    params: PathParams,
    identity: Option<Identity>,
) -> Result<StatusCode> {
    let identity = caller(identity)?;
    let id = target_id(&params)?;
    require_owner(&identity, &id)?;

    if !state.store.delete_user(&id).await? {
        return Err(not_found());
    }

    tracing::info!(user_id = %id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}
