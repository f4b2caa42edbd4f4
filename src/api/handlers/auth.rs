use super::validated_body;
use crate::{
    auth::jwt::Identity,
    middleware::PathParams,
    types::{ApiResponse, LoginRequest, Result, INVALID_CREDENTIALS_MESSAGE},
    AppState,
};
use axum::extract::Request;

/// Sign in with email and password
///
/// An unknown email and a wrong password get the same response.
#[utoipa::path(
    post,
    path = "/api/v1/users/signin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn sign_in(
    state: AppState,
    request: Request,
    _params: PathParams,
    _identity: Option<Identity>,
) -> Result<ApiResponse> {
    let payload: LoginRequest = validated_body(request).await?;
    let failure = || {
        ApiResponse::failure(
            state.config.auth.signin_failure_status(),
            INVALID_CREDENTIALS_MESSAGE,
        )
    };

    let Some(user) = state.store.get_user_by_email(&payload.email).await? else {
        state.hasher.verify_absent(&payload.password);
        tracing::debug!("sign-in for unknown email");
        return Ok(failure());
    };

    if !state.hasher.verify(&user.password, &payload.password) {
        tracing::debug!(user_id = %user.id, "sign-in with wrong password");
        return Ok(failure());
    }

    let token = state.tokens.issue(&user.id, &user.email)?;

    Ok(ApiResponse::ok("Successful login")
        .with_data(&user)?
        .with_token(token))
}
