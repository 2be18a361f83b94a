//! Sign-in, sign-out, and the route guard backed by the identity provider.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::user::User;
use crate::services::identity::Session;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub secret: String,
}

/// POST /api/v1/auth/sign-in
pub async fn handle_sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<Session>, AppError> {
    let session = state
        .services
        .identity
        .sign_in(&request.username, &request.secret)
        .await?;
    Ok(Json(session))
}

/// POST /api/v1/auth/sign-out
pub async fn handle_sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    state.services.identity.sign_out(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn handle_me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Route guard: resolves the bearer token through the identity provider and
/// stores the user as a request extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .map(str::to_string)
        .ok_or(AppError::Unauthorized)?;
    let user = state
        .services
        .identity
        .current_user(&token)
        .await?
        .ok_or(AppError::Unauthorized)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
