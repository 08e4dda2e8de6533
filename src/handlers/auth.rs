use axum::{Json, extract::State, http::StatusCode};

use crate::auth::{
    AuthResponse, AuthenticatedUser, ForgotPasswordPayload, LoginPayload, LoginResponse,
    MessageResponse, RefreshPayload, RefreshResponse, RegisterPayload, ResetPasswordPayload,
};
use crate::errors::AppError;
use crate::extractors::ValidatedJson;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterPayload>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let response = state.accounts.register(payload).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    Ok(Json(state.accounts.login(payload).await?))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshPayload>,
) -> Result<Json<RefreshResponse>, AppError> {
    Ok(Json(state.accounts.refresh(payload).await?))
}

/// Tokens are stateless, so logout is a client-side discard. The route still
/// demands a valid access token so broken clients surface early.
pub async fn logout(AuthenticatedUser(_user): AuthenticatedUser) -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordPayload>,
) -> Result<Json<MessageResponse>, AppError> {
    Ok(Json(state.accounts.forgot_password(payload).await?))
}

pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordPayload>,
) -> Result<Json<MessageResponse>, AppError> {
    Ok(Json(state.accounts.reset_password(payload).await?))
}
