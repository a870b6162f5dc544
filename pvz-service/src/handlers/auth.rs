use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::dtos::auth::{DummyLoginRequest, LoginRequest, RegisterRequest, TokenResponse};
use crate::utils::{Password, ValidatedJson};
use crate::AppState;

/// Issue a token for a synthetic user with the requested role.
pub async fn dummy_login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DummyLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = state.auth.dummy_login(&req.role)?;
    Ok(Json(TokenResponse { token }))
}

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .auth
        .register(&req.email, Password::new(req.password), &req.role)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = state
        .auth
        .login(&req.email, Password::new(req.password))
        .await?;
    Ok(Json(TokenResponse { token }))
}
