use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::models::Role;
use crate::services::AccessTokenClaims;
use crate::AppState;

/// Validate the bearer token and store its claims in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
        })?;

    let claims = state.auth.validate_token(token)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

fn claims_from(parts: &Parts) -> Result<AccessTokenClaims, AppError> {
    parts
        .extensions
        .get::<AccessTokenClaims>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authentication required")))
}

fn claims_with_role(parts: &Parts, role: Role) -> Result<AccessTokenClaims, AppError> {
    let claims = claims_from(parts)?;
    if claims.role != role {
        tracing::warn!(user_id = %claims.sub, role = %claims.role, required = %role, "Access denied");
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "This action requires the {} role",
            role
        )));
    }
    Ok(claims)
}

/// Any authenticated caller.
pub struct AnyRole(pub AccessTokenClaims);

/// Caller holding the `employee` role. Moderators are refused.
pub struct Employee(pub AccessTokenClaims);

/// Caller holding the `moderator` role.
pub struct Moderator(pub AccessTokenClaims);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AnyRole {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        claims_from(parts).map(AnyRole)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Employee {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        claims_with_role(parts, Role::Employee).map(Employee)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Moderator {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        claims_with_role(parts, Role::Moderator).map(Moderator)
    }
}
