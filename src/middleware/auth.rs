use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    error::{ApiError, AuthError},
    models::auth::{AuthenticatedUser, Role},
    services::token::AccessTokenService,
    AppState,
};

/// Extracts the credential from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::AuthHeaderMissing)?;
    let value = value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
    value.strip_prefix("Bearer ").ok_or(AuthError::InvalidAuthHeader)
}

/// Validates the bearer token and requires `role`.
///
/// Any token problem, expiry included, is `InvalidToken`; a valid token of the
/// wrong role is `Forbidden`.
pub fn authorize(
    tokens: &AccessTokenService,
    headers: &HeaderMap,
    role: Role,
) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(headers)?;
    let claims = tokens
        .validate_access_token(token)
        .map_err(|_| AuthError::InvalidToken)?;
    if claims.role != role {
        tracing::debug!(sub = %claims.sub, role = %claims.role, required = %role, "role gate refused");
        return Err(AuthError::Forbidden);
    }
    Ok(claims.into())
}

async fn gate(state: AppState, role: Role, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let user = authorize(&state.tokens, request.headers(), role)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub async fn require_customer(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, ApiError> {
    gate(state, Role::Customer, request, next).await
}

pub async fn require_staff(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, ApiError> {
    gate(state, Role::Staff, request, next).await
}

/// Reads the subject a gate attached to the request.
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AuthError::AuthHeaderMissing.into())
    }
}

impl AuthenticatedUser {
    /// Users may only touch resources whose id is their own subject.
    pub fn require_subject(&self, expected: &str) -> Result<(), AuthError> {
        if self.user_id != expected {
            tracing::debug!(sub = %self.user_id, expected, "subject gate refused");
            return Err(AuthError::SubjectMismatch);
        }
        Ok(())
    }

    /// Staff may only touch resources of their own restaurant.
    pub fn require_tenant(&self, expected: &str) -> Result<(), AuthError> {
        if self.role != Role::Staff || self.tenant != expected {
            return Err(AuthError::SubjectMismatch);
        }
        Ok(())
    }
}
