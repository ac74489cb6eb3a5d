use axum::{extract::State, Json};

use crate::{
    error::ApiError,
    models::{
        auth::{Role, TokenPair},
        customer::RefreshTokenRequest,
        refresh::ClientInfo,
        restaurant::StaffLoginRequest,
    },
    services::auth::{Credentials, RefreshTokenInput},
    validation::ValidatedJson,
    AppState,
};

pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(body): ValidatedJson<StaffLoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let credentials = Credentials::Staff {
        email: body.email,
        password: body.password,
        restaurant_id: body.restaurant_id,
    };
    Ok(Json(state.auth.login(credentials, &client).await?))
}

pub async fn refresh(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(body): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let input = RefreshTokenInput {
        access_token: &body.access_token,
        refresh_token: &body.refresh_token,
        expiration_seconds: state.auth.settings().access_token_ttl,
        role_override: Some(Role::Staff),
    };
    Ok(Json(state.auth.refresh_token(input, &client).await?))
}
