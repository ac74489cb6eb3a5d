use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::{
    error::{ApiError, AuthError},
    models::{
        auth::{AuthenticatedUser, Role, TokenPair},
        customer::{CustomerChanges, CustomerProfile, LoginRequest, RefreshTokenRequest, RegisterCustomerRequest, UpdateCustomerRequest},
        refresh::ClientInfo,
    },
    services::auth::{Credentials, RefreshTokenInput},
    validation::ValidatedJson,
    AppState,
};

#[derive(Debug, Serialize)]
pub struct RegisteredCustomer {
    #[serde(flatten)]
    pub customer: CustomerProfile,
    pub auth: TokenPair,
}

pub async fn register(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(body): ValidatedJson<RegisterCustomerRequest>,
) -> Result<(StatusCode, Json<RegisteredCustomer>), ApiError> {
    let (customer, auth) = state.auth.register_customer(body, &client).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisteredCustomer { customer: customer.into(), auth }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let credentials = Credentials::Customer { email: body.email, password: body.password };
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
        role_override: Some(Role::Customer),
    };
    Ok(Json(state.auth.refresh_token(input, &client).await?))
}

pub async fn get_customer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(customer_id): Path<String>,
) -> Result<Json<CustomerProfile>, ApiError> {
    user.require_subject(&customer_id)?;
    let customer = state.customers.get(&customer_id).await.map_err(AuthError::from)?;
    Ok(Json(customer.into()))
}

pub async fn update_customer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(customer_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateCustomerRequest>,
) -> Result<Json<CustomerProfile>, ApiError> {
    user.require_subject(&customer_id)?;
    let customer = state
        .customers
        .update(&customer_id, &CustomerChanges::from(body))
        .await
        .map_err(AuthError::from)?;
    tracing::info!(customer_id = %customer.id, "customer profile updated");
    Ok(Json(customer.into()))
}
