use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::{
    error::{ApiError, AuthError},
    models::{
        auth::{AuthenticatedUser, TokenPair},
        refresh::ClientInfo,
        restaurant::{RegisterRestaurantRequest, Restaurant, StaffProfile},
    },
    validation::ValidatedJson,
    AppState,
};

#[derive(Debug, Serialize)]
pub struct RegisteredRestaurant {
    pub restaurant: Restaurant,
    pub staff_owner: StaffProfile,
    pub auth: TokenPair,
}

pub async fn register(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(body): ValidatedJson<RegisterRestaurantRequest>,
) -> Result<(StatusCode, Json<RegisteredRestaurant>), ApiError> {
    let (restaurant, owner, auth) = state.auth.register_restaurant(body, &client).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisteredRestaurant { restaurant, staff_owner: owner.into(), auth }),
    ))
}

pub async fn get_restaurant(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(restaurant_id): Path<String>,
) -> Result<Json<Restaurant>, ApiError> {
    user.require_tenant(&restaurant_id)?;
    let restaurant = state.restaurants.get(&restaurant_id).await.map_err(AuthError::from)?;
    Ok(Json(restaurant))
}
