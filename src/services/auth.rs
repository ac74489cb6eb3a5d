use std::sync::Arc;

use chrono::Duration;
use tracing::{error, info, warn};

use crate::{
    error::AuthError,
    models::{
        auth::{Role, TokenPair, UserKind, TOKEN_TYPE_BEARER},
        customer::{Customer, RegisterCustomerRequest},
        refresh::ClientInfo,
        restaurant::{RegisterRestaurantRequest, Restaurant, Staff},
    },
    services::{
        clock::Clock,
        customers::CustomerService,
        identity::IdentityError,
        refresh::{RefreshError, RefreshTokenService},
        restaurants::RestaurantService,
        token::{AccessTokenService, TokenError},
    },
};

pub const DEFAULT_ACCESS_TOKEN_EXPIRATION_SECONDS: i64 = 3600;
pub const DEFAULT_ROTATION_GRACE_SECONDS: i64 = 3;

#[derive(Debug, Clone, Copy)]
pub struct AuthSettings {
    /// Lifetime of access tokens issued on login and registration.
    pub access_token_ttl: i64,
    /// How long a rotated refresh token keeps working.
    pub rotation_grace: Duration,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            access_token_ttl: DEFAULT_ACCESS_TOKEN_EXPIRATION_SECONDS,
            rotation_grace: Duration::seconds(DEFAULT_ROTATION_GRACE_SECONDS),
        }
    }
}

/// What a caller presents to log in.
#[derive(Debug, Clone)]
pub enum Credentials {
    Customer { email: String, password: String },
    Staff { email: String, password: String, restaurant_id: String },
}

#[derive(Debug, Clone)]
pub struct RefreshTokenInput<'a> {
    pub access_token: &'a str,
    pub refresh_token: &'a str,
    pub expiration_seconds: i64,
    /// Kept for wire compatibility only; the refresh record decides the role.
    pub role_override: Option<Role>,
}

/// Login, registration bootstrap and token rotation.
pub struct AuthService {
    tokens: Arc<AccessTokenService>,
    refresh: RefreshTokenService,
    customers: Arc<CustomerService>,
    restaurants: Arc<RestaurantService>,
    clock: Arc<dyn Clock>,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(
        tokens: Arc<AccessTokenService>,
        refresh: RefreshTokenService,
        customers: Arc<CustomerService>,
        restaurants: Arc<RestaurantService>,
        clock: Arc<dyn Clock>,
        settings: AuthSettings,
    ) -> Self {
        Self { tokens, refresh, customers, restaurants, clock, settings }
    }

    pub fn settings(&self) -> AuthSettings {
        self.settings
    }

    /// Mints an access token and persists a refresh token for the same identity.
    pub async fn generate_token_pair(
        &self,
        user_id: &str,
        kind: &UserKind,
        expiration_seconds: i64,
        client: &ClientInfo,
    ) -> Result<TokenPair, AuthError> {
        let access_token = self.tokens.generate_token(user_id, kind, expiration_seconds)?;
        let refresh_token = self.refresh.generate(user_id, kind, client).await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: expiration_seconds,
            token_type: TOKEN_TYPE_BEARER.to_string(),
        })
    }

    pub async fn login(&self, credentials: Credentials, client: &ClientInfo) -> Result<TokenPair, AuthError> {
        let identity = match &credentials {
            Credentials::Customer { email, password } => self.customers.authenticate(email, password).await,
            Credentials::Staff { email, password, restaurant_id } => {
                self.restaurants.authenticate(restaurant_id, email, password).await
            }
        };
        let identity = identity.inspect_err(|e| {
            if matches!(e, IdentityError::InvalidCredentials) {
                info!(ip = %client.ip, "login rejected");
            }
        })?;

        let pair = self
            .generate_token_pair(&identity.user_id, &identity.kind, self.settings.access_token_ttl, client)
            .await?;
        info!(user_id = %identity.user_id, role = %identity.kind.role(), "login succeeded");
        Ok(pair)
    }

    /// Exchanges a usable refresh token (and the access token it was issued with) for a new pair.
    ///
    /// The old refresh token keeps working for the configured grace window.
    pub async fn refresh_token(
        &self,
        input: RefreshTokenInput<'_>,
        client: &ClientInfo,
    ) -> Result<TokenPair, AuthError> {
        let record = self.refresh.find_active_token(input.refresh_token).await?;

        let claims = self
            .tokens
            .get_claims(input.access_token)
            .map_err(|_| AuthError::TokenMismatch)?;
        if claims.sub != record.user_id || claims.role != record.role || claims.tenant != record.tenant_id {
            warn!(user_id = %record.user_id, "access token does not belong to refresh token");
            return Err(AuthError::TokenMismatch);
        }

        if input.role_override.is_some_and(|role| role != record.role) {
            warn!(user_id = %record.user_id, role = %record.role, "ignoring role override on rotation");
        }
        let kind = UserKind::from_parts(record.role, &record.tenant_id).ok_or_else(|| {
            anyhow::anyhow!("refresh record {} has role {} with tenant {:?}", record.id, record.role, record.tenant_id)
        })?;

        let access_token = self.tokens.generate_token(&record.user_id, &kind, input.expiration_seconds)?;
        let refresh_token = self.refresh.generate(&record.user_id, &kind, client).await?;

        let grace_deadline = self.clock.now() + self.settings.rotation_grace;
        match self.refresh.expire(input.refresh_token, grace_deadline).await {
            Ok(()) => {}
            Err(RefreshError::NotFound) => {
                info!(user_id = %record.user_id, "refresh token was already rotated");
            }
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %record.user_id, role = %record.role, "token pair rotated");
        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: input.expiration_seconds,
            token_type: TOKEN_TYPE_BEARER.to_string(),
        })
    }

    /// Creates a customer and opens their first session.
    ///
    /// If no session can be opened the customer is removed again.
    pub async fn register_customer(
        &self,
        body: RegisterCustomerRequest,
        client: &ClientInfo,
    ) -> Result<(Customer, TokenPair), AuthError> {
        let customer = self.customers.register(body).await?;

        match self
            .generate_token_pair(&customer.id, &UserKind::Customer, self.settings.access_token_ttl, client)
            .await
        {
            Ok(pair) => Ok((customer, pair)),
            Err(e) => {
                if let Err(purge) = self.customers.purge(&customer.id).await {
                    error!(
                        customer_id = %customer.id,
                        error = %purge,
                        "customer left behind after failed session bootstrap"
                    );
                }
                Err(e)
            }
        }
    }

    /// Creates a restaurant with its owner and opens the owner's first session.
    ///
    /// If no session can be opened the restaurant and owner are removed again.
    pub async fn register_restaurant(
        &self,
        body: RegisterRestaurantRequest,
        client: &ClientInfo,
    ) -> Result<(Restaurant, Staff, TokenPair), AuthError> {
        let (restaurant, owner) = self.restaurants.register(body).await?;
        let kind = UserKind::Staff { tenant: restaurant.id.clone() };

        match self
            .generate_token_pair(&owner.id, &kind, self.settings.access_token_ttl, client)
            .await
        {
            Ok(pair) => Ok((restaurant, owner, pair)),
            Err(e) => {
                if let Err(purge) = self.restaurants.purge(&restaurant.id).await {
                    error!(
                        restaurant_id = %restaurant.id,
                        staff_id = %owner.id,
                        error = %purge,
                        "restaurant left behind after failed session bootstrap"
                    );
                }
                Err(e)
            }
        }
    }

    pub async fn ping(&self) -> Result<(), AuthError> {
        self.refresh.ping().await.map_err(|e| AuthError::Internal(e.into()))
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken => AuthError::InvalidToken,
            other => AuthError::Internal(other.into()),
        }
    }
}

impl From<RefreshError> for AuthError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::NotFound => AuthError::InvalidRefreshToken,
            RefreshError::AlreadyExists => AuthError::RefreshTokenAlreadyExists,
            other => AuthError::Internal(other.into()),
        }
    }
}

impl From<IdentityError> for AuthError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::CustomerAlreadyExists => AuthError::CustomerAlreadyExists,
            IdentityError::StaffAlreadyExists => AuthError::StaffAlreadyExists,
            IdentityError::RestaurantAlreadyExists => AuthError::RestaurantAlreadyExists,
            IdentityError::CustomerNotFound => AuthError::CustomerNotFound,
            IdentityError::RestaurantNotFound => AuthError::RestaurantNotFound,
            IdentityError::InvalidCredentials => AuthError::InvalidCredentials,
            other => AuthError::Internal(other.into()),
        }
    }
}
