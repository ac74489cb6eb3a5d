pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod validation;

use std::sync::Arc;

use chrono::Duration;
use sqlx::PgPool;

use config::Config;
use db::{
    customers::{CustomerRepository, PgCustomerRepository},
    memory::{MemoryCustomerRepository, MemoryRefreshStore, MemoryRestaurantRepository},
    refresh::{PgRefreshStore, RefreshStore},
    restaurants::{PgRestaurantRepository, RestaurantRepository},
};
use services::{
    auth::{AuthService, AuthSettings},
    clock::Clock,
    customers::CustomerService,
    password::PasswordHasher,
    refresh::RefreshTokenService,
    restaurants::RestaurantService,
    secret::StaticSecret,
    token::AccessTokenService,
};

/// Persistence backends behind the services.
#[derive(Clone)]
pub struct Stores {
    pub refresh: Arc<dyn RefreshStore>,
    pub customers: Arc<dyn CustomerRepository>,
    pub restaurants: Arc<dyn RestaurantRepository>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            refresh: Arc::new(PgRefreshStore::new(pool.clone())),
            customers: Arc::new(PgCustomerRepository::new(pool.clone())),
            restaurants: Arc::new(PgRestaurantRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            refresh: Arc::new(MemoryRefreshStore::new()),
            customers: Arc::new(MemoryCustomerRepository::new()),
            restaurants: Arc::new(MemoryRestaurantRepository::new()),
        }
    }
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<AccessTokenService>,
    pub auth: Arc<AuthService>,
    pub customers: Arc<CustomerService>,
    pub restaurants: Arc<RestaurantService>,
}

impl AppState {
    pub fn new(config: &Config, stores: Stores, clock: Arc<dyn Clock>) -> Self {
        let secrets = StaticSecret::new(config.jwt_secret.clone())
            .with_previous(config.jwt_previous_secrets.iter().cloned());
        let hasher = PasswordHasher::new(config.bcrypt_cost);

        let tokens = Arc::new(AccessTokenService::new(Arc::new(secrets), clock.clone()));
        let refresh = RefreshTokenService::new(
            stores.refresh,
            clock.clone(),
            Duration::days(config.refresh_token_expiry_days),
        );
        let customers = Arc::new(CustomerService::new(stores.customers, hasher, clock.clone()));
        let restaurants = Arc::new(RestaurantService::new(stores.restaurants, hasher, clock.clone()));
        let auth = Arc::new(AuthService::new(
            tokens.clone(),
            refresh,
            customers.clone(),
            restaurants.clone(),
            clock,
            AuthSettings {
                access_token_ttl: config.access_token_expiry_seconds,
                rotation_grace: Duration::seconds(config.refresh_grace_seconds),
            },
        ));

        Self { tokens, auth, customers, restaurants }
    }
}
