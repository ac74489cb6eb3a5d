use std::env;

use crate::services::auth::{DEFAULT_ACCESS_TOKEN_EXPIRATION_SECONDS, DEFAULT_ROTATION_GRACE_SECONDS};
use crate::services::refresh::DEFAULT_TOKEN_EXPIRATION_DAYS;

const MAX_ACCESS_TOKEN_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;
const MAX_REFRESH_TOKEN_EXPIRY_DAYS: i64 = 365;
const MAX_REFRESH_GRACE_SECONDS: i64 = 300;

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub max_connections: u32,
}

#[derive(Clone)]
pub struct Config {
    /// `None` runs the service on the in-memory stores.
    pub database: Option<DatabaseConfig>,
    pub jwt_secret: String,
    /// Retired signing secrets still accepted when verifying.
    pub jwt_previous_secrets: Vec<String>,
    pub access_token_expiry_seconds: i64,
    pub refresh_token_expiry_days: i64,
    pub refresh_grace_seconds: i64,
    pub bcrypt_cost: u32,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database = match optional("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                user: optional("DATABASE_USER"),
                password: optional("DATABASE_PWD"),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "20".into())
                    .parse()?,
            }),
            None => None,
        };

        let config = Self {
            database,
            jwt_secret: required("JWT_SECRET")?,
            jwt_previous_secrets: optional("JWT_PREVIOUS_SECRETS")
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            access_token_expiry_seconds: env::var("ACCESS_TOKEN_EXPIRY_SECONDS")
                .unwrap_or_else(|_| DEFAULT_ACCESS_TOKEN_EXPIRATION_SECONDS.to_string())
                .parse()?,
            refresh_token_expiry_days: env::var("REFRESH_TOKEN_EXPIRY_DAYS")
                .unwrap_or_else(|_| DEFAULT_TOKEN_EXPIRATION_DAYS.to_string())
                .parse()?,
            refresh_grace_seconds: env::var("REFRESH_GRACE_SECONDS")
                .unwrap_or_else(|_| DEFAULT_ROTATION_GRACE_SECONDS.to_string())
                .parse()?,
            bcrypt_cost: env::var("BCRYPT_COST")
                .unwrap_or_else(|_| "12".into())
                .parse()?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
        };
        config.check()?;
        Ok(config)
    }

    /// Defaults for everything but the signing secret; no database.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            database: None,
            jwt_secret: jwt_secret.into(),
            jwt_previous_secrets: Vec::new(),
            access_token_expiry_seconds: DEFAULT_ACCESS_TOKEN_EXPIRATION_SECONDS,
            refresh_token_expiry_days: DEFAULT_TOKEN_EXPIRATION_DAYS,
            refresh_grace_seconds: DEFAULT_ROTATION_GRACE_SECONDS,
            bcrypt_cost: 12,
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }

    fn check(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.jwt_secret.is_empty(), "JWT_SECRET must not be empty");
        anyhow::ensure!(
            (1..=MAX_ACCESS_TOKEN_EXPIRY_SECONDS).contains(&self.access_token_expiry_seconds),
            "ACCESS_TOKEN_EXPIRY_SECONDS must be between 1 and {MAX_ACCESS_TOKEN_EXPIRY_SECONDS}"
        );
        anyhow::ensure!(
            (1..=MAX_REFRESH_TOKEN_EXPIRY_DAYS).contains(&self.refresh_token_expiry_days),
            "REFRESH_TOKEN_EXPIRY_DAYS must be between 1 and {MAX_REFRESH_TOKEN_EXPIRY_DAYS}"
        );
        anyhow::ensure!(
            (0..=MAX_REFRESH_GRACE_SECONDS).contains(&self.refresh_grace_seconds),
            "REFRESH_GRACE_SECONDS must be between 0 and {MAX_REFRESH_GRACE_SECONDS}"
        );
        anyhow::ensure!(
            (4..=31).contains(&self.bcrypt_cost),
            "BCRYPT_COST must be between 4 and 31"
        );
        Ok(())
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}
